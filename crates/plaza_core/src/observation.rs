use serde::{Deserialize, Serialize};

/// One person as reported by a sensing front end for a single update.
///
/// Coordinates are normalized to the floor, `[0, 1]` on both axes.
/// Velocity is in normalized units per second. Senders that only know
/// positions may omit the motion fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonObservation {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub speed: f64,
}

impl PersonObservation {
    /// A stationary person at `(x, y)`.
    pub fn at(id: i64, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            speed: 0.0,
        }
    }
}
