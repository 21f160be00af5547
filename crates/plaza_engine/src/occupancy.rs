//! Zone occupancy and crowd metrics, recomputed from scratch per update.

use crate::classifier::zone_from_x;
use plaza_core::{PersonObservation, ZoneTally};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PopulationMetrics {
    pub people_count: usize,
    pub avg_speed: f64,
    pub max_speed: f64,
}

/// Occupancy derived from one full observation set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Occupancy {
    pub zone_counts: ZoneTally,
    pub metrics: PopulationMetrics,
}

impl Occupancy {
    /// Tally zones and speeds. An empty set yields all zeros.
    ///
    /// Speeds are magnitudes: negative and NaN readings count as 0.
    pub fn measure(people: &[PersonObservation]) -> Self {
        let mut zone_counts = ZoneTally::new();
        let mut total = 0.0;
        let mut max_speed: f64 = 0.0;

        for person in people {
            zone_counts.increment(zone_from_x(person.x));
            let speed = person.speed.max(0.0);
            total += speed;
            max_speed = max_speed.max(speed);
        }

        let avg_speed = if people.is_empty() {
            0.0
        } else {
            total / people.len() as f64
        };

        Self {
            zone_counts,
            metrics: PopulationMetrics {
                people_count: people.len(),
                avg_speed,
                max_speed,
            },
        }
    }
}
