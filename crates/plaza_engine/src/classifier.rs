//! Horizontal position → floor zone.

use plaza_core::Zone;

const FIRST_EDGE: f64 = 1.0 / 3.0;
const SECOND_EDGE: f64 = 2.0 / 3.0;

/// Map a normalized x position to its floor zone.
///
/// `[0, 1/3)` is housing, `[1/3, 2/3)` green, `[2/3, 1]` mobility. Values
/// outside the floor are clamped first; NaN counts as the left edge.
pub fn zone_from_x(x: f64) -> Zone {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    if x < FIRST_EDGE {
        Zone::Housing
    } else if x < SECOND_EDGE {
        Zone::Green
    } else {
        Zone::Mobility
    }
}
