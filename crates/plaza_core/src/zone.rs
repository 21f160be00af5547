//! Floor zones and per-zone tallies.
//!
//! The floor is split left→right into three equal strips. Each strip stands
//! for one of the city's choices and collects votes while people dwell in it.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the three floor strips, in floor order (left to right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Housing,
    Green,
    Mobility,
}

impl Zone {
    /// All zones in floor order.
    pub const ALL: [Zone; 3] = [Zone::Housing, Zone::Green, Zone::Mobility];

    /// Wire name used in published documents and inbound votes.
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Housing => "HOUSING",
            Zone::Green => "GREEN",
            Zone::Mobility => "MOBILITY",
        }
    }

    fn slot(self) -> usize {
        match self {
            Zone::Housing => 0,
            Zone::Green => 1,
            Zone::Mobility => 2,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = UnknownZone;

    /// Exact wire names only; the display client sends them verbatim.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .into_iter()
            .find(|z| z.as_str() == s)
            .ok_or_else(|| UnknownZone(s.to_string()))
    }
}

/// A zone name that is not part of the floor layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown zone: {0}")]
pub struct UnknownZone(pub String);

/// Integer count per zone (scores, occupancy).
///
/// Backed by a fixed array so every zone always has an entry; serializes as
/// a `{"HOUSING": n, ...}` map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneTally {
    counts: [u32; 3],
}

impl ZoneTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit values, in floor order.
    pub fn from_counts(housing: u32, green: u32, mobility: u32) -> Self {
        Self {
            counts: [housing, green, mobility],
        }
    }

    pub fn increment(&mut self, zone: Zone) {
        self.counts[zone.slot()] = self.counts[zone.slot()].saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.counts = [0; 3];
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// `(zone, count)` pairs in floor order.
    pub fn iter(&self) -> impl Iterator<Item = (Zone, u32)> + '_ {
        Zone::ALL.into_iter().map(move |z| (z, self[z]))
    }
}

impl Index<Zone> for ZoneTally {
    type Output = u32;

    fn index(&self, zone: Zone) -> &u32 {
        &self.counts[zone.slot()]
    }
}

impl IndexMut<Zone> for ZoneTally {
    fn index_mut(&mut self, zone: Zone) -> &mut u32 {
        &mut self.counts[zone.slot()]
    }
}

impl Serialize for ZoneTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Zone::ALL.len()))?;
        for (zone, count) in self.iter() {
            map.serialize_entry(zone.as_str(), &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_parse_wire_names() {
        assert_eq!("HOUSING".parse::<Zone>().unwrap(), Zone::Housing);
        assert_eq!("GREEN".parse::<Zone>().unwrap(), Zone::Green);
        assert_eq!("MOBILITY".parse::<Zone>().unwrap(), Zone::Mobility);
    }

    #[test]
    fn test_zone_parse_unknown() {
        let err = "PARKING".parse::<Zone>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown zone: PARKING");
        // Case matters on the wire
        assert!("green".parse::<Zone>().is_err());
    }

    #[test]
    fn test_tally_increment_and_reset() {
        let mut tally = ZoneTally::new();
        tally.increment(Zone::Green);
        tally.increment(Zone::Green);
        tally.increment(Zone::Mobility);
        assert_eq!(tally[Zone::Green], 2);
        assert_eq!(tally[Zone::Housing], 0);
        assert_eq!(tally.total(), 3);

        tally.reset();
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn test_tally_serializes_as_map() {
        let tally = ZoneTally::from_counts(3, 0, 1);
        let json = serde_json::to_value(tally).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"HOUSING": 3, "GREEN": 0, "MOBILITY": 1})
        );
    }
}
