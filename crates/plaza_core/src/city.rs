//! City attributes and narrative paths.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Index;

/// Lower and upper bound of every city attribute.
pub const ATTRIBUTE_MIN: i32 = 0;
pub const ATTRIBUTE_MAX: i32 = 100;

/// Starting value for every attribute of a fresh city.
pub const ATTRIBUTE_START: i32 = 50;

/// A dimension of the persistent city vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityAttribute {
    Housing,
    Green,
    Mobility,
    Social,
    Budget,
}

impl CityAttribute {
    pub const ALL: [CityAttribute; 5] = [
        CityAttribute::Housing,
        CityAttribute::Green,
        CityAttribute::Mobility,
        CityAttribute::Social,
        CityAttribute::Budget,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CityAttribute::Housing => "housing",
            CityAttribute::Green => "green",
            CityAttribute::Mobility => "mobility",
            CityAttribute::Social => "social",
            CityAttribute::Budget => "budget",
        }
    }

    fn slot(self) -> usize {
        match self {
            CityAttribute::Housing => 0,
            CityAttribute::Green => 1,
            CityAttribute::Mobility => 2,
            CityAttribute::Social => 3,
            CityAttribute::Budget => 4,
        }
    }
}

/// The persistent city. Lives for the whole process and is only touched by
/// effect application at round resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CityState {
    values: [i32; 5],
}

impl Default for CityState {
    fn default() -> Self {
        Self {
            values: [ATTRIBUTE_START; 5],
        }
    }
}

impl CityState {
    /// Build a city with explicit values; out-of-range inputs are clamped.
    pub fn new(housing: i32, green: i32, mobility: i32, social: i32, budget: i32) -> Self {
        let mut city = Self {
            values: [housing, green, mobility, social, budget],
        };
        for v in city.values.iter_mut() {
            *v = (*v).clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX);
        }
        city
    }

    /// Add `delta` to one attribute, keeping it inside [0, 100].
    pub fn adjust(&mut self, attr: CityAttribute, delta: i32) {
        let slot = &mut self.values[attr.slot()];
        *slot = slot.saturating_add(delta).clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX);
    }

    /// Apply a whole effect map.
    pub fn apply<'a, I>(&mut self, effects: I)
    where
        I: IntoIterator<Item = &'a (CityAttribute, i32)>,
    {
        for &(attr, delta) in effects {
            self.adjust(attr, delta);
        }
    }

    pub fn get(&self, attr: CityAttribute) -> i32 {
        self.values[attr.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (CityAttribute, i32)> + '_ {
        CityAttribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

impl Index<CityAttribute> for CityState {
    type Output = i32;

    fn index(&self, attr: CityAttribute) -> &i32 {
        &self.values[attr.slot()]
    }
}

impl Serialize for CityState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CityAttribute::ALL.len()))?;
        for (attr, value) in self.iter() {
            map.serialize_entry(attr.as_str(), &value)?;
        }
        map.end()
    }
}

/// Macro story branch. Changes only at round boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Path {
    #[default]
    Normal,
    Eco,
    Crisis,
    Gridlock,
}

impl Path {
    pub const ALL: [Path; 4] = [Path::Normal, Path::Eco, Path::Crisis, Path::Gridlock];

    pub fn as_str(self) -> &'static str {
        match self {
            Path::Normal => "NORMAL",
            Path::Eco => "ECO",
            Path::Crisis => "CRISIS",
            Path::Gridlock => "GRIDLOCK",
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
