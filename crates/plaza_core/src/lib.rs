//! # Plaza Core
//!
//! Shared vocabulary for the floor game: the closed set of floor zones, the
//! city attributes the story mutates, the narrative paths, and the person
//! observations produced by any sensing front end.
//!
//! Nothing here owns runtime state. The engine crate builds its single
//! coordinator-owned `GameState` out of these types.

pub mod city;
pub mod config;
pub mod observation;
pub mod zone;

pub use city::{CityAttribute, CityState, Path};
pub use config::{ConfigError, PlazaConfig};
pub use observation::PersonObservation;
pub use zone::{UnknownZone, Zone, ZoneTally};
