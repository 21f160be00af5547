//! # Plaza Engine
//!
//! Everything that happens between "people stand on the floor" and "the
//! display shows the next story card".
//!
//! ## Architecture
//!
//! A single coordinator task owns the [`GameState`] and, on every tick or
//! command:
//! 1. Classifies observed people into floor zones and tracks their dwell
//! 2. Turns completed dwells and manual clicks into votes
//! 3. Resolves the round when its time is up, moving the city along its path
//! 4. Publishes the resulting sub-documents to display clients
//!
//! ## Paths
//!
//! The city follows one of four story paths (NORMAL, ECO, CRISIS, GRIDLOCK).
//! Entering and leaving a special path uses separate thresholds so the story
//! does not flicker around a boundary.

pub mod classifier;
pub mod coordinator;
pub mod deck;
pub mod dwell;
pub mod heatmap;
pub mod narrative;
pub mod occupancy;
pub mod publish;
pub mod round;
pub mod source;
pub mod state;

pub use classifier::zone_from_x;
pub use coordinator::{Command, GameCoordinator, GameHandle};
pub use deck::{Card, CardOption, DeckSet};
pub use dwell::{DwellStatus, DwellTracker, DwellUpdate};
pub use heatmap::Heatmap;
pub use narrative::{next_path, pick_winner, Narrative, Resolution};
pub use occupancy::{Occupancy, PopulationMetrics};
pub use publish::{Channel, Publication, Publisher};
pub use round::RoundClock;
pub use source::{spawn_source_pump, PersonSource, SimulatedCrowd};
pub use state::{parse_people, ClickPoint, GameState, PayloadError, TrackedPerson};
