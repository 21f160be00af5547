//! State publisher
//!
//! Splits the game state into independent sub-documents and pushes the
//! enabled ones onto a broadcast channel. Display clients subscribe through
//! the gateway; a slow or missing subscriber never holds up the engine.

use crate::deck::OptionTexts;
use crate::heatmap::Heatmap;
use crate::occupancy::PopulationMetrics;
use crate::state::{GameState, TrackedPerson};
use plaza_core::config::PublishConfig;
use plaza_core::{CityState, Path, ZoneTally};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::sync::broadcast;

/// Output channel of a sub-document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "/game/core")]
    Core,
    #[serde(rename = "/game/story")]
    Story,
    #[serde(rename = "/game/city")]
    City,
    #[serde(rename = "/game/people")]
    People,
    #[serde(rename = "/game/heatmap")]
    Heatmap,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Core,
        Channel::Story,
        Channel::City,
        Channel::People,
        Channel::Heatmap,
    ];

    pub fn enabled(self, toggles: &PublishConfig) -> bool {
        match self {
            Channel::Core => toggles.core,
            Channel::Story => toggles.story,
            Channel::City => toggles.city,
            Channel::People => toggles.people,
            Channel::Heatmap => toggles.heatmap,
        }
    }
}

/// One published sub-document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub address: Channel,
    pub payload: serde_json::Value,
}

#[derive(Serialize)]
struct CoreDoc<'a> {
    round: u32,
    time_left: f64,
    prompt: &'a str,
    last_result: &'a str,
    dwell_seconds: f64,
    scores: &'a ZoneTally,
    zone_counts: &'a ZoneTally,
    /// Unix timestamp (seconds) of the snapshot.
    t: f64,
}

#[derive(Serialize)]
struct StoryDoc<'a> {
    path: Path,
    title: &'a str,
    situation: &'a str,
    options: OptionTexts<'a>,
    transition: bool,
}

#[derive(Serialize)]
struct PeopleDoc<'a> {
    people: &'a [TrackedPerson],
    #[serde(flatten)]
    metrics: &'a PopulationMetrics,
}

/// Render one sub-document of `state` as of `now`.
pub fn render(
    channel: Channel,
    state: &GameState,
    now: Instant,
) -> serde_json::Result<serde_json::Value> {
    match channel {
        Channel::Core => serde_json::to_value(CoreDoc {
            round: state.round(),
            time_left: state.time_left_secs(now),
            prompt: state.prompt(),
            last_result: state.last_result(),
            dwell_seconds: state.dwell_secs(),
            scores: state.scores(),
            zone_counts: state.zone_counts(),
            t: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        }),
        Channel::Story => {
            let narrative = state.narrative();
            let card = narrative.current_card();
            serde_json::to_value(StoryDoc {
                path: narrative.path(),
                title: &card.title,
                situation: &card.situation,
                options: card.option_texts(),
                transition: narrative.in_transition(),
            })
        }
        Channel::City => serde_json::to_value::<&CityState>(state.narrative().city()),
        Channel::People => serde_json::to_value(PeopleDoc {
            people: state.people(),
            metrics: state.metrics(),
        }),
        Channel::Heatmap => serde_json::to_value::<&Heatmap>(state.heatmap()),
    }
}

pub struct Publisher {
    tx: broadcast::Sender<Publication>,
    toggles: PublishConfig,
}

impl Publisher {
    pub fn new(toggles: PublishConfig, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx, toggles }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Publication> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<Publication> {
        self.tx.clone()
    }

    /// All enabled sub-documents, in channel order.
    pub fn snapshot(&self, state: &GameState, now: Instant) -> Vec<Publication> {
        Channel::ALL
            .into_iter()
            .filter(|c| c.enabled(&self.toggles))
            .filter_map(|address| match render(address, state, now) {
                Ok(payload) => Some(Publication { address, payload }),
                Err(e) => {
                    tracing::error!("Failed to render {:?}: {}", address, e);
                    None
                }
            })
            .collect()
    }

    /// Broadcast every enabled sub-document. Returns how many went out.
    pub fn publish(&self, state: &GameState, now: Instant) -> usize {
        let publications = self.snapshot(state, now);
        let count = publications.len();
        for publication in publications {
            // No subscribers is normal (no display connected yet)
            let _ = self.tx.send(publication);
        }
        tracing::trace!("Published {} documents", count);
        count
    }
}
