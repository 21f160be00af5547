//! The single owned game state.
//!
//! Every mutation in the engine is a method here. The coordinator task owns
//! the only instance and runs one method plus one publish at a time.

use crate::dwell::{DwellStatus, DwellTracker};
use crate::heatmap::Heatmap;
use crate::narrative::{pick_winner, Narrative, Resolution};
use crate::occupancy::{Occupancy, PopulationMetrics};
use crate::round::RoundClock;
use plaza_core::{ConfigError, PersonObservation, PlazaConfig, UnknownZone, Zone, ZoneTally};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A people payload that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("not valid JSON ({0})")]
    Json(#[source] serde_json::Error),
    #[error("expected a list of people, got {0}")]
    NotAList(&'static str),
    #[error("bad person entry ({0})")]
    Entry(#[source] serde_json::Error),
}

/// Pixel position of a click on the display client, with its window size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClickPoint {
    /// Normalized floor position, or `None` for a degenerate window.
    pub fn normalized(&self) -> Option<(f64, f64)> {
        if self.width > 0.0 && self.height > 0.0 {
            Some((self.x / self.width, self.y / self.height))
        } else {
            None
        }
    }
}

/// An observation enriched with its dwell status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPerson {
    #[serde(flatten)]
    pub observation: PersonObservation,
    #[serde(flatten)]
    pub status: DwellStatus,
}

pub struct GameState {
    round: u32,
    prompt: String,
    last_result: String,
    clock: RoundClock,
    scores: ZoneTally,
    zone_counts: ZoneTally,
    people: Vec<TrackedPerson>,
    metrics: PopulationMetrics,
    dwell: DwellTracker,
    heatmap: Heatmap,
    heatmap_from_click: bool,
    narrative: Narrative,
}

impl GameState {
    /// Fresh game at round 1. Rejects configs that fail validation.
    pub fn new(config: &PlazaConfig, now: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        let narrative = Narrative::new(config.narrative.clone());
        let prompt = narrative.current_card().title.clone();
        Ok(Self {
            round: 1,
            prompt,
            last_result: String::new(),
            clock: RoundClock::new(config.round.duration(), now),
            scores: ZoneTally::new(),
            zone_counts: ZoneTally::new(),
            people: Vec::new(),
            metrics: PopulationMetrics::default(),
            dwell: DwellTracker::new(config.round.dwell()),
            heatmap: Heatmap::new(&config.heatmap),
            heatmap_from_click: config.heatmap.from_click,
            narrative,
        })
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Replace the observation set and recompute everything derived from it.
    pub fn ingest_people(&mut self, people: Vec<PersonObservation>, now: Instant) {
        let update = self.dwell.update(&people, now);
        for zone in update.votes {
            self.register_vote(zone);
        }

        let occupancy = Occupancy::measure(&people);
        self.zone_counts = occupancy.zone_counts;
        self.metrics = occupancy.metrics;
        self.heatmap.step(&people);

        self.people = people
            .into_iter()
            .zip(update.statuses)
            .map(|(observation, status)| TrackedPerson {
                observation,
                status,
            })
            .collect();
    }

    /// Parse a raw JSON people list and ingest it.
    ///
    /// On failure the previous observations stay in place and the prompt
    /// carries the diagnostic.
    pub fn ingest_people_json(
        &mut self,
        payload: &str,
        now: Instant,
    ) -> Result<usize, PayloadError> {
        match parse_people(payload) {
            Ok(people) => {
                let count = people.len();
                self.ingest_people(people, now);
                Ok(count)
            }
            Err(e) => {
                self.prompt = format!("Bad people payload: {}", e);
                Err(e)
            }
        }
    }

    /// A manual vote from the display client.
    pub fn zone_click(
        &mut self,
        name: &str,
        click: Option<ClickPoint>,
    ) -> Result<Zone, UnknownZone> {
        match name.parse::<Zone>() {
            Ok(zone) => {
                self.register_vote(zone);
                if self.heatmap_from_click {
                    if let Some((x, y)) = click.and_then(|c| c.normalized()) {
                        self.heatmap.deposit(x, y);
                    }
                }
                Ok(zone)
            }
            Err(e) => {
                self.prompt = e.to_string();
                Err(e)
            }
        }
    }

    /// Scheduler tick. Resolves the round if its time is up.
    pub fn tick<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> Option<Resolution> {
        if self.clock.is_expired(now) {
            Some(self.resolve_round(now, rng))
        } else {
            None
        }
    }

    /// Decide the winner, advance the story and start the next round.
    pub fn resolve_round<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> Resolution {
        let winner = pick_winner(&self.scores, &self.zone_counts, rng);
        let resolution = self.narrative.resolve(winner);

        let mut result = format!(
            "Round {}: {} won — {}",
            self.round, resolution.winner, resolution.choice
        );
        if resolution.path_changed() {
            result.push_str(&format!(" Path: {} → {}", resolution.from, resolution.to));
        }
        tracing::info!("{}", result);
        self.last_result = result;

        self.scores.reset();
        self.zone_counts.reset();
        self.round += 1;
        self.clock.restart(now);
        self.dwell.reset_round(now);
        for person in self.people.iter_mut() {
            person.status = DwellStatus::fresh(person.status.zone);
        }
        self.prompt = self.narrative.current_card().title.clone();

        resolution
    }

    fn register_vote(&mut self, zone: Zone) {
        self.scores.increment(zone);
        self.prompt = format!("Vote registered: {}", zone);
        tracing::debug!("Vote registered: {} (now {})", zone, self.scores[zone]);
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn last_result(&self) -> &str {
        &self.last_result
    }

    pub fn time_left_secs(&self, now: Instant) -> f64 {
        self.clock.time_left(now).as_secs_f64()
    }

    pub fn dwell_secs(&self) -> f64 {
        self.dwell.threshold().as_secs_f64()
    }

    pub fn scores(&self) -> &ZoneTally {
        &self.scores
    }

    pub fn zone_counts(&self) -> &ZoneTally {
        &self.zone_counts
    }

    pub fn people(&self) -> &[TrackedPerson] {
        &self.people
    }

    pub fn metrics(&self) -> &PopulationMetrics {
        &self.metrics
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }
}

/// Decode a people list, distinguishing the ways it can be wrong.
pub fn parse_people(payload: &str) -> Result<Vec<PersonObservation>, PayloadError> {
    let value: serde_json::Value = serde_json::from_str(payload).map_err(PayloadError::Json)?;
    let kind = match &value {
        serde_json::Value::Array(_) => None,
        serde_json::Value::Null => Some("null"),
        serde_json::Value::Bool(_) => Some("a boolean"),
        serde_json::Value::Number(_) => Some("a number"),
        serde_json::Value::String(_) => Some("a string"),
        serde_json::Value::Object(_) => Some("an object"),
    };
    if let Some(kind) = kind {
        return Err(PayloadError::NotAList(kind));
    }
    serde_json::from_value(value).map_err(PayloadError::Entry)
}
