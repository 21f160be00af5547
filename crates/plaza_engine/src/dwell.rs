//! Dwell-to-vote detection
//!
//! Every tracked person accumulates residency in the zone they stand in.
//! Staying put for the dwell threshold casts one vote for that zone; moving
//! to another zone throws the progress away.

use crate::classifier::zone_from_x;
use plaza_core::{PersonObservation, Zone};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Residency of one person id.
#[derive(Debug, Clone, PartialEq)]
pub struct DwellRecord {
    pub zone: Zone,
    pub enter_time: Instant,
    pub voted: bool,
}

/// Per-person annotation attached to the published people list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DwellStatus {
    pub zone: Zone,
    /// Seconds spent in `zone` during the current residency.
    pub dwell: f64,
    pub dwell_progress: f64,
    /// Progress is full but the vote has not been cast yet.
    pub ready: bool,
}

impl DwellStatus {
    /// Status of someone who just (re)started a residency.
    pub fn fresh(zone: Zone) -> Self {
        Self {
            zone,
            dwell: 0.0,
            dwell_progress: 0.0,
            ready: false,
        }
    }
}

/// Result of feeding one observation set through the tracker.
#[derive(Debug, Clone, Default)]
pub struct DwellUpdate {
    /// One status per observation, same order as the input.
    pub statuses: Vec<DwellStatus>,
    /// Zones that received a vote during this update.
    pub votes: Vec<Zone>,
}

pub struct DwellTracker {
    threshold: Duration,
    records: HashMap<i64, DwellRecord>,
}

impl DwellTracker {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            records: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Advance every observed person to `now` and collect any votes.
    ///
    /// Ids missing from `people` are dropped; if they show up again they
    /// start a fresh residency.
    pub fn update(&mut self, people: &[PersonObservation], now: Instant) -> DwellUpdate {
        let mut update = DwellUpdate {
            statuses: Vec::with_capacity(people.len()),
            votes: Vec::new(),
        };

        for person in people {
            let zone = zone_from_x(person.x);
            let record = self.records.entry(person.id).or_insert(DwellRecord {
                zone,
                enter_time: now,
                voted: false,
            });

            if record.zone != zone {
                record.zone = zone;
                record.enter_time = now;
                record.voted = false;
            }

            let dwell = now.saturating_duration_since(record.enter_time);
            let progress = (dwell.as_secs_f64() / self.threshold.as_secs_f64()).clamp(0.0, 1.0);
            // Reported before the vote fires so the display sees the ready frame
            update.statuses.push(DwellStatus {
                zone,
                dwell: dwell.as_secs_f64(),
                dwell_progress: progress,
                ready: progress >= 1.0 && !record.voted,
            });

            if dwell >= self.threshold && !record.voted {
                record.voted = true;
                update.votes.push(zone);
                tracing::debug!(
                    "Person {} voted {} after {:.2}s",
                    person.id,
                    zone,
                    dwell.as_secs_f64()
                );
            }
        }

        let present: HashSet<i64> = people.iter().map(|p| p.id).collect();
        self.records.retain(|id, _| present.contains(id));

        update
    }

    /// Start every tracked residency over at a round boundary.
    pub fn reset_round(&mut self, now: Instant) {
        for record in self.records.values_mut() {
            record.voted = false;
            record.enter_time = now;
        }
    }

    pub fn record(&self, id: i64) -> Option<&DwellRecord> {
        self.records.get(&id)
    }

    pub fn tracked(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DWELL: Duration = Duration::from_secs(3);

    fn at(id: i64, x: f64) -> Vec<PersonObservation> {
        vec![PersonObservation::at(id, x, 0.5)]
    }

    #[test]
    fn test_first_sighting_creates_record() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        let update = tracker.update(&at(1, 0.1), t0);

        assert!(update.votes.is_empty());
        assert_eq!(update.statuses[0], DwellStatus::fresh(Zone::Housing));
        let record = tracker.record(1).unwrap();
        assert_eq!(record.enter_time, t0);
        assert!(!record.voted);
    }

    #[test]
    fn test_exact_threshold_votes_once() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        tracker.update(&at(1, 0.5), t0);

        let update = tracker.update(&at(1, 0.5), t0 + DWELL);
        assert_eq!(update.votes, vec![Zone::Green]);
        assert!(update.statuses[0].ready);
        assert_eq!(update.statuses[0].dwell_progress, 1.0);

        let update = tracker.update(&at(1, 0.5), t0 + DWELL * 2);
        assert!(update.votes.is_empty());
        // Vote already cast, so not ready any more
        assert!(!update.statuses[0].ready);
        assert_eq!(update.statuses[0].dwell_progress, 1.0);
    }

    #[test]
    fn test_progress_is_partial_before_threshold() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        tracker.update(&at(1, 0.9), t0);
        let update = tracker.update(&at(1, 0.9), t0 + Duration::from_millis(1500));
        assert!((update.statuses[0].dwell_progress - 0.5).abs() < 1e-9);
        assert!((update.statuses[0].dwell - 1.5).abs() < 1e-9);
        assert!(!update.statuses[0].ready);
    }

    #[test]
    fn test_zone_switch_resets_progress() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        let half = DWELL / 2;

        tracker.update(&at(1, 0.1), t0);
        // Moves to mobility half-way through
        let update = tracker.update(&at(1, 0.8), t0 + half);
        assert!(update.votes.is_empty());
        assert_eq!(update.statuses[0].dwell, 0.0);

        // Old zone would have completed here; nothing fires
        let update = tracker.update(&at(1, 0.8), t0 + DWELL);
        assert!(update.votes.is_empty());

        let update = tracker.update(&at(1, 0.8), t0 + half + DWELL);
        assert_eq!(update.votes, vec![Zone::Mobility]);
    }

    #[test]
    fn test_absent_ids_are_dropped_and_restart() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        tracker.update(&at(7, 0.1), t0);
        tracker.update(&[], t0 + Duration::from_secs(1));
        assert_eq!(tracker.tracked(), 0);

        // Back after the threshold would have passed: fresh residency
        let update = tracker.update(&at(7, 0.1), t0 + DWELL);
        assert!(update.votes.is_empty());
        assert_eq!(tracker.record(7).unwrap().enter_time, t0 + DWELL);
    }

    #[test]
    fn test_round_reset_restarts_residency() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        tracker.update(&at(1, 0.1), t0);
        tracker.update(&at(1, 0.1), t0 + DWELL);
        // New round: voted flag cleared, timer restarted
        let t1 = t0 + DWELL + Duration::from_secs(1);
        tracker.reset_round(t1);
        let record = tracker.record(1).unwrap();
        assert!(!record.voted);
        assert_eq!(record.enter_time, t1);

        let update = tracker.update(&at(1, 0.1), t1 + DWELL);
        assert_eq!(update.votes, vec![Zone::Housing]);
    }

    #[test]
    fn test_multiple_people_vote_independently() {
        let mut tracker = DwellTracker::new(DWELL);
        let t0 = Instant::now();
        let crowd = vec![
            PersonObservation::at(1, 0.1, 0.1),
            PersonObservation::at(2, 0.5, 0.1),
            PersonObservation::at(3, 0.55, 0.9),
        ];
        tracker.update(&crowd, t0);
        let update = tracker.update(&crowd, t0 + DWELL);
        assert_eq!(update.votes, vec![Zone::Housing, Zone::Green, Zone::Green]);
        assert_eq!(update.statuses.len(), 3);
    }
}
