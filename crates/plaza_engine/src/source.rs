use crate::coordinator::Command;
use anyhow::Result;
use async_trait::async_trait;
use plaza_core::config::SimulatorConfig;
use plaza_core::PersonObservation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Anything that can produce full observation sets of the floor.
#[async_trait]
pub trait PersonSource: Send {
    /// Identifier used in logs (e.g. "simulator").
    fn name(&self) -> &str;

    /// Observe the floor once. Each call returns the complete current set.
    async fn poll(&mut self) -> Result<Vec<PersonObservation>>;
}

/// Synthetic crowd for running the installation without a camera.
///
/// People random-walk over the unit square, bouncing off the edges, and
/// occasionally join or leave while staying within the configured bounds.
pub struct SimulatedCrowd {
    rng: StdRng,
    people: Vec<PersonObservation>,
    next_id: i64,
    min_people: usize,
    max_people: usize,
    speed: f64,
    tick: Duration,
}

impl SimulatedCrowd {
    pub fn new(config: &SimulatorConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut crowd = Self {
            rng,
            people: Vec::new(),
            next_id: 0,
            min_people: config.min_people,
            max_people: config.max_people.max(config.min_people),
            speed: config.speed,
            tick: config.ingest_interval(),
        };
        let start = if crowd.min_people == crowd.max_people {
            crowd.min_people
        } else {
            crowd.rng.gen_range(crowd.min_people..=crowd.max_people)
        };
        for _ in 0..start {
            crowd.spawn_person();
        }
        crowd
    }

    pub fn people(&self) -> &[PersonObservation] {
        &self.people
    }

    fn spawn_person(&mut self) {
        let id = self.next_id;
        self.next_id += 1;
        let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = self.rng.gen_range(0.2..=1.0) * self.speed;
        self.people.push(PersonObservation {
            id,
            x: self.rng.gen_range(0.0..=1.0),
            y: self.rng.gen_range(0.0..=1.0),
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            speed,
        });
    }

    /// Advance the crowd by `dt` and return the new observation set.
    pub fn step(&mut self, dt: Duration) -> Vec<PersonObservation> {
        let dt = dt.as_secs_f64();
        for person in &mut self.people {
            // Small heading jitter keeps walks from looking like billiards
            let turn = self.rng.gen_range(-0.4..=0.4);
            let (sin, cos) = f64::sin_cos(turn);
            let (vx, vy) = (person.vx * cos - person.vy * sin, person.vx * sin + person.vy * cos);
            person.vx = vx;
            person.vy = vy;

            person.x += person.vx * dt;
            person.y += person.vy * dt;
            bounce(&mut person.x, &mut person.vx);
            bounce(&mut person.y, &mut person.vy);
            person.speed = person.vx.hypot(person.vy);
        }

        // Rare arrivals and departures
        if self.people.len() < self.max_people && self.rng.gen_bool(0.02) {
            self.spawn_person();
        }
        if self.people.len() > self.min_people && self.rng.gen_bool(0.02) {
            let idx = self.rng.gen_range(0..self.people.len());
            self.people.remove(idx);
        }

        self.people.clone()
    }
}

fn bounce(pos: &mut f64, vel: &mut f64) {
    if *pos < 0.0 {
        *pos = -*pos;
        *vel = vel.abs();
    } else if *pos > 1.0 {
        *pos = 2.0 - *pos;
        *vel = -vel.abs();
    }
    *pos = pos.clamp(0.0, 1.0);
}

#[async_trait]
impl PersonSource for SimulatedCrowd {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn poll(&mut self) -> Result<Vec<PersonObservation>> {
        let dt = self.tick;
        Ok(self.step(dt))
    }
}

/// Poll `source` every `interval` and forward each observation set to the
/// coordinator. Stops when the coordinator goes away.
pub fn spawn_source_pump(
    mut source: Box<dyn PersonSource>,
    interval: Duration,
    commands: mpsc::Sender<Command>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!("Person source '{}' started", source.name());

        loop {
            ticker.tick().await;
            match source.poll().await {
                Ok(people) => {
                    if commands.send(Command::People(people)).await.is_err() {
                        tracing::debug!("Coordinator gone, stopping '{}'", source.name());
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Person source '{}' failed: {}", source.name(), e);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: usize, max: usize) -> SimulatorConfig {
        SimulatorConfig {
            enabled: true,
            min_people: min,
            max_people: max,
            speed: 0.15,
            ingest_interval_ms: 100,
        }
    }

    #[test]
    fn test_same_seed_same_crowd() {
        let mut a = SimulatedCrowd::new(&config(2, 8), Some(7));
        let mut b = SimulatedCrowd::new(&config(2, 8), Some(7));
        for _ in 0..50 {
            assert_eq!(
                a.step(Duration::from_millis(100)),
                b.step(Duration::from_millis(100))
            );
        }
    }

    #[test]
    fn test_crowd_stays_on_floor_and_within_bounds() {
        let mut crowd = SimulatedCrowd::new(&config(2, 5), Some(42));
        for _ in 0..2000 {
            let people = crowd.step(Duration::from_millis(250));
            assert!(people.len() >= 2 && people.len() <= 5);
            for p in &people {
                assert!((0.0..=1.0).contains(&p.x), "x out of range: {}", p.x);
                assert!((0.0..=1.0).contains(&p.y), "y out of range: {}", p.y);
                assert!(p.speed >= 0.0);
            }
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let mut crowd = SimulatedCrowd::new(&config(3, 10), Some(1));
        for _ in 0..500 {
            let people = crowd.step(Duration::from_millis(100));
            let mut ids: Vec<i64> = people.iter().map(|p| p.id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), people.len());
        }
    }

    #[test]
    fn test_fixed_population() {
        let crowd = SimulatedCrowd::new(&config(4, 4), Some(3));
        assert_eq!(crowd.people().len(), 4);
    }

    #[tokio::test]
    async fn test_pump_forwards_observations() {
        let (tx, mut rx) = mpsc::channel(4);
        let crowd = SimulatedCrowd::new(&config(2, 2), Some(9));
        let handle = spawn_source_pump(Box::new(crowd), Duration::from_millis(5), tx);

        match rx.recv().await {
            Some(Command::People(people)) => assert_eq!(people.len(), 2),
            other => panic!("unexpected command: {:?}", other.is_some()),
        }

        drop(rx);
        handle.await.unwrap();
    }
}
