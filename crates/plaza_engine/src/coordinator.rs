//! Game coordinator
//!
//! The coordinator is the only owner of [`GameState`]. It:
//! - Runs the round scheduler on a fixed tick
//! - Applies commands from the gateway and person sources, one at a time
//! - Publishes the state after every tick and every state-changing command

use crate::publish::{Publication, Publisher};
use crate::state::{ClickPoint, GameState, PayloadError};
use plaza_core::{ConfigError, PersonObservation, PlazaConfig, UnknownZone, Zone};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 64;
const PUBLISH_BUFFER: usize = 256;

/// Work for the coordinator.
#[derive(Debug)]
pub enum Command {
    /// Manual vote by zone name.
    ZoneClick {
        zone: String,
        click: Option<ClickPoint>,
        reply: Option<oneshot::Sender<Result<Zone, UnknownZone>>>,
    },
    /// Already decoded observation set (person sources).
    People(Vec<PersonObservation>),
    /// Raw JSON observation set (camera/tracker boundary).
    PeopleJson {
        payload: String,
        reply: Option<oneshot::Sender<Result<usize, PayloadError>>>,
    },
    /// Every enabled sub-document, without broadcasting.
    Snapshot(oneshot::Sender<Vec<Publication>>),
}

/// Current time on the tokio clock, so paused-time tests drive rounds.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

pub struct GameCoordinator {
    state: GameState,
    publisher: Publisher,
    rng: StdRng,
    tick_interval: Duration,
    command_rx: mpsc::Receiver<Command>,
}

impl GameCoordinator {
    /// Build the coordinator and the handle used to talk to it.
    pub fn new(config: &PlazaConfig) -> Result<(Self, GameHandle), ConfigError> {
        let state = GameState::new(config, now())?;
        let publisher = Publisher::new(config.publish.clone(), PUBLISH_BUFFER);
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);

        let handle = GameHandle {
            commands: command_tx,
            publications: publisher.sender(),
        };
        let coordinator = Self {
            state,
            publisher,
            rng,
            tick_interval: config.round.tick_interval(),
            command_rx,
        };
        Ok((coordinator, handle))
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Main loop. Returns once every [`GameHandle`] has been dropped.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            "Coordinator started (round {}, tick {:?})",
            self.state.round(),
            self.tick_interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = now();
                    if let Some(resolution) = self.state.tick(now, &mut self.rng) {
                        tracing::debug!(
                            "Resolved '{}' with {}",
                            resolution.card_title,
                            resolution.winner
                        );
                    }
                    self.publisher.publish(&self.state, now);
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => self.handle(command),
                        None => {
                            tracing::info!("All game handles dropped, coordinator stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn handle(&mut self, command: Command) {
        let now = now();
        match command {
            Command::ZoneClick { zone, click, reply } => {
                let result = self.state.zone_click(&zone, click);
                if let Err(e) = &result {
                    tracing::debug!("{}", e);
                }
                self.publisher.publish(&self.state, now);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::People(people) => {
                self.state.ingest_people(people, now);
                self.publisher.publish(&self.state, now);
            }
            Command::PeopleJson { payload, reply } => {
                let result = self.state.ingest_people_json(&payload, now);
                if let Err(e) = &result {
                    tracing::warn!("Bad people payload: {}", e);
                }
                self.publisher.publish(&self.state, now);
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.publisher.snapshot(&self.state, now));
            }
        }
    }
}

/// Cheap, cloneable access to a running coordinator.
#[derive(Clone)]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    publications: broadcast::Sender<Publication>,
}

impl GameHandle {
    /// Raw command sender, for producers such as person-source pumps.
    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Publication> {
        self.publications.subscribe()
    }

    pub async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send command: {}", e))
    }

    pub async fn zone_click(
        &self,
        zone: impl Into<String>,
        click: Option<ClickPoint>,
    ) -> anyhow::Result<Result<Zone, UnknownZone>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ZoneClick {
            zone: zone.into(),
            click,
            reply: Some(tx),
        })
        .await?;
        Ok(rx.await?)
    }

    pub async fn ingest_people(&self, people: Vec<PersonObservation>) -> anyhow::Result<()> {
        self.send(Command::People(people)).await
    }

    pub async fn ingest_people_json(
        &self,
        payload: impl Into<String>,
    ) -> anyhow::Result<Result<usize, PayloadError>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PeopleJson {
            payload: payload.into(),
            reply: Some(tx),
        })
        .await?;
        Ok(rx.await?)
    }

    pub async fn snapshot(&self) -> anyhow::Result<Vec<Publication>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        Ok(rx.await?)
    }
}
