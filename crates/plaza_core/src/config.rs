use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Upper bound on `heatmap.width * heatmap.height`.
pub const MAX_HEATMAP_CELLS: usize = 1 << 22;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlazaConfig {
    /// Seed for tie-break and simulator randomness. `None` draws from entropy.
    pub rng_seed: Option<u64>,
    pub round: RoundConfig,
    pub heatmap: HeatmapConfig,
    pub narrative: NarrativeThresholds,
    pub simulator: SimulatorConfig,
    pub publish: PublishConfig,
    pub gateway: GatewayConfig,
}

/// Startup configuration problems. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} is too large to represent as a duration (got {value})")]
    DurationOverflow { field: &'static str, value: f64 },
    #[error("heatmap grid must be at least 1x1 (got {width}x{height})")]
    DegenerateGrid { width: usize, height: usize },
    #[error("heatmap grid of {width}x{height} exceeds {max} cells")]
    GridTooLarge {
        width: usize,
        height: usize,
        max: usize,
    },
    #[error("heatmap decay must lie strictly between 0 and 1 (got {0})")]
    Decay(f64),
    #[error("{path} thresholds do not form a hysteresis band: enter={enter}, exit={exit}")]
    Hysteresis {
        path: &'static str,
        enter: i32,
        exit: i32,
    },
    #[error("simulator population bounds inverted: min={min}, max={max}")]
    Population { min: usize, max: usize },
}

impl PlazaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied and the result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: PlazaConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from path; a missing file yields defaults with env overrides.
    ///
    /// A file that exists but does not parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        tracing::info!(
            "Config file {} not found, using defaults",
            path.as_ref().display()
        );
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PLAZA_HOST") {
            self.gateway.host = v;
        }
        if let Ok(v) = std::env::var("PLAZA_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
        if let Ok(v) = std::env::var("PLAZA_ROUND_SECS") {
            if let Ok(n) = v.parse() {
                self.round.duration_secs = n;
            }
        }
        if let Ok(v) = std::env::var("PLAZA_DWELL_SECS") {
            if let Ok(n) = v.parse() {
                self.round.dwell_secs = n;
            }
        }
        if let Ok(v) = std::env::var("PLAZA_SIMULATE") {
            self.simulator.enabled = parse_flag(&v);
        }
        if let Ok(v) = std::env::var("PLAZA_PUBLISH_HEATMAP") {
            self.publish.heatmap = parse_flag(&v);
        }
    }

    /// Check startup invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        seconds("round.duration_secs", self.round.duration_secs)?;
        seconds("round.dwell_secs", self.round.dwell_secs)?;
        positive("round.tick_interval_ms", self.round.tick_interval_ms as f64)?;
        positive(
            "simulator.ingest_interval_ms",
            self.simulator.ingest_interval_ms as f64,
        )?;

        if self.heatmap.width == 0 || self.heatmap.height == 0 {
            return Err(ConfigError::DegenerateGrid {
                width: self.heatmap.width,
                height: self.heatmap.height,
            });
        }
        match self.heatmap.width.checked_mul(self.heatmap.height) {
            Some(cells) if cells <= MAX_HEATMAP_CELLS => {}
            _ => {
                return Err(ConfigError::GridTooLarge {
                    width: self.heatmap.width,
                    height: self.heatmap.height,
                    max: MAX_HEATMAP_CELLS,
                })
            }
        }
        // NaN fails both comparisons
        if !(self.heatmap.decay > 0.0 && self.heatmap.decay < 1.0) {
            return Err(ConfigError::Decay(self.heatmap.decay));
        }

        let n = &self.narrative;
        if n.crisis_enter >= n.crisis_exit {
            return Err(ConfigError::Hysteresis {
                path: "crisis",
                enter: n.crisis_enter,
                exit: n.crisis_exit,
            });
        }
        if n.gridlock_enter >= n.gridlock_exit {
            return Err(ConfigError::Hysteresis {
                path: "gridlock",
                enter: n.gridlock_enter,
                exit: n.gridlock_exit,
            });
        }
        if n.eco_exit >= n.eco_enter {
            return Err(ConfigError::Hysteresis {
                path: "eco",
                enter: n.eco_enter,
                exit: n.eco_exit,
            });
        }

        let sim = &self.simulator;
        if sim.min_people > sim.max_people {
            return Err(ConfigError::Population {
                min: sim.min_people,
                max: sim.max_people,
            });
        }
        if !(sim.speed >= 0.0 && sim.speed.is_finite()) {
            return Err(ConfigError::NotPositive {
                field: "simulator.speed",
                value: sim.speed,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Positive and convertible to a `Duration`.
fn seconds(field: &'static str, value: f64) -> Result<(), ConfigError> {
    positive(field, value)?;
    Duration::try_from_secs_f64(value)
        .map(|_| ())
        .map_err(|_| ConfigError::DurationOverflow { field, value })
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    pub duration_secs: f64,
    /// Continuous residency needed in one zone before a vote fires.
    pub dwell_secs: f64,
    pub tick_interval_ms: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            dwell_secs: 3.0,
            tick_interval_ms: 250,
        }
    }
}

impl RoundConfig {
    /// Round length. Saturates on values `validate` would reject.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::MAX)
    }

    pub fn dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.dwell_secs).unwrap_or(Duration::MAX)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub width: usize,
    pub height: usize,
    /// Multiplicative decay per update, strictly inside (0, 1).
    pub decay: f64,
    /// Intensity deposited per person per update.
    pub increment: u32,
    /// Deposit manual-vote click positions as well.
    pub from_click: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            width: 32,
            height: 18,
            decay: 0.92,
            increment: 12,
            from_click: false,
        }
    }
}

/// Enter/exit thresholds of the path state machine.
///
/// Each pair must leave a gap so a borderline value cannot flip the path
/// back and forth between adjacent rounds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NarrativeThresholds {
    pub crisis_enter: i32,
    pub crisis_exit: i32,
    pub gridlock_enter: i32,
    pub gridlock_exit: i32,
    pub eco_enter: i32,
    pub eco_exit: i32,
}

impl Default for NarrativeThresholds {
    fn default() -> Self {
        Self {
            crisis_enter: 25,
            crisis_exit: 35,
            gridlock_enter: 25,
            gridlock_exit: 35,
            eco_enter: 75,
            eco_exit: 65,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub enabled: bool,
    pub min_people: usize,
    pub max_people: usize,
    /// Walking speed in normalized floor units per second.
    pub speed: f64,
    pub ingest_interval_ms: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_people: 2,
            max_people: 8,
            speed: 0.15,
            ingest_interval_ms: 100,
        }
    }
}

impl SimulatorConfig {
    pub fn ingest_interval(&self) -> Duration {
        Duration::from_millis(self.ingest_interval_ms)
    }
}

/// Which sub-documents get published.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub core: bool,
    pub story: bool,
    pub city: bool,
    pub people: bool,
    /// Off by default: the grid dominates message size.
    pub heatmap: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            core: true,
            story: true,
            city: true,
            people: true,
            heatmap: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
