use anyhow::Context;
use clap::Parser;
use plaza_core::PlazaConfig;
use plaza_engine::{spawn_source_pump, GameCoordinator, SimulatedCrowd};
use plaza_gateway::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plaza", author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "plaza.toml")]
    config: String,

    /// Gateway bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Gateway port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Drive the floor with a simulated crowd instead of a tracker
    #[arg(long)]
    simulate: bool,

    /// Seed for tie-breaks and the simulated crowd
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut PlazaConfig) {
        if let Some(host) = &self.host {
            config.gateway.host = host.clone();
        }
        if let Some(port) = self.port {
            config.gateway.port = port;
        }
        if self.simulate {
            config.simulator.enabled = true;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    info!("Initializing Plaza...");

    // 1. Configuration
    let mut config = PlazaConfig::load_or_default(&args.config)
        .with_context(|| format!("invalid configuration in {}", args.config))?;
    args.apply(&mut config);
    config.validate().context("invalid configuration after command-line overrides")?;

    // 2. Game coordinator
    let (coordinator, game) = GameCoordinator::new(&config)?;
    let coordinator_task = coordinator.spawn();
    info!(
        "Round length {}s, dwell {}s",
        config.round.duration_secs, config.round.dwell_secs
    );

    // 3. Gateway
    let gateway = GatewayServer::new(game.clone(), &config.gateway.host, config.gateway.port);
    let _gateway_task = gateway.start();

    // 4. Optional simulated crowd
    if config.simulator.enabled {
        info!(
            "Simulating {}..{} people",
            config.simulator.min_people, config.simulator.max_people
        );
        let crowd = SimulatedCrowd::new(&config.simulator, config.rng_seed);
        spawn_source_pump(
            Box::new(crowd),
            config.simulator.ingest_interval(),
            game.commands(),
        );
    }

    println!(
        "Plaza online at http://{}:{} — press Ctrl-C to stop.",
        config.gateway.host, config.gateway.port
    );

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            info!("Shutting down");
        }
        _ = coordinator_task => {
            tracing::error!("Game coordinator stopped unexpectedly");
        }
    }

    Ok(())
}
