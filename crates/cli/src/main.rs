use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    herald_config::HeraldConfig,
    herald_engine::{MessengerEngine, loopback::LoopbackEngine},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald, a multi-session bulk messaging gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server.
    Gateway {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
        /// Override the configured port.
        #[arg(long)]
        port: Option<u16>,
        /// Load config from this file instead of the standard locations.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate the effective configuration and print it.
    Doctor {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load(config: Option<&PathBuf>) -> anyhow::Result<HeraldConfig> {
    match config {
        Some(path) => herald_config::load_config(path),
        None => Ok(herald_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    match cli.command {
        Commands::Gateway { bind, port, config } => {
            let mut config = load(config.as_ref())?;
            if let Some(bind) = bind {
                config.gateway.bind = bind;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            // The real messaging engine is linked in by the deployment;
            // the stock binary wires the in-process loopback engine.
            let engine: Arc<dyn MessengerEngine> = Arc::new(LoopbackEngine::new());
            herald_gateway::server::start_gateway(config, engine).await
        },
        Commands::Doctor { config } => {
            let config = load(config.as_ref())?;
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        },
    }
}
