//! bot-pilot: drive a UCI engine from externally scraped board state.
//!
//! Owns the engine subprocess and the change-detection loop; everything
//! that touches the website itself (scraping, clicking) stays outside and
//! communicates through the FEN file and stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bot_pilot::config::{ConfigError, PilotConfig};
use bot_pilot::provider::{FenFileProvider, FileScrapeModel};
use bot_pilot::watch::{WatchError, Watcher};
use clap::{Parser, Subcommand};
use engine_bridge::{BridgeError, EngineBridge};
use thiserror::Error;
use tokio::sync::watch;
use uci::PositionId;

#[derive(Parser)]
#[command(name = "bot-pilot")]
#[command(about = "Drives a UCI engine from externally scraped board positions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the engine for the best move in a single position
    BestMove {
        /// Position in FEN notation
        fen: String,
        /// Time budget in milliseconds (overrides pilot.toml)
        #[arg(short, long)]
        movetime: Option<u64>,
    },
    /// Watch a FEN file for changes and print the engine's move on each one
    Watch {
        /// File the external scraper keeps updated with the current FEN
        #[arg(long)]
        fen_file: PathBuf,
        /// Poll interval in milliseconds (overrides pilot.toml)
        #[arg(long)]
        poll_interval: Option<u64>,
    },
}

#[derive(Error, Debug)]
enum PilotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] BridgeError),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Prefix the error with its failure category so "engine unavailable",
/// "website state unreadable", and "protocol violation" can be told apart
/// at a glance.
fn failure_message(err: &PilotError) -> String {
    let category = match err {
        PilotError::Config(_) => "configuration error",
        PilotError::Engine(
            BridgeError::ConcurrentRequest | BridgeError::NotReady | BridgeError::Protocol(_),
        ) => "protocol violation",
        PilotError::Engine(_) => "engine unavailable",
        PilotError::Watch(WatchError::Engine {
            source:
                BridgeError::ConcurrentRequest | BridgeError::NotReady | BridgeError::Protocol(_),
            ..
        }) => "protocol violation",
        PilotError::Watch(WatchError::Engine { .. }) => "engine unavailable",
        PilotError::Watch(_) => "website state unreadable",
    };
    format!("{}: {}", category, err)
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), PilotError> {
    let config = PilotConfig::load()?;

    let bridge = EngineBridge::spawn(&config.engine)?;
    bridge
        .initialize(Duration::from_millis(config.handshake_timeout_ms))
        .await?;

    let result = match command {
        Commands::BestMove { fen, movetime } => {
            let budget = Duration::from_millis(movetime.unwrap_or(config.movetime_ms));
            match bridge.best_move(&PositionId::new(fen), budget).await {
                Ok(mv) => {
                    println!("{}", mv);
                    Ok(())
                }
                Err(e) => Err(PilotError::Engine(e)),
            }
        }
        Commands::Watch {
            fen_file,
            poll_interval,
        } => {
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = shutdown_tx.send(true);
                }
            });

            let provider = FenFileProvider::new(fen_file);
            let mut watcher = Watcher::new(
                provider,
                FileScrapeModel,
                bridge.clone(),
                Duration::from_millis(config.movetime_ms),
            );
            let interval = Duration::from_millis(poll_interval.unwrap_or(config.poll_interval_ms));
            watcher
                .run(interval, shutdown_rx)
                .await
                .map_err(PilotError::Watch)
        }
    };

    bridge.shutdown().await;
    result
}
