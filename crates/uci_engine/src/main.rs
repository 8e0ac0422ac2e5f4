//! UCI engine binary.
//!
//! UCI engines communicate via stdin/stdout, so logs go to stderr or to
//! the file given with `--log-file`. With `--selfplay` the engine plays a
//! game against itself instead of reading commands.

use std::fs::OpenOptions;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chess_core::SearchLimits;
use clap::Parser;
use puct_engine::{EngineConfig, PuctEngine};
use tracing::{debug, info};

mod selfplay;
mod uci;

use crate::uci::UciSession;

/// PUCT chess engine speaking UCI.
#[derive(Debug, Parser)]
#[command(name = "uci_engine", version, about)]
struct Args {
    /// ONNX model to load on `isready`
    #[arg(long)]
    model: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Simulations for `go` without limits
    #[arg(long)]
    simulations: Option<u32>,

    /// Play the policy's top move without searching
    #[arg(long)]
    no_search: bool,

    /// Play one game against itself and exit
    #[arg(long)]
    selfplay: bool,

    /// Stop self-play after this many half-moves
    #[arg(long, requires = "selfplay")]
    max_plies: Option<u32>,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(model) = &args.model {
        config.model_path = Some(model.clone());
    }
    if let Some(simulations) = args.simulations {
        config.num_simulations = simulations;
    }
    if args.no_search {
        config.use_search = false;
    }
    Ok(config)
}

fn run_selfplay(config: EngineConfig, max_plies: Option<u32>) -> Result<()> {
    let mut engine = PuctEngine::new(config);
    if !engine.ensure_initialized()? {
        bail!("self-play needs a model; pass --model or set model_path in the config");
    }
    let limits = SearchLimits::simulations(engine.config().num_simulations);

    let stdout = io::stdout();
    let game = selfplay::play_game(&mut engine, &limits, max_plies, &mut stdout.lock())?;
    debug!(moves = game.moves.len(), result = game.result, "Self-play finished");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_file.as_ref())?;

    let config = build_config(&args)?;
    if args.selfplay {
        info!(?config, "Starting self-play");
        return run_selfplay(config, args.max_plies);
    }
    info!(?config, "Starting UCI engine");

    let stdout = io::stdout();
    let mut session = UciSession::new(PuctEngine::new(config), stdout.lock());

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if !session.handle_line(&line)? {
            break;
        }
    }

    debug!("UCI session finished");
    Ok(())
}
