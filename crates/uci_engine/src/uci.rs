//! UCI command parsing and the protocol session.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chess_core::{allocate_time, Color, SearchLimits};
use puct_engine::{EngineConfig, PuctEngine};
use tracing::{debug, info, warn};

const ENGINE_NAME: &str = "PuctChess";
const ENGINE_AUTHOR: &str = "ML-chess";

/// Clock and limit arguments of `go`. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movetime: Option<u64>,
    pub nodes: Option<u32>,
    pub infinite: bool,
}

impl GoParams {
    fn parse(args: &[&str]) -> Self {
        let mut params = GoParams::default();
        let mut iter = args.iter();
        while let Some(&key) = iter.next() {
            match key {
                "infinite" => params.infinite = true,
                "wtime" | "btime" | "winc" | "binc" | "movetime" | "nodes" => {
                    let value = iter.next().and_then(|v| v.parse::<u64>().ok());
                    match key {
                        "wtime" => params.wtime = value,
                        "btime" => params.btime = value,
                        "winc" => params.winc = value,
                        "binc" => params.binc = value,
                        "movetime" => params.movetime = value,
                        _ => params.nodes = value.map(|n| n.min(u64::from(u32::MAX)) as u32),
                    }
                }
                // depth, mate, movestogo, ponder: not used by this engine
                _ => {}
            }
        }
        params
    }

    /// Search limits for the side `to_move` at move `move_number`.
    ///
    /// `movetime` wins over the clock. A bare `go` and `go infinite` use the
    /// configured simulation count.
    pub fn limits(&self, config: &EngineConfig, to_move: Color, move_number: u32) -> SearchLimits {
        let remaining = match to_move {
            Color::White => self.wtime,
            Color::Black => self.btime,
        };
        let simulations = self.nodes.unwrap_or(config.max_simulations);

        if let Some(ms) = self.movetime {
            SearchLimits::simulations_and_time(simulations, Duration::from_millis(ms))
        } else if let Some(ms) = remaining {
            let budget = allocate_time(move_number, Duration::from_millis(ms));
            SearchLimits::simulations_and_time(simulations, budget)
        } else if let Some(nodes) = self.nodes {
            SearchLimits::simulations(nodes)
        } else {
            // `stop` cannot interrupt a running search, so `infinite` gets
            // the default budget too.
            SearchLimits::simulations(config.num_simulations)
        }
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    SetOption { name: String, value: Option<String> },
    Position { fen: Option<String>, moves: Vec<String> },
    Go(GoParams),
    Stop,
    Quit,
    Unknown(String),
}

impl UciCommand {
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (&head, args) = tokens.split_first()?;

        let command = match head {
            "uci" => UciCommand::Uci,
            "isready" => UciCommand::IsReady,
            "ucinewgame" => UciCommand::UciNewGame,
            "setoption" => parse_setoption(args),
            "position" => parse_position(args),
            "go" => UciCommand::Go(GoParams::parse(args)),
            "stop" => UciCommand::Stop,
            "quit" => UciCommand::Quit,
            _ => UciCommand::Unknown(line.trim().to_string()),
        };
        Some(command)
    }
}

/// `setoption name <words...> [value <words...>]`
fn parse_setoption(args: &[&str]) -> UciCommand {
    let name_at = args.iter().position(|&t| t == "name");
    let value_at = args.iter().position(|&t| t == "value");

    let name_end = value_at.unwrap_or(args.len());
    let name = match name_at {
        Some(i) if i < name_end => args[i + 1..name_end].join(" "),
        _ => String::new(),
    };
    let value = value_at.map(|i| args[i + 1..].join(" "));
    UciCommand::SetOption { name, value }
}

/// `position startpos|fen <6 fields> [moves ...]`
fn parse_position(args: &[&str]) -> UciCommand {
    let moves_at = args.iter().position(|&t| t == "moves");
    let setup = &args[..moves_at.unwrap_or(args.len())];
    let moves = moves_at
        .map(|i| args[i + 1..].iter().map(|m| m.to_string()).collect())
        .unwrap_or_default();

    let fen = match setup.split_first() {
        Some((&"fen", fields)) if !fields.is_empty() => Some(fields.join(" ")),
        _ => None,
    };
    UciCommand::Position { fen, moves }
}

/// A UCI conversation with one engine, answering on `out`.
pub struct UciSession<W: Write> {
    engine: PuctEngine,
    out: W,
}

impl<W: Write> UciSession<W> {
    pub fn new(engine: PuctEngine, out: W) -> Self {
        Self { engine, out }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &PuctEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Handle one input line. Returns false when the session should end.
    pub fn handle_line(&mut self, line: &str) -> Result<bool> {
        let Some(command) = UciCommand::parse(line) else {
            return Ok(true);
        };
        debug!(?command, "UCI command");

        match command {
            UciCommand::Uci => self.cmd_uci()?,
            UciCommand::IsReady => self.cmd_isready()?,
            UciCommand::UciNewGame => self.engine.new_game(),
            UciCommand::SetOption { name, value } => self.cmd_setoption(&name, value.as_deref()),
            UciCommand::Position { fen, moves } => self.cmd_position(fen.as_deref(), &moves)?,
            UciCommand::Go(params) => self.cmd_go(&params)?,
            UciCommand::Stop => {}
            UciCommand::Quit => return Ok(false),
            UciCommand::Unknown(text) => warn!(command = %text, "Unknown UCI command"),
        }
        self.out.flush()?;
        Ok(true)
    }

    fn cmd_uci(&mut self) -> Result<()> {
        let config = self.engine.config();
        writeln!(self.out, "id name {ENGINE_NAME} {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(self.out, "id author {ENGINE_AUTHOR}")?;
        writeln!(
            self.out,
            "option name UseSearch type check default {}",
            config.use_search
        )?;
        writeln!(
            self.out,
            "option name Simulations type spin default {} min 1 max {}",
            config.num_simulations, config.max_simulations
        )?;
        writeln!(
            self.out,
            "option name CPuct type string default {}",
            config.search.c_puct
        )?;
        let model = config
            .model_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<empty>".to_string());
        writeln!(self.out, "option name ModelPath type string default {model}")?;
        writeln!(self.out, "uciok")?;
        Ok(())
    }

    fn cmd_isready(&mut self) -> Result<()> {
        match self.engine.ensure_initialized() {
            Ok(true) => {}
            Ok(false) => warn!("No model configured; `go` will fail until one is set"),
            Err(e) => {
                warn!(error = %e, "Model load failed");
                writeln!(self.out, "info string {e}")?;
            }
        }
        writeln!(self.out, "readyok")?;
        Ok(())
    }

    fn cmd_setoption(&mut self, name: &str, value: Option<&str>) {
        let value = value.unwrap_or("").trim();
        match name.to_ascii_lowercase().as_str() {
            "usesearch" => match value.parse::<bool>() {
                Ok(v) => self.engine.config_mut().use_search = v,
                Err(_) => warn!(value, "UseSearch expects true or false"),
            },
            "simulations" => match value.parse::<u32>() {
                Ok(v) if v > 0 => self.engine.config_mut().num_simulations = v,
                _ => warn!(value, "Simulations expects a positive integer"),
            },
            "cpuct" => match value.parse::<f32>() {
                Ok(v) if v.is_finite() && v > 0.0 => self.engine.config_mut().search.c_puct = v,
                _ => warn!(value, "CPuct expects a positive number"),
            },
            "modelpath" => self.set_model_path(value),
            _ => warn!(name, "Unknown option"),
        }
    }

    /// Load the model right away if possible; otherwise remember the path
    /// for the next `isready`.
    fn set_model_path(&mut self, value: &str) {
        if value.is_empty() || value == "<empty>" {
            self.engine.config_mut().model_path = None;
            return;
        }
        let path = PathBuf::from(value);
        if let Err(e) = self.engine.load_model(&path) {
            warn!(error = %e, "Model load failed");
            self.engine.config_mut().model_path = Some(path);
        }
    }

    fn cmd_position(&mut self, fen: Option<&str>, moves: &[String]) -> Result<()> {
        let moves: Vec<&str> = moves.iter().map(String::as_str).collect();
        if let Err(e) = self.engine.set_position(fen, &moves) {
            warn!(error = %e, "Rejected position");
            writeln!(self.out, "info string {e}")?;
        }
        Ok(())
    }

    fn cmd_go(&mut self, params: &GoParams) -> Result<()> {
        let game = self.engine.game();
        let limits = params.limits(
            self.engine.config(),
            game.side_to_move(),
            game.fullmove_number(),
        );
        debug!(?params, ?limits, "Starting search");

        match self.engine.best_move(&limits) {
            Ok(chosen) => {
                if let Some(outcome) = &chosen.search {
                    let stats = &outcome.stats;
                    let ms = stats.elapsed.as_millis().max(1);
                    let nps = u128::from(stats.simulations) * 1000 / ms;
                    writeln!(
                        self.out,
                        "info nodes {} time {} nps {} pv {}",
                        stats.root_visits,
                        stats.elapsed.as_millis(),
                        nps,
                        chosen.uci
                    )?;
                }
                info!(mv = %chosen.uci, "Best move");
                writeln!(self.out, "bestmove {}", chosen.uci)?;
            }
            Err(e) => {
                warn!(error = %e, "No move found");
                writeln!(self.out, "info string {e}")?;
                writeln!(self.out, "bestmove 0000")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
