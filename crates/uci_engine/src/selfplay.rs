//! The engine playing both sides of a game.

use std::io::Write;

use anyhow::Result;
use chess_core::{Color, GameStatus, SearchLimits};
use puct_engine::PuctEngine;
use tracing::{info, warn};

/// A finished (or abandoned) self-play game.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfPlayGame {
    pub start_fen: String,
    pub first_move_number: u32,
    pub black_starts: bool,
    pub moves: Vec<String>,
    pub status: GameStatus,
    /// `1-0`, `0-1`, `1/2-1/2`, or `*` when play stopped early.
    pub result: &'static str,
}

impl SelfPlayGame {
    /// Numbered move list, e.g. `1. e2e4 e7e5 2. g1f3`.
    pub fn record(&self) -> String {
        let mut parts = Vec::with_capacity(self.moves.len());
        let mut number = self.first_move_number;
        let mut white_to_move = !self.black_starts;
        for (i, mv) in self.moves.iter().enumerate() {
            if white_to_move {
                parts.push(format!("{number}. {mv}"));
            } else {
                if i == 0 {
                    parts.push(format!("{number}... {mv}"));
                } else {
                    parts.push(mv.clone());
                }
                number += 1;
            }
            white_to_move = !white_to_move;
        }
        parts.join(" ")
    }
}

fn result_of(status: GameStatus, loser: Color) -> &'static str {
    match status {
        GameStatus::Ongoing => "*",
        GameStatus::Checkmate => match loser {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        _ => "1/2-1/2",
    }
}

/// Play the engine against itself from its current position.
///
/// Every chosen move is written as a `bestmove` line. Play ends when the
/// game is over, after `max_plies` moves, or when the engine fails to
/// produce a move; the failure is reported as an `info string` line.
/// The move list and result are written last.
pub fn play_game<W: Write>(
    engine: &mut PuctEngine,
    limits: &SearchLimits,
    max_plies: Option<u32>,
    out: &mut W,
) -> Result<SelfPlayGame> {
    let start_fen = engine.game().fen();
    let first_move_number = engine.game().fullmove_number();
    let black_starts = engine.game().side_to_move() == Color::Black;
    let already_played = engine.moves().len();
    let mut plies = 0u32;

    while !engine.game().is_terminal() {
        if max_plies.is_some_and(|max| plies >= max) {
            info!(plies, "Ply limit reached");
            break;
        }
        let chosen = match engine.best_move(limits) {
            Ok(chosen) => chosen,
            Err(e) => {
                warn!(error = %e, "Self-play stopped");
                writeln!(out, "info string {e}")?;
                break;
            }
        };
        info!(ply = plies + 1, mv = %chosen.uci, "Self-play move");
        writeln!(out, "bestmove {}", chosen.uci)?;
        engine.play_move(chosen.mv)?;
        plies += 1;
    }

    let game = engine.game();
    let status = game.status();
    let finished = SelfPlayGame {
        start_fen,
        first_move_number,
        black_starts,
        moves: engine.moves()[already_played..].to_vec(),
        status,
        result: result_of(status, game.side_to_move()),
    };

    info!(
        start = %finished.start_fen,
        status = ?finished.status,
        result = finished.result,
        plies,
        "Self-play game over"
    );
    writeln!(
        out,
        "info string game over: {} {}",
        finished.record(),
        finished.result
    )?;
    out.flush()?;
    Ok(finished)
}

#[cfg(test)]
#[path = "selfplay_tests.rs"]
mod selfplay_tests;
