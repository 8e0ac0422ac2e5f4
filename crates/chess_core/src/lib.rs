//! Rules boundary shared by the engine crates.
//!
//! Move generation, FEN handling and move application come from
//! `cozy-chess`. This crate adds the pieces a search engine needs on top:
//! a [`Game`] that remembers every position it has passed through (for
//! threefold repetition), terminal-status detection, UCI notation with
//! standard castling, vertical mirroring, and the time budget formula.

pub mod error;
pub mod game;
pub mod mirror;
pub mod notation;
pub mod time_control;

pub use error::RulesError;
pub use game::{legal_moves, repetition_key, Game, GameStatus};
pub use mirror::mirror;
pub use notation::{move_to_uci, parse_uci_move, to_standard_castling};
pub use time_control::*;

// The rules types are part of this crate's public surface.
pub use cozy_chess::{Board, Color, File, Move, Piece, Rank, Square};

/// FEN of the standard starting position.
pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
