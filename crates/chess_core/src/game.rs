//! A position together with the history that led to it.
//!
//! `cozy_chess::Board` knows nothing about earlier positions, so repetition
//! detection lives here: every position reached (the initial one included)
//! is recorded by its [`repetition_key`].

use cozy_chess::{Board, BoardBuilder, Color, Move, Piece, Rank, Square};

use crate::error::RulesError;
use crate::notation::parse_uci_move;

/// Outcome classification of a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    /// The side to move is mated.
    Checkmate,
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }

    pub fn is_draw(self) -> bool {
        !matches!(self, GameStatus::Ongoing | GameStatus::Checkmate)
    }
}

/// Generate all legal moves of a board into a freshly allocated vector.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|piece_moves| {
        moves.extend(piece_moves);
        false
    });
    moves
}

/// Hash identifying a position for repetition purposes.
///
/// cozy-chess keeps an en-passant file after every double pawn push. Two
/// positions only differ by it when the capture is actually legal, so the
/// file is dropped from the key otherwise.
pub fn repetition_key(board: &Board) -> u64 {
    let Some(file) = board.en_passant() else {
        return board.hash();
    };
    let rank = match board.side_to_move() {
        Color::White => Rank::Sixth,
        Color::Black => Rank::Third,
    };
    let target = Square::new(file, rank);
    let capturable = legal_moves(board)
        .iter()
        .any(|mv| mv.to == target && board.piece_on(mv.from) == Some(Piece::Pawn));
    if capturable {
        return board.hash();
    }

    let mut builder = BoardBuilder::from_board(board);
    builder.en_passant = None;
    builder
        .build()
        .map_or_else(|_| board.hash(), |normalized| normalized.hash())
}

#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    /// Hashes of every position reached, oldest first. The last entry is the
    /// current position.
    history: Vec<u64>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::default())
    }

    /// Start a game from an arbitrary board with an empty history.
    pub fn from_board(board: Board) -> Self {
        let history = vec![repetition_key(&board)];
        Self { board, history }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board =
            Board::from_fen(fen.trim(), false).map_err(|e| RulesError::InvalidFen {
                fen: fen.to_string(),
                reason: format!("{e:?}"),
            })?;
        Ok(Self::from_board(board))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn fullmove_number(&self) -> u32 {
        u32::from(self.board.fullmove_number())
    }

    /// Half-moves played since the start of the game, derived from the
    /// fullmove counter.
    pub fn ply(&self) -> u32 {
        let base = self.fullmove_number().saturating_sub(1) * 2;
        match self.side_to_move() {
            Color::White => base,
            Color::Black => base + 1,
        }
    }

    /// Legal moves in the rules engine's generation order.
    ///
    /// Castling appears in cozy-chess form (king takes own rook); use
    /// [`crate::to_standard_castling`] before indexing or printing.
    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board)
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Apply a legal move and record the resulting position.
    pub fn play(&mut self, mv: Move) -> Result<(), RulesError> {
        if !self.is_legal(mv) {
            return Err(RulesError::IllegalMove {
                mv: mv.to_string(),
                fen: self.fen(),
            });
        }
        self.board.play(mv);
        self.history.push(repetition_key(&self.board));
        Ok(())
    }

    /// Parse a UCI move in this position and play it.
    pub fn play_uci(&mut self, text: &str) -> Result<Move, RulesError> {
        let mv = parse_uci_move(&self.board, text)?;
        self.play(mv)?;
        Ok(mv)
    }

    /// Copy of this game with `mv` applied.
    pub fn after(&self, mv: Move) -> Result<Game, RulesError> {
        let mut next = self.clone();
        next.play(mv)?;
        Ok(next)
    }

    /// How many times the current position has occurred, this one included.
    pub fn repetitions(&self) -> usize {
        let current = repetition_key(&self.board);
        self.history.iter().filter(|&&h| h == current).count()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetitions() >= 3
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.board.halfmove_clock() >= 100
    }

    /// Bare kings, or a single minor piece against a bare king.
    pub fn is_insufficient_material(&self) -> bool {
        match self.board.occupied().len() {
            2 => true,
            3 => {
                let minors = self.board.pieces(Piece::Knight) | self.board.pieces(Piece::Bishop);
                minors.len() == 1
            }
            _ => false,
        }
    }

    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn status(&self) -> GameStatus {
        if self.legal_moves().is_empty() {
            return if self.in_check() {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            };
        }
        if self.is_threefold_repetition() {
            GameStatus::ThreefoldRepetition
        } else if self.is_fifty_move_draw() {
            GameStatus::FiftyMoveRule
        } else if self.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check() && self.legal_moves().is_empty()
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Exact value of a finished game for the side to move: -1 when mated,
    /// 0 for any draw, `None` while the game goes on.
    pub fn terminal_value(&self) -> Option<f32> {
        match self.status() {
            GameStatus::Ongoing => None,
            GameStatus::Checkmate => Some(-1.0),
            _ => Some(0.0),
        }
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
