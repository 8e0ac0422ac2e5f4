//! UCI long algebraic notation.
//!
//! cozy-chess encodes castling as the king capturing its own rook
//! (`e1h1`). The protocol and the network's move index both use the
//! standard form where the king moves two squares (`e1g1`), so moves are
//! converted at this boundary in both directions.

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::error::RulesError;
use crate::game::legal_moves;

/// True when `mv` is a castling move in cozy-chess form.
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

/// Rewrite a king-takes-rook castling move as the two-square king move.
/// Other moves are returned unchanged.
pub fn to_standard_castling(board: &Board, mv: Move) -> Move {
    if !is_castling(board, mv) {
        return mv;
    }
    let file = if (mv.to.file() as u8) > (mv.from.file() as u8) {
        File::G
    } else {
        File::C
    };
    Move {
        from: mv.from,
        to: Square::new(file, mv.from.rank()),
        promotion: None,
    }
}

pub fn move_to_uci(board: &Board, mv: Move) -> String {
    to_standard_castling(board, mv).to_string()
}

/// Parse a UCI move and match it against the legal moves of `board`.
///
/// Both `e1g1` and `e1h1` are accepted for castling.
pub fn parse_uci_move(board: &Board, text: &str) -> Result<Move, RulesError> {
    let text = text.trim().to_ascii_lowercase();
    let mut mv: Move = text
        .parse()
        .map_err(|_| RulesError::UnparsableMove(text.clone()))?;

    let stm = board.side_to_move();
    if board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.from) == Some(stm)
        && board.color_on(mv.to) != Some(stm)
        && mv.to.rank() == mv.from.rank()
    {
        let df = mv.to.file() as i8 - mv.from.file() as i8;
        if df.abs() == 2 {
            let rights = board.castle_rights(stm);
            let rook_file = if df > 0 { rights.short } else { rights.long };
            if let Some(rook_file) = rook_file {
                mv.to = Square::new(rook_file, mv.from.rank());
            }
        }
    }

    if legal_moves(board).contains(&mv) {
        Ok(mv)
    } else {
        Err(RulesError::IllegalMove {
            mv: text,
            fen: board.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod notation_tests;
