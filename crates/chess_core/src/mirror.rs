//! Vertical board mirroring with colour swap.
//!
//! The mirrored position is the same game seen from the other side of the
//! board: ranks are reversed, every piece changes colour, castling rights
//! and the side to move are swapped, and the en-passant square moves to the
//! mirrored rank. Move counters are carried over unchanged.

use cozy_chess::Board;

use crate::error::RulesError;

/// Mirror `board` vertically and swap colours.
///
/// Applying this twice yields the original position.
pub fn mirror(board: &Board) -> Result<Board, RulesError> {
    let fen = board.to_string();
    let mirrored = mirror_fen(&fen).ok_or_else(|| RulesError::Mirror {
        fen: fen.clone(),
        reason: "malformed FEN fields".to_string(),
    })?;
    Board::from_fen(&mirrored, false).map_err(|e| RulesError::Mirror {
        fen,
        reason: format!("{e:?}"),
    })
}

fn mirror_fen(fen: &str) -> Option<String> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next()?;
    let side = fields.next()?;
    let castling = fields.next()?;
    let en_passant = fields.next()?;
    let rest: Vec<&str> = fields.collect();

    let placement = placement
        .split('/')
        .rev()
        .map(swap_case)
        .collect::<Vec<_>>()
        .join("/");

    let side = match side {
        "w" => "b",
        "b" => "w",
        _ => return None,
    };

    let castling = if castling == "-" {
        castling.to_string()
    } else {
        // Keep the canonical KQkq ordering after swapping owners.
        let swapped = swap_case(castling);
        let ordered: String = "KQkq".chars().filter(|c| swapped.contains(*c)).collect();
        if ordered.is_empty() {
            "-".to_string()
        } else {
            ordered
        }
    };

    let en_passant = if en_passant == "-" {
        en_passant.to_string()
    } else {
        let mut chars = en_passant.chars();
        let file = chars.next()?;
        let rank = chars.next()?.to_digit(10)?;
        if !(1..=8).contains(&rank) {
            return None;
        }
        format!("{file}{}", 9 - rank)
    };

    let mut out = vec![placement, side.to_string(), castling, en_passant];
    out.extend(rest.into_iter().map(str::to_string));
    Some(out.join(" "))
}

fn swap_case(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "mirror_tests.rs"]
mod mirror_tests;
