//! Turning a raw policy vector into priors over the legal moves.

use chess_core::{legal_moves, Board, Move};

use crate::policy_map::policy_index;

/// Softmax of the policy logits restricted to the legal moves of `board`.
///
/// Entries outside the legal set are ignored, as are legal moves whose
/// logit is missing or not finite. If no legal move has a usable logit the
/// priors are uniform. The result follows the rules engine's move order.
pub fn decode_policy(board: &Board, raw: &[f32]) -> Vec<(Move, f32)> {
    let moves = legal_moves(board);
    if moves.is_empty() {
        return Vec::new();
    }

    let logits: Vec<Option<f32>> = moves
        .iter()
        .map(|&mv| {
            policy_index(board, mv)
                .and_then(|i| raw.get(i).copied())
                .filter(|logit| logit.is_finite())
        })
        .collect();

    let max_logit = logits
        .iter()
        .flatten()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max);

    if max_logit == f32::NEG_INFINITY {
        let uniform = 1.0 / moves.len() as f32;
        return moves.into_iter().map(|mv| (mv, uniform)).collect();
    }

    let exps: Vec<f32> = logits
        .iter()
        .map(|logit| logit.map_or(0.0, |l| (l - max_logit).exp()))
        .collect();
    // The maximum contributes exp(0) = 1, so the sum is never zero.
    let sum: f32 = exps.iter().sum();

    moves
        .into_iter()
        .zip(exps)
        .map(|(mv, e)| (mv, e / sum))
        .collect()
}

/// The move with the highest prior; the first one wins ties.
pub fn best_move(priors: &[(Move, f32)]) -> Option<Move> {
    let mut best: Option<(Move, f32)> = None;
    for &(mv, p) in priors {
        if best.map_or(true, |(_, bp)| p > bp) {
            best = Some((mv, p));
        }
    }
    best.map(|(mv, _)| mv)
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
