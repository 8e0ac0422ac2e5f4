//! PUCT search implementation.
//!
//! Each simulation:
//! 1. Selection: descend by PUCT score to an unexpanded or terminal node
//! 2. Materialization: build that node's position from its parent's
//! 3. Evaluation: exact value for finished games, otherwise one evaluator call
//! 4. Expansion: one child per legal move with the decoded prior
//! 5. Backup: alternate the sign up to the root
//!
//! The budget is checked between simulations. The move is then picked from
//! the root by visit count, with a mate-in-one override and a penalty for
//! moves that walk into a threefold repetition.

use std::time::Duration;

use chess_core::{move_to_uci, Game, Move, RulesError, SearchLimits};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::SearchConfig;
use crate::evaluator::{interpret_value, Evaluation, Evaluator, EvaluatorError};
use crate::node::NodeId;
use crate::planes::{encode_position, EncodedPosition};
use crate::policy::decode_policy;
use crate::tree::SearchTree;

/// Errors that can occur during search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    #[error("Node {0} has no position")]
    Unmaterialized(u32),
}

/// Statistics of one root move after the search.
#[derive(Debug, Clone, PartialEq)]
pub struct RootMoveStats {
    pub mv: Move,
    /// Move in protocol notation (standard castling).
    pub uci: String,
    pub visits: u32,
    pub prior: f32,
    /// Mean value from the mover's point of view.
    pub q: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchStats {
    /// Simulations actually run.
    pub simulations: u32,
    pub root_visits: u32,
    pub tree_size: usize,
    pub elapsed: Duration,
    /// True when the time limit ended the search before the simulation cap.
    pub stopped_by_time: bool,
    /// Simulations whose evaluator call failed.
    pub evaluator_failures: u32,
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_move: Move,
    pub stats: SearchStats,
    /// Root children in expansion order.
    pub root_moves: Vec<RootMoveStats>,
}

/// Single-threaded PUCT search over a fresh tree per call.
pub struct UctSearch<'a, E: Evaluator + ?Sized> {
    evaluator: &'a E,
    config: &'a SearchConfig,
}

impl<'a, E: Evaluator + ?Sized> UctSearch<'a, E> {
    pub fn new(evaluator: &'a E, config: &'a SearchConfig) -> Self {
        Self { evaluator, config }
    }

    /// Search `game` within `limits` and pick a move.
    pub fn run(&self, game: &Game, limits: &SearchLimits) -> Result<SearchOutcome, SearchError> {
        if game.legal_moves().is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        let clock = limits.start();
        let mut tree = SearchTree::new(game.clone());
        let mut simulations = 0;
        let mut evaluator_failures = 0;
        let mut stopped_by_time = false;

        while simulations < limits.simulations {
            if clock.expired() {
                stopped_by_time = true;
                break;
            }
            if !self.simulate(&mut tree)? {
                evaluator_failures += 1;
            }
            simulations += 1;
        }

        let root = tree.root();
        let candidates: Vec<(Move, u32)> = if tree.children(root).is_empty() {
            game.legal_moves().into_iter().map(|mv| (mv, 0)).collect()
        } else {
            tree.children(root)
                .iter()
                .filter_map(|&child| {
                    let node = tree.get(child);
                    node.mv.map(|mv| (mv, node.visits))
                })
                .collect()
        };

        let best_move = select_root_move(game, &candidates, self.config.repetition_penalty)?
            .ok_or(SearchError::NoLegalMoves)?;

        let root_moves = tree
            .children(root)
            .iter()
            .filter_map(|&child| {
                let node = tree.get(child);
                node.mv.map(|mv| RootMoveStats {
                    mv,
                    uci: move_to_uci(game.board(), mv),
                    visits: node.visits,
                    prior: node.prior,
                    q: node.mean_value(),
                })
            })
            .collect();

        let stats = SearchStats {
            simulations,
            root_visits: tree.get(root).visits,
            tree_size: tree.len(),
            elapsed: clock.elapsed(),
            stopped_by_time,
            evaluator_failures,
        };

        debug!(
            best = %move_to_uci(game.board(), best_move),
            simulations = stats.simulations,
            tree_size = stats.tree_size,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            stopped_by_time,
            "Search finished"
        );

        Ok(SearchOutcome {
            best_move,
            stats,
            root_moves,
        })
    }

    /// Run one simulation. Returns false when the evaluator failed, in
    /// which case the leaf was backed up with a zero value and left
    /// unexpanded.
    fn simulate(&self, tree: &mut SearchTree) -> Result<bool, SearchError> {
        let leaf = self.select_leaf(tree)?;

        let Some(game) = tree.game(leaf) else {
            return Err(SearchError::Unmaterialized(leaf.0));
        };

        if let Some(value) = game.terminal_value() {
            tree.backup(leaf, value);
            trace!(leaf = leaf.0, value, "Terminal leaf");
            return Ok(true);
        }

        let planes = encode_position(game.board())?;
        let (value, ok) = match self.evaluate(game, &planes) {
            Ok((evaluation, priors)) => {
                let initial_value = if tree.get(leaf).parent.is_none() {
                    self.config.fpu_root
                } else {
                    self.config.fpu
                };
                tree.expand(leaf, &priors, initial_value, evaluation.wdl);
                (evaluation.value, true)
            }
            Err(e) => {
                warn!(leaf = leaf.0, error = %e, "Evaluator failed; backing up zero");
                (0.0, false)
            }
        };

        tree.backup(leaf, value);
        trace!(
            leaf = leaf.0,
            value,
            tree_size = tree.len(),
            "Simulation complete"
        );
        Ok(ok)
    }

    /// Descend from the root to the node to evaluate and materialize it.
    fn select_leaf(&self, tree: &mut SearchTree) -> Result<NodeId, SearchError> {
        let mut current = tree.root();
        loop {
            let node = tree.get(current);
            if !node.expanded {
                break;
            }
            match tree.select_child(current, self.config.c_puct) {
                Some(child) => current = child,
                None => break,
            }
        }
        tree.materialize(current)?;
        Ok(current)
    }

    /// One evaluator call for `game`, read into a value and priors.
    fn evaluate(
        &self,
        game: &Game,
        planes: &EncodedPosition,
    ) -> Result<(Evaluation, Vec<(Move, f32)>), EvaluatorError> {
        let output = self.evaluator.evaluate_one(planes)?;
        let evaluation = interpret_value(
            &output,
            self.evaluator.schema(),
            game.side_to_move(),
            self.config.value_perspective,
            self.config.wdl_value,
        )?;
        Ok((evaluation, decode_policy(game.board(), &output.policy)))
    }
}

/// Pick the move to play from `(move, visits)` candidates of `game`.
///
/// A move that mates immediately is returned at once. Otherwise the score is
/// the visit count, multiplied by `repetition_penalty` when the move makes a
/// threefold repetition or lets the opponent make one with their reply.
/// The first candidate with the highest score wins.
pub fn select_root_move(
    game: &Game,
    candidates: &[(Move, u32)],
    repetition_penalty: f32,
) -> Result<Option<Move>, RulesError> {
    let mut best = None;
    let mut best_score = -1.0f32;

    for &(mv, visits) in candidates {
        let next = game.after(mv)?;

        if next.is_checkmate() {
            info!(mv = %move_to_uci(game.board(), mv), "Playing mate in one");
            return Ok(Some(mv));
        }

        let mut score = visits as f32;
        if next.is_threefold_repetition() {
            debug!(mv = %move_to_uci(game.board(), mv), visits, "Move repeats a third time");
            score *= repetition_penalty;
        } else if let Some(reply) = forced_repetition_reply(&next)? {
            debug!(
                mv = %move_to_uci(game.board(), mv),
                reply = %move_to_uci(next.board(), reply),
                visits,
                "Opponent can force threefold repetition"
            );
            score *= repetition_penalty;
        }

        if score > best_score {
            best_score = score;
            best = Some(mv);
        }
    }

    Ok(best)
}

/// A reply in `game` that produces a threefold repetition, if any.
fn forced_repetition_reply(game: &Game) -> Result<Option<Move>, RulesError> {
    for reply in game.legal_moves() {
        if game.after(reply)?.is_threefold_repetition() {
            return Ok(Some(reply));
        }
    }
    Ok(None)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
