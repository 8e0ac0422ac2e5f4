//! The engine: evaluator handle, current game, and move choice.

use std::path::Path;

use chess_core::{move_to_uci, Game, Move, SearchLimits};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::planes::encode_position;
use crate::policy::{best_move, decode_policy};
use crate::search::{SearchError, SearchOutcome, UctSearch};

/// A chosen move plus, when search ran, the search result behind it.
#[derive(Debug, Clone)]
pub struct EngineMove {
    pub mv: Move,
    /// Move in protocol notation (standard castling).
    pub uci: String,
    pub search: Option<SearchOutcome>,
}

/// PUCT chess engine.
///
/// Holds the current game and the moves applied to reach it. No move can
/// be chosen until an evaluator is set or a model is loaded.
pub struct PuctEngine {
    config: EngineConfig,
    evaluator: Option<Box<dyn Evaluator>>,
    game: Game,
    moves: Vec<String>,
}

impl std::fmt::Debug for PuctEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PuctEngine")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("fen", &self.game.fen())
            .field("moves", &self.moves)
            .finish()
    }
}

impl Default for PuctEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PuctEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            evaluator: None,
            game: Game::new(),
            moves: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Use `evaluator` for all following searches.
    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator>) {
        info!(schema = ?evaluator.schema(), "Evaluator installed");
        self.evaluator = Some(evaluator);
    }

    pub fn is_initialized(&self) -> bool {
        self.evaluator.is_some()
    }

    /// Load an ONNX model as the evaluator.
    #[cfg(feature = "onnx")]
    pub fn load_model(&mut self, path: &Path) -> Result<(), EngineError> {
        let evaluator =
            crate::onnx::OnnxEvaluator::load(path).map_err(|e| EngineError::ModelLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.set_evaluator(Box::new(evaluator));
        self.config.model_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Load an ONNX model as the evaluator.
    #[cfg(not(feature = "onnx"))]
    pub fn load_model(&mut self, path: &Path) -> Result<(), EngineError> {
        Err(EngineError::ModelLoad {
            path: path.to_path_buf(),
            reason: "built without the `onnx` feature".to_string(),
        })
    }

    /// Make sure an evaluator is available, loading the configured model
    /// if none is set. Returns whether the engine is ready to search.
    pub fn ensure_initialized(&mut self) -> Result<bool, EngineError> {
        if self.is_initialized() {
            return Ok(true);
        }
        match self.config.model_path.clone() {
            Some(path) => {
                self.load_model(&path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Back to the starting position with an empty move list.
    pub fn new_game(&mut self) {
        self.game = Game::new();
        self.moves.clear();
    }

    /// Set the position from a FEN (`None` = start position) and a list
    /// of UCI moves.
    ///
    /// An invalid FEN is an error. An illegal move is not: it is logged and
    /// it and all later moves are dropped.
    pub fn set_position(&mut self, fen: Option<&str>, moves: &[&str]) -> Result<(), EngineError> {
        let mut game = match fen {
            Some(fen) => Game::from_fen(fen)?,
            None => Game::new(),
        };

        let mut applied = Vec::with_capacity(moves.len());
        for (i, text) in moves.iter().enumerate() {
            if let Err(e) = game.play_uci(text) {
                warn!(
                    mv = %text,
                    error = %e,
                    dropped = moves.len() - i,
                    "Invalid move in position; truncating move list"
                );
                break;
            }
            applied.push((*text).to_string());
        }

        debug!(fen = %game.fen(), moves = applied.len(), "Position set");
        self.game = game;
        self.moves = applied;
        Ok(())
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Moves applied since the position's FEN, in protocol notation.
    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    /// Play `mv` in the current game and append it to the move list.
    pub fn play_move(&mut self, mv: Move) -> Result<(), EngineError> {
        let uci = move_to_uci(self.game.board(), mv);
        self.game.play(mv)?;
        self.moves.push(uci);
        Ok(())
    }

    /// Choose a move for the current position.
    ///
    /// Runs the tree search when enabled; otherwise plays the policy's
    /// favourite move.
    pub fn best_move(&self, limits: &SearchLimits) -> Result<EngineMove, EngineError> {
        let evaluator = self.evaluator.as_deref().ok_or(EngineError::NotInitialized)?;

        if self.config.use_search {
            let search = UctSearch::new(evaluator, &self.config.search);
            let outcome = search.run(&self.game, limits)?;
            return Ok(EngineMove {
                mv: outcome.best_move,
                uci: move_to_uci(self.game.board(), outcome.best_move),
                search: Some(outcome),
            });
        }

        let planes = encode_position(self.game.board())?;
        let output = evaluator.evaluate_one(&planes)?;
        let priors = decode_policy(self.game.board(), &output.policy);
        let mv = best_move(&priors).ok_or(SearchError::NoLegalMoves)?;
        Ok(EngineMove {
            mv,
            uci: move_to_uci(self.game.board(), mv),
            search: None,
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
