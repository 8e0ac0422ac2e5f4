//! Engine-level errors.

use std::path::PathBuf;

use chess_core::RulesError;
use thiserror::Error;

use crate::evaluator::EvaluatorError;
use crate::search::SearchError;

/// Errors surfaced by [`crate::PuctEngine`] to its caller.
///
/// Only precondition and setup failures end up here. Evaluator failures
/// inside the search loop are absorbed by the search itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not initialized: no evaluator loaded")]
    NotInitialized,

    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluatorError),

    #[error("invalid position: {0}")]
    InvalidPosition(#[from] RulesError),

    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Search(#[from] SearchError),
}
