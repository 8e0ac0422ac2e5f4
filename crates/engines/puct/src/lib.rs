//! PUCT Chess Engine
//!
//! Monte-Carlo tree search guided by a policy/value network, in the style
//! of AlphaZero and Leela Chess Zero.
//!
//! # Architecture
//!
//! - [`planes`] encodes a position as the 112x8x8 network input
//! - [`policy_map`] / [`policy`] turn the 1858-entry policy output into
//!   priors over the legal moves
//! - [`evaluator`] is the seam to the network (`OnnxEvaluator` with the
//!   `onnx` feature, [`UniformEvaluator`] for tests)
//! - [`tree`] / [`search`] implement the select/expand/backup loop and the
//!   final move choice
//! - [`PuctEngine`] ties it together for the UCI front end
//!
//! # Example
//! ```
//! use chess_core::SearchLimits;
//! use puct_engine::{EngineConfig, PuctEngine, UniformEvaluator};
//!
//! let mut engine = PuctEngine::new(EngineConfig::default());
//! engine.set_evaluator(Box::new(UniformEvaluator::new()));
//! engine.set_position(None, &["e2e4", "e7e5"]).unwrap();
//! let chosen = engine.best_move(&SearchLimits::simulations(50)).unwrap();
//! assert!(engine.game().is_legal(chosen.mv));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod node;
pub mod planes;
pub mod policy;
pub mod policy_map;
pub mod search;
pub mod tree;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use config::{EngineConfig, SearchConfig, ValuePerspective, WdlValueMode};
pub use engine::{EngineMove, PuctEngine};
pub use error::EngineError;
pub use evaluator::{
    interpret_value, Evaluation, Evaluator, EvaluatorError, NetworkOutput, UniformEvaluator,
    ValueSchema,
};
pub use node::{Node, NodeId, NodePosition};
pub use planes::{encode_position, EncodedPosition, INPUT_SHAPE, NUM_PLANES};
pub use policy::{best_move, decode_policy};
pub use policy_map::{policy_index, POLICY_SIZE};
pub use search::{
    select_root_move, RootMoveStats, SearchError, SearchOutcome, SearchStats, UctSearch,
};
pub use tree::SearchTree;

#[cfg(feature = "onnx")]
pub use onnx::OnnxEvaluator;
