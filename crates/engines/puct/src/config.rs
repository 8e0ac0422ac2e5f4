//! Search and engine configuration.
//!
//! Both structs deserialize from TOML with every field optional:
//!
//! ```toml
//! model_path = "models/maia9.onnx"
//! use_search = true
//! num_simulations = 800
//!
//! [search]
//! c_puct = 3.1
//! value_perspective = "white"
//! wdl_value = "win_minus_loss"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::EngineError;

/// Orientation of the value a network reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePerspective {
    /// Scalar values are from White's point of view and WDL triples are
    /// oriented for White; Black-to-move results are flipped.
    #[default]
    White,
    /// Values already describe the side to move.
    SideToMove,
}

/// How a win/draw/loss triple is collapsed into the scalar used for backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WdlValueMode {
    #[default]
    WinMinusLoss,
    WinOnly,
}

/// Parameters of the PUCT search itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Exploration constant. Higher values favour high-prior, low-visit
    /// children over children with a good mean value.
    pub c_puct: f32,

    /// Initial value sum of a fresh child below the root (first-play urgency).
    pub fpu: f32,

    /// Initial value sum of a fresh child of the root.
    pub fpu_root: f32,

    /// Factor applied to the visit count of a root move that walks into, or
    /// lets the opponent force, a threefold repetition.
    pub repetition_penalty: f32,

    pub value_perspective: ValuePerspective,

    pub wdl_value: WdlValueMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            c_puct: 3.1,
            fpu: -1.0,
            fpu_root: 0.0,
            repetition_penalty: 0.1,
            value_perspective: ValuePerspective::White,
            wdl_value: WdlValueMode::WinMinusLoss,
        }
    }
}

impl SearchConfig {
    /// Builder-style method to set the exploration constant.
    pub fn with_c_puct(mut self, c_puct: f32) -> Self {
        self.c_puct = c_puct;
        self
    }

    /// Builder-style method to set both first-play urgency values.
    pub fn with_fpu(mut self, fpu: f32, fpu_root: f32) -> Self {
        self.fpu = fpu;
        self.fpu_root = fpu_root;
        self
    }

    pub fn with_repetition_penalty(mut self, penalty: f32) -> Self {
        self.repetition_penalty = penalty;
        self
    }

    pub fn with_value_perspective(mut self, perspective: ValuePerspective) -> Self {
        self.value_perspective = perspective;
        self
    }

    pub fn with_wdl_value(mut self, mode: WdlValueMode) -> Self {
        self.wdl_value = mode;
        self
    }
}

/// Engine-wide settings: model location, search toggle and budgets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ONNX model loaded on `isready` when no evaluator is set yet.
    pub model_path: Option<PathBuf>,

    /// When false, moves come straight from the policy head.
    pub use_search: bool,

    /// Simulations for a `go` without any limits.
    pub num_simulations: u32,

    /// Simulation cap when the clock decides when to stop.
    pub max_simulations: u32,

    pub search: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            use_search: true,
            num_simulations: 800,
            max_simulations: 1_000_000,
            search: SearchConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn with_search_enabled(mut self, use_search: bool) -> Self {
        self.use_search = use_search;
        self
    }

    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.num_simulations = simulations;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}
