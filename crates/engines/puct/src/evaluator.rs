//! Evaluator trait for position evaluation.
//!
//! An evaluator maps encoded positions to a policy vector over the
//! [`POLICY_SIZE`] move index and a value. Networks come in two flavours,
//! told apart once when the model is loaded: a single scalar value, or a
//! win/draw/loss triple.

use chess_core::Color;
use thiserror::Error;

use crate::config::{ValuePerspective, WdlValueMode};
use crate::planes::EncodedPosition;
use crate::policy_map::POLICY_SIZE;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Model error: {0}")]
    ModelError(String),
}

/// Shape of the value head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSchema {
    /// One scalar in [-1, 1].
    Legacy,
    /// Win, draw and loss probabilities.
    Wdl,
}

impl ValueSchema {
    /// Pick the schema from a model's output names: any output whose name
    /// mentions `wdl` means a WDL head.
    pub fn from_output_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let has_wdl = names
            .into_iter()
            .any(|name| name.as_ref().to_ascii_lowercase().contains("wdl"));
        if has_wdl {
            ValueSchema::Wdl
        } else {
            ValueSchema::Legacy
        }
    }
}

/// Raw network output for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkOutput {
    /// Logits over the [`POLICY_SIZE`] move index.
    pub policy: Vec<f32>,
    /// One scalar (legacy) or `[win, draw, loss]`.
    pub value: Vec<f32>,
}

/// Trait for position evaluators.
///
/// Evaluators are shared read-only between searches; implementations with
/// interior state must synchronise it themselves.
pub trait Evaluator: Send + Sync {
    /// Value head layout, fixed for the lifetime of the evaluator.
    fn schema(&self) -> ValueSchema;

    /// Evaluate a batch of positions, returning one output per input.
    fn evaluate(&self, batch: &[EncodedPosition]) -> Result<Vec<NetworkOutput>, EvaluatorError>;

    /// Evaluate a single position.
    fn evaluate_one(&self, position: &EncodedPosition) -> Result<NetworkOutput, EvaluatorError> {
        self.evaluate(std::slice::from_ref(position))?
            .into_iter()
            .next()
            .ok_or_else(|| EvaluatorError::MalformedOutput("empty batch result".to_string()))
    }
}

/// Value of a position for the side to move, ready for backup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f32,
    /// `[win, draw, loss]` for the side to move, when the network has a WDL head.
    pub wdl: Option<[f32; 3]>,
}

/// Read the value head of `output` as seen by `side_to_move`.
pub fn interpret_value(
    output: &NetworkOutput,
    schema: ValueSchema,
    side_to_move: Color,
    perspective: ValuePerspective,
    wdl_mode: WdlValueMode,
) -> Result<Evaluation, EvaluatorError> {
    let flip = perspective == ValuePerspective::White && side_to_move == Color::Black;

    match schema {
        ValueSchema::Legacy => {
            let raw = output.value.first().copied().ok_or_else(|| {
                EvaluatorError::MalformedOutput("value output is empty".to_string())
            })?;
            let value = if flip { -raw } else { raw };
            Ok(Evaluation { value, wdl: None })
        }
        ValueSchema::Wdl => {
            let &[win, draw, loss] = output.value.as_slice() else {
                return Err(EvaluatorError::MalformedOutput(format!(
                    "expected 3 WDL values, got {}",
                    output.value.len()
                )));
            };
            let (win, loss) = if flip { (loss, win) } else { (win, loss) };
            let value = match wdl_mode {
                WdlValueMode::WinMinusLoss => win - loss,
                WdlValueMode::WinOnly => win,
            };
            Ok(Evaluation {
                value,
                wdl: Some([win, draw, loss]),
            })
        }
    }
}

/// Uniform evaluator: zero logits (equal priors after decoding) and a fixed
/// value. Useful for exercising the search without a model.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformEvaluator {
    schema: ValueSchema,
    value: f32,
}

impl Default for UniformEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformEvaluator {
    pub fn new() -> Self {
        Self {
            schema: ValueSchema::Legacy,
            value: 0.0,
        }
    }

    pub fn with_schema(mut self, schema: ValueSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value.clamp(-1.0, 1.0);
        self
    }

    fn value_head(&self) -> Vec<f32> {
        match self.schema {
            ValueSchema::Legacy => vec![self.value],
            ValueSchema::Wdl => {
                let win = self.value.max(0.0);
                let loss = (-self.value).max(0.0);
                vec![win, 1.0 - win - loss, loss]
            }
        }
    }
}

impl Evaluator for UniformEvaluator {
    fn schema(&self) -> ValueSchema {
        self.schema
    }

    fn evaluate(&self, batch: &[EncodedPosition]) -> Result<Vec<NetworkOutput>, EvaluatorError> {
        Ok(batch
            .iter()
            .map(|_| NetworkOutput {
                policy: vec![0.0; POLICY_SIZE],
                value: self.value_head(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planes::encode_position;
    use chess_core::Game;

    fn legacy(v: f32) -> NetworkOutput {
        NetworkOutput {
            policy: Vec::new(),
            value: vec![v],
        }
    }

    fn wdl(w: f32, d: f32, l: f32) -> NetworkOutput {
        NetworkOutput {
            policy: Vec::new(),
            value: vec![w, d, l],
        }
    }

    #[test]
    fn test_schema_from_output_names() {
        assert_eq!(
            ValueSchema::from_output_names(["/output/policy", "/output/wdl"]),
            ValueSchema::Wdl
        );
        assert_eq!(
            ValueSchema::from_output_names(["/output/policy", "/output/value"]),
            ValueSchema::Legacy
        );
        assert_eq!(
            ValueSchema::from_output_names(Vec::<String>::new()),
            ValueSchema::Legacy
        );
    }

    #[test]
    fn test_legacy_value_is_negated_for_black() {
        let out = legacy(0.4);
        let w = interpret_value(
            &out,
            ValueSchema::Legacy,
            Color::White,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        )
        .unwrap();
        let b = interpret_value(
            &out,
            ValueSchema::Legacy,
            Color::Black,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        )
        .unwrap();
        assert!((w.value - 0.4).abs() < 1e-6);
        assert!((b.value + 0.4).abs() < 1e-6);
        assert!(w.wdl.is_none());
    }

    #[test]
    fn test_side_to_move_perspective_keeps_sign() {
        let b = interpret_value(
            &legacy(0.4),
            ValueSchema::Legacy,
            Color::Black,
            ValuePerspective::SideToMove,
            WdlValueMode::WinMinusLoss,
        )
        .unwrap();
        assert!((b.value - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_wdl_swaps_for_black() {
        let out = wdl(0.6, 0.3, 0.1);

        let w = interpret_value(
            &out,
            ValueSchema::Wdl,
            Color::White,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        )
        .unwrap();
        assert!((w.value - 0.5).abs() < 1e-6);
        assert_eq!(w.wdl, Some([0.6, 0.3, 0.1]));

        let b = interpret_value(
            &out,
            ValueSchema::Wdl,
            Color::Black,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        )
        .unwrap();
        assert!((b.value + 0.5).abs() < 1e-6);
        assert_eq!(b.wdl, Some([0.1, 0.3, 0.6]));

        let b_win = interpret_value(
            &out,
            ValueSchema::Wdl,
            Color::Black,
            ValuePerspective::White,
            WdlValueMode::WinOnly,
        )
        .unwrap();
        assert!((b_win.value - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_value_heads() {
        let err = interpret_value(
            &legacy(0.0),
            ValueSchema::Wdl,
            Color::White,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        );
        assert!(matches!(err, Err(EvaluatorError::MalformedOutput(_))));

        let empty = NetworkOutput {
            policy: Vec::new(),
            value: Vec::new(),
        };
        let err = interpret_value(
            &empty,
            ValueSchema::Legacy,
            Color::White,
            ValuePerspective::White,
            WdlValueMode::WinMinusLoss,
        );
        assert!(matches!(err, Err(EvaluatorError::MalformedOutput(_))));
    }

    #[test]
    fn test_uniform_evaluator() {
        let game = Game::new();
        let planes = encode_position(game.board()).unwrap();

        let eval = UniformEvaluator::new();
        let out = eval.evaluate_one(&planes).unwrap();
        assert_eq!(out.policy.len(), POLICY_SIZE);
        assert!(out.policy.iter().all(|&l| l == 0.0));
        assert_eq!(out.value, vec![0.0]);

        let batch = eval.evaluate(&[planes.clone(), planes.clone()]).unwrap();
        assert_eq!(batch.len(), 2);

        let eval = UniformEvaluator::new()
            .with_schema(ValueSchema::Wdl)
            .with_value(0.25);
        assert_eq!(eval.schema(), ValueSchema::Wdl);
        let out = eval.evaluate_one(&planes).unwrap();
        assert_eq!(out.value, vec![0.25, 0.75, 0.0]);
    }
}
