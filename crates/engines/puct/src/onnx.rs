//! ONNX model loading and inference with tract.
//!
//! The model takes `[1, 112, 8, 8]` float planes and exposes a policy output
//! (name containing `policy`) plus either a scalar value output (`value`)
//! or a win/draw/loss output (`wdl`). Which value head is used is decided
//! once from the output names when the model is loaded.

use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use crate::evaluator::{Evaluator, EvaluatorError, NetworkOutput, ValueSchema};
use crate::planes::{EncodedPosition, NUM_PLANES};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Evaluator backed by an optimised tract plan.
pub struct OnnxEvaluator {
    plan: OnnxPlan,
    schema: ValueSchema,
    policy_output: usize,
    value_output: usize,
}

impl std::fmt::Debug for OnnxEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEvaluator")
            .field("schema", &self.schema)
            .field("policy_output", &self.policy_output)
            .field("value_output", &self.value_output)
            .finish_non_exhaustive()
    }
}

fn model_error(context: &str, e: impl std::fmt::Display) -> EvaluatorError {
    EvaluatorError::ModelError(format!("{context}: {e}"))
}

fn find_output(names: &[String], needle: &str) -> Result<usize, EvaluatorError> {
    names
        .iter()
        .position(|name| name.to_ascii_lowercase().contains(needle))
        .ok_or_else(|| {
            EvaluatorError::ModelError(format!("no output named like `{needle}` in {names:?}"))
        })
}

impl OnnxEvaluator {
    /// Load an ONNX model from the given path.
    pub fn load(path: &Path) -> Result<Self, EvaluatorError> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| model_error("Failed to load ONNX model", e))?;

        let names: Vec<String> = model
            .output_outlets()
            .map_err(|e| model_error("Failed to read model outputs", e))?
            .iter()
            .map(|outlet| {
                model
                    .outlet_label(*outlet)
                    .map(str::to_string)
                    .unwrap_or_else(|| model.node(outlet.node).name.clone())
            })
            .collect();

        let schema = ValueSchema::from_output_names(&names);
        let policy_output = find_output(&names, "policy")?;
        let value_output = match schema {
            ValueSchema::Wdl => find_output(&names, "wdl")?,
            ValueSchema::Legacy => find_output(&names, "value")?,
        };

        let plan = model
            .with_input_fact(0, f32::fact([1, NUM_PLANES, 8, 8]).into())
            .map_err(|e| model_error("Failed to set input shape", e))?
            .into_optimized()
            .map_err(|e| model_error("Failed to optimize model", e))?
            .into_runnable()
            .map_err(|e| model_error("Failed to make model runnable", e))?;

        info!(
            path = %path.display(),
            ?schema,
            outputs = ?names,
            "Loaded ONNX model"
        );

        Ok(Self {
            plan,
            schema,
            policy_output,
            value_output,
        })
    }

    fn run_one(&self, position: &EncodedPosition) -> Result<NetworkOutput, EvaluatorError> {
        let input: Tensor = tract_ndarray::Array4::from_shape_vec(
            (1, NUM_PLANES, 8, 8),
            position.as_slice().to_vec(),
        )
        .map_err(|e| EvaluatorError::EvaluationFailed(e.to_string()))?
        .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| EvaluatorError::EvaluationFailed(e.to_string()))?;

        let read = |index: usize| -> Result<Vec<f32>, EvaluatorError> {
            let output = outputs.get(index).ok_or_else(|| {
                EvaluatorError::MalformedOutput(format!("missing output {index}"))
            })?;
            let view = output
                .to_array_view::<f32>()
                .map_err(|e| EvaluatorError::MalformedOutput(e.to_string()))?;
            Ok(view.iter().copied().collect())
        };

        Ok(NetworkOutput {
            policy: read(self.policy_output)?,
            value: read(self.value_output)?,
        })
    }
}

impl Evaluator for OnnxEvaluator {
    fn schema(&self) -> ValueSchema {
        self.schema
    }

    fn evaluate(&self, batch: &[EncodedPosition]) -> Result<Vec<NetworkOutput>, EvaluatorError> {
        batch.iter().map(|position| self.run_one(position)).collect()
    }
}
