use std::path::Path;

use image::DynamicImage;
use tract_onnx::prelude::*;

use super::interface::{top_prediction, PredictError, Prediction, Predictor};
use super::preprocess::{image_to_tensor, Normalization};
use crate::utils::encoding::decode_with_guess_encoding;

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// ONNX classifier executed by tract. The optimized plan only needs
/// `&self` to run, so one instance serves every request.
pub struct PredictorTractOnnx {
    plan: Plan,
    labels: Vec<String>,
    input_size: u32,
    norm: Normalization,
}

impl PredictorTractOnnx {
    pub fn load(
        model_path: &Path,
        labels_path: &Path,
        input_size: u32,
        norm: Normalization,
    ) -> Result<Self, PredictError> {
        let labels = read_labels(labels_path)?;

        let load_error = |e: TractError| PredictError::Load {
            path: model_path.display().to_string(),
            message: format!("{:#}", e),
        };
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(load_error)?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(load_error)?
            .into_optimized()
            .map_err(load_error)?
            .into_runnable()
            .map_err(load_error)?;

        Ok(Self {
            plan,
            labels,
            input_size,
            norm,
        })
    }
}

impl Predictor for PredictorTractOnnx {
    fn predict(&self, image: &DynamicImage) -> Result<Prediction, PredictError> {
        let input = image_to_tensor(image, self.input_size, self.norm);
        let outputs = self
            .plan
            .run(tvec!(input.into_tvalue()))
            .map_err(|e| PredictError::Inference(format!("{:#}", e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| PredictError::Inference("model returned no outputs".to_string()))?;
        let scores = output
            .to_array_view::<f32>()
            .map_err(|e| PredictError::Inference(format!("{:#}", e)))?;
        let scores: Vec<f32> = scores.iter().copied().collect();

        top_prediction(&scores, &self.labels)
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn describe(&self) -> String {
        format!(
            "tract-onnx classifier, {} classes, {}x{} input",
            self.labels.len(),
            self.input_size,
            self.input_size
        )
    }
}

/// One label per line, in model output order. Blank lines are skipped.
pub fn read_labels(path: &Path) -> Result<Vec<String>, PredictError> {
    let labels_error = |message: String| PredictError::Labels {
        path: path.display().to_string(),
        message,
    };

    let bytes = std::fs::read(path).map_err(|e| labels_error(e.to_string()))?;
    let labels: Vec<String> = decode_with_guess_encoding(&bytes)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        return Err(labels_error("no labels found".to_string()));
    }
    Ok(labels)
}
