use std::sync::Arc;
use anyhow::{Context, Result};
use tracing::info;

use crate::config::ModelConfig;
use super::impl_tract_onnx::PredictorTractOnnx;
use super::interface::Predictor;
use super::preprocess::Normalization;

/// Builds the process-wide predictor from artifacts already on disk.
pub struct PredictorFactory;

impl PredictorFactory {
    pub fn create(model_config: &ModelConfig) -> Result<Arc<dyn Predictor>> {
        let model_path = model_config.model_path();
        let labels_path = model_config.labels_path();
        info!(model = %model_path.display(), labels = %labels_path.display(), "Loading model");

        if model_config.input_size == 0 {
            anyhow::bail!("model_config.input_size must be positive");
        }
        if model_config.std.iter().any(|s| *s == 0.0) {
            anyhow::bail!("model_config.std must not contain zeros");
        }

        let norm = Normalization {
            mean: model_config.mean,
            std: model_config.std,
        };
        let predictor = PredictorTractOnnx::load(&model_path, &labels_path, model_config.input_size, norm)
            .with_context(|| format!("Failed to load model from {}", model_config.model_dir))?;

        Ok(Arc::new(predictor))
    }
}
