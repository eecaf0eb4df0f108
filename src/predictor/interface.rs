use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("failed to load model {path}: {message}")]
    Load { path: String, message: String },
    #[error("failed to read labels {path}: {message}")]
    Labels { path: String, message: String },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model produced {got} scores for {expected} labels")]
    OutputShape { expected: usize, got: usize },
}

/// Winning class for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// A loaded classifier. Implementations must be safe to call from
/// several threads at once; the server does not serialize calls.
pub trait Predictor: Send + Sync {
    fn predict(&self, image: &DynamicImage) -> Result<Prediction, PredictError>;

    /// Every label `predict` can return.
    fn labels(&self) -> &[String];

    /// Short human-readable summary for startup logs.
    fn describe(&self) -> String;
}

/// Pick the highest score and turn it into a softmax confidence.
pub fn top_prediction(scores: &[f32], labels: &[String]) -> Result<Prediction, PredictError> {
    if scores.len() != labels.len() {
        return Err(PredictError::OutputShape {
            expected: labels.len(),
            got: scores.len(),
        });
    }

    let (best, best_score) = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| s.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| PredictError::Inference("model produced no finite scores".to_string()))?;

    let denom: f32 = scores
        .iter()
        .filter(|s| s.is_finite())
        .map(|s| (s - best_score).exp())
        .sum();

    Ok(Prediction {
        label: labels[best].clone(),
        confidence: 1.0 / denom,
    })
}
