use image::DynamicImage;

use super::interface::{PredictError, Prediction, Predictor};

/// Classifies by dominant colour: red, green and blue images map to
/// the first, second and third label. Black images fail.
pub struct PredictorFake {
    labels: Vec<String>,
}

impl PredictorFake {
    pub fn new(labels: &[&str]) -> Self {
        assert!(labels.len() >= 3, "fake predictor needs three labels");
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl Predictor for PredictorFake {
    fn predict(&self, image: &DynamicImage) -> Result<Prediction, PredictError> {
        let rgb = image.to_rgb8();
        let mut totals = [0u64; 3];
        for pixel in rgb.pixels() {
            for (total, value) in totals.iter_mut().zip(pixel.0) {
                *total += value as u64;
            }
        }

        if totals.iter().all(|t| *t == 0) {
            return Err(PredictError::Inference("image is blank".to_string()));
        }

        let (channel, _) = totals
            .iter()
            .enumerate()
            .max_by_key(|(_, t)| **t)
            .unwrap_or((0, &0));

        Ok(Prediction {
            label: self.labels[channel].clone(),
            confidence: 0.9,
        })
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn describe(&self) -> String {
        format!("fake classifier, {} classes", self.labels.len())
    }
}
