pub mod factory;
pub mod preprocess;
pub mod impl_tract_onnx;
pub mod interface;

#[cfg(test)]
pub mod impl_fake;

pub use factory::PredictorFactory;
pub use interface::{PredictError, Predictor};
