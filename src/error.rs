use std::time::Duration;

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::predictor::PredictError;

/// Everything that can go wrong while serving `/analyze`.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("expected a multipart form: {0}")]
    NotMultipart(#[from] MultipartRejection),
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("no `{0}` field in form")]
    MissingField(&'static str),
    #[error("more than one `{0}` field in form")]
    DuplicateField(&'static str),
    #[error("uploaded file is empty")]
    EmptyUpload,
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("label `{0}` has no translation")]
    UnknownLabel(String),
    #[error("inference did not finish within {0:?}")]
    Timeout(Duration),
    #[error("inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AnalyzeError {
    pub fn status(&self) -> StatusCode {
        match self {
            // axum knows when the body limit was hit (413) vs a malformed body
            AnalyzeError::NotMultipart(e) => e.status(),
            AnalyzeError::Multipart(e) => e.status(),
            AnalyzeError::MissingField(_)
            | AnalyzeError::DuplicateField(_)
            | AnalyzeError::EmptyUpload
            | AnalyzeError::Decode(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AnalyzeError::Predict(_) | AnalyzeError::UnknownLabel(_) | AnalyzeError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.status() {
            StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
            StatusCode::GATEWAY_TIMEOUT => "timeout",
            status if status.is_client_error() => "bad_request",
            _ => "inference_error",
        }
    }
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        if status.is_server_error() {
            error!(kind = self.kind(), error = %message, "Analyze failed");
        } else {
            warn!(kind = self.kind(), error = %message, "Rejected analyze request");
        }

        (
            status,
            Json(json!({
                "error": message,
                "kind": self.kind(),
            })),
        )
            .into_response()
    }
}
