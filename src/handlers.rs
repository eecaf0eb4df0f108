use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::AnalyzeError;
use crate::state::AppState;

/// Multipart field carrying the uploaded image.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub result: String,
}

pub async fn index(State(state): State<AppState>) -> Result<Html<Vec<u8>>, (StatusCode, Json<Value>)> {
    let path = &state.config.server_config.index_path;
    match tokio::fs::read(path).await {
        Ok(body) => Ok(Html(body)),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read index page");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "index page unavailable"})),
            ))
        }
    }
}

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let started = Instant::now();
    let upload = read_upload(&mut multipart?).await?;

    // Decoding and inference are CPU-bound; keep them off the async workers.
    let predictor = state.predictor.clone();
    let timeout = Duration::from_secs(state.config.server_config.request_timeout_secs);
    let task = tokio::task::spawn_blocking(move || {
        let image = image::load_from_memory(&upload)?;
        Ok::<_, AnalyzeError>(predictor.predict(&image)?)
    });
    let prediction = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| AnalyzeError::Timeout(timeout))???;

    let result = state
        .translations
        .display(&prediction.label)
        .ok_or_else(|| AnalyzeError::UnknownLabel(prediction.label.clone()))?;

    info!(
        label = %prediction.label,
        translated = state.translations.get(&prediction.label).unwrap_or_default(),
        confidence = prediction.confidence,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Analyze result"
    );

    Ok(Json(AnalyzeResponse { result }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Bytes, AnalyzeError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if upload.is_some() {
            return Err(AnalyzeError::DuplicateField(UPLOAD_FIELD));
        }
        upload = Some(field.bytes().await?);
    }

    let data = upload.ok_or(AnalyzeError::MissingField(UPLOAD_FIELD))?;
    if data.is_empty() {
        return Err(AnalyzeError::EmptyUpload);
    }
    Ok(data)
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "labels": state.predictor.labels().len(),
        "translations": state.translations.len(),
    }))
}
