use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Somewhere a model artifact can be downloaded from.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetch the full body behind `url`. Only success statuses count.
    async fn download(&self, url: &str) -> Result<Bytes, FetchError>;
}
