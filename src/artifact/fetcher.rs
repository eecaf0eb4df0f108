use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use super::interface::{ArtifactSource, FetchError};

#[derive(Debug, Clone)]
pub struct HttpArtifactSource {
    client: Client,
}

impl HttpArtifactSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| FetchError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactSource for HttpArtifactSource {
    async fn download(&self, url: &str) -> Result<Bytes, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        response.bytes().await.map_err(request_error)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { bytes: usize },
}

/// Make sure `dest` exists, downloading it from `url` if it does not.
///
/// An existing file is trusted as-is: it is never re-validated or
/// re-downloaded, so a truncated artifact has to be removed by hand.
pub async fn ensure_artifact(
    source: &dyn ArtifactSource,
    url: &str,
    dest: &Path,
) -> Result<FetchOutcome, FetchError> {
    let io_error = |path: &Path| {
        let path = path.display().to_string();
        move |source: std::io::Error| FetchError::Io { path, source }
    };

    // An unreadable path is an error, not a reason to download.
    if tokio::fs::try_exists(dest).await.map_err(io_error(dest))? {
        debug!(path = %dest.display(), "Artifact already present, skipping download");
        return Ok(FetchOutcome::AlreadyPresent);
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }

    info!(url, path = %dest.display(), "Downloading artifact");
    let body = source.download(url).await?;

    // Write beside the destination first so a failed write never leaves
    // a file that the existence check above would accept.
    let partial = partial_path(dest);
    tokio::fs::write(&partial, &body).await.map_err(io_error(&partial))?;
    tokio::fs::rename(&partial, dest).await.map_err(io_error(dest))?;

    Ok(FetchOutcome::Downloaded { bytes: body.len() })
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
