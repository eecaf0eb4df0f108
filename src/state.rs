use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::artifact::{ensure_artifact, ArtifactSource, FetchOutcome, HttpArtifactSource};
use crate::config::Config;
use crate::predictor::{Predictor, PredictorFactory};
use crate::translate::TranslationTable;

/// Read-only state shared by every request. Built completely before
/// the listener is bound.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub predictor: Arc<dyn Predictor>,
    pub translations: Arc<TranslationTable>,
}

impl AppState {
    /// Fetch artifacts, load the model, then load the translation table.
    pub async fn new(config: Config) -> Result<Self> {
        let model_config = &config.model_config;
        let source = HttpArtifactSource::new(Duration::from_secs(model_config.download_timeout_secs))?;
        fetch_artifacts(&source, &config).await?;

        let predictor = {
            let model_config = model_config.clone();
            tokio::task::spawn_blocking(move || PredictorFactory::create(&model_config))
                .await
                .context("Model loading task panicked")??
        };
        info!(model = %predictor.describe(), "Loaded model");

        let translation_config = &config.translation_config;
        let translations = TranslationTable::load(
            Path::new(&translation_config.table_path),
            &translation_config.source_column,
            &translation_config.target_column,
        )
        .with_context(|| format!("Failed to load translation table {}", translation_config.table_path))?;
        info!(
            path = %translation_config.table_path,
            entries = translations.len(),
            "Loaded translation table"
        );

        Self::from_parts(config, predictor, translations)
    }

    /// Assemble state from already-loaded parts, checking that every
    /// model label can be translated.
    pub fn from_parts(
        config: Config,
        predictor: Arc<dyn Predictor>,
        translations: TranslationTable,
    ) -> Result<Self> {
        if translations.is_empty() {
            anyhow::bail!("Translation table is empty");
        }

        let missing = translations.missing_labels(predictor.labels());
        if !missing.is_empty() {
            let sample: Vec<&str> = missing.iter().take(10).copied().collect();
            if config.translation_config.strict_coverage {
                anyhow::bail!(
                    "{} of {} model labels have no translation, e.g. {:?}",
                    missing.len(),
                    predictor.labels().len(),
                    sample
                );
            }
            warn!(
                missing = missing.len(),
                labels = predictor.labels().len(),
                sample = ?sample,
                "Some model labels have no translation; those predictions will fail"
            );
        }

        Ok(Self {
            config: Arc::new(config),
            predictor,
            translations: Arc::new(translations),
        })
    }
}

/// Download the model (and labels, when a URL is configured) if absent.
pub async fn fetch_artifacts(source: &dyn ArtifactSource, config: &Config) -> Result<()> {
    let model_config = &config.model_config;

    let mut wanted = vec![(model_config.model_url.as_str(), model_config.model_path())];
    if let Some(labels_url) = &model_config.labels_url {
        wanted.push((labels_url.as_str(), model_config.labels_path()));
    }

    for (url, dest) in wanted {
        let outcome = ensure_artifact(source, url, &dest)
            .await
            .with_context(|| format!("Failed to fetch {} into {}", url, dest.display()))?;
        match outcome {
            FetchOutcome::AlreadyPresent => info!(path = %dest.display(), "Using existing artifact"),
            FetchOutcome::Downloaded { bytes } => info!(path = %dest.display(), bytes, "Fetched artifact"),
        }
    }

    Ok(())
}
