use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use regex::Regex;

/// Default location of the exported classifier.
pub const DEFAULT_MODEL_URL: &str =
    "https://storage.googleapis.com/swift-district-235306.appspot.com/pokedex/models/export.onnx";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_config: ServerConfig,
    #[serde(default)]
    pub model_config: ModelConfig,
    #[serde(default)]
    pub translation_config: TranslationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub index_path: String,
    pub static_dir: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model_url: String,
    pub model_dir: String,
    pub model_file_name: String,
    /// When unset the labels file must already be next to the model.
    pub labels_url: Option<String>,
    pub labels_file_name: String,
    pub input_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub download_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub table_path: String,
    pub source_column: String,
    pub target_column: String,
    /// Refuse to start when a model label has no translation.
    pub strict_coverage: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            index_path: "app/view/index.html".to_string(),
            static_dir: "app/static".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_dir: "app/models".to_string(),
            model_file_name: "export.onnx".to_string(),
            labels_url: None,
            labels_file_name: "classes.txt".to_string(),
            input_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            download_timeout_secs: 300,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            table_path: "app/models/pokemon_stat.csv".to_string(),
            source_column: "English".to_string(),
            target_column: "Simplified Chinese".to_string(),
            strict_coverage: false,
        }
    }
}

impl ModelConfig {
    pub fn model_path(&self) -> PathBuf {
        Path::new(&self.model_dir).join(&self.model_file_name)
    }

    pub fn labels_path(&self) -> PathBuf {
        Path::new(&self.model_dir).join(&self.labels_file_name)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let content = substitute_env_vars(&content);

        // Determine file type by extension
        let path_lower = path.to_lowercase();
        let config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(config)
    }
}

/// Replace `${VAR_NAME}` placeholders with values from the environment.
/// Unknown variables are left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("placeholder pattern is valid");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(String),
    Defaults,
}

/// Load configuration from `$CONFIG_PATH`, then `conf.yaml`, then `conf.json`.
/// Falls back to built-in defaults when none of the candidates exist.
pub fn load_config() -> Result<(Config, ConfigSource)> {
    if let Ok(explicit) = std::env::var("CONFIG_PATH") {
        let config = Config::load(&explicit)
            .with_context(|| format!("Failed to load config from CONFIG_PATH={}", explicit))?;
        return Ok((config, ConfigSource::File(explicit)));
    }

    for candidate in ["conf.yaml", "conf.json"] {
        if Path::new(candidate).exists() {
            let config = Config::load(candidate)
                .with_context(|| format!("Failed to load config from {}", candidate))?;
            return Ok((config, ConfigSource::File(candidate.to_string())));
        }
        tracing::debug!("No config at {}", candidate);
    }

    Ok((Config::default(), ConfigSource::Defaults))
}
