use crate::model::ConfigError;
use crate::normalizer::TickerAliases;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Dataset files tried in order; the first existing one is used.
    #[serde(default = "default_dataset_paths")]
    pub dataset_paths: Vec<PathBuf>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    /// Raw ticker → display ticker.
    #[serde(default = "default_ticker_aliases")]
    pub ticker_aliases: BTreeMap<String, String>,
}

impl AppConfig {
    pub fn aliases(&self) -> TickerAliases {
        TickerAliases::new(self.ticker_aliases.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset_paths: default_dataset_paths(),
            output_path: default_output_path(),
            ticker_aliases: default_ticker_aliases(),
        }
    }
}

fn default_dataset_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("public/data/complete_historical_baseline.json"),
        PathBuf::from("public/data/historical_baseline.json"),
    ]
}

fn default_output_path() -> PathBuf {
    PathBuf::from("public/data/correlation_analysis.json")
}

fn default_ticker_aliases() -> BTreeMap<String, String> {
    // VAPE now trades as BNC
    BTreeMap::from([("VAPE".to_string(), "BNC".to_string())])
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Like [`load_config`], but an absent file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        other => other,
    }
}
