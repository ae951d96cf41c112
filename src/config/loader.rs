use std::env;
use std::path::Path;

use tokio::fs;
use tracing::{info, warn};

use crate::types::StatusError;

use super::{paths, Config};

pub(super) const BACKEND_URL_ENV: &str = "ARGOCD_BACKEND_URL";

impl Config {
    /// Load configuration from config.json
    /// Falls back to defaults if the file doesn't exist or can't be parsed
    pub async fn load() -> Self {
        let config_path = paths::get_config_path();
        let mut config = match Self::load_from(&config_path).await {
            Ok(config) => {
                info!(
                    backend = %config.backend_url_pattern,
                    proxy_path = %config.proxy_path(),
                    "Loaded configuration"
                );
                config
            }
            Err(err) => {
                warn!(error = ?err, "Failed to load config.json, using defaults");
                Self::default()
            }
        };

        if let Ok(custom) = env::var(BACKEND_URL_ENV) {
            let trimmed = custom.trim();
            if !trimmed.is_empty() {
                config.backend_url_pattern = trimmed.to_string();
            }
        }

        config
    }

    /// Read one config file. A missing file yields the defaults.
    pub async fn load_from(config_path: &Path) -> Result<Self, StatusError> {
        if !config_path.exists() {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path).await.map_err(|err| {
            StatusError::Configuration(format!("Failed to read config file: {err}"))
        })?;

        serde_json::from_str(&contents).map_err(|err| {
            StatusError::Configuration(format!("Failed to parse config.json: {err}"))
        })
    }
}
