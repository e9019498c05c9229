use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,

    /// Code copied from the browser title bar on a previous run.
    #[serde(default)]
    pub code: String,

    /// Online access never receives a refresh token.
    #[serde(default)]
    pub online: bool,

    #[serde(default)]
    pub token_cache_file: Option<PathBuf>,

    #[serde(default)]
    pub capture_timeout_seconds: Option<u64>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("PICAGO_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        Self::load(Path::new(&config_path))
    }

    /// Read an optional config file, overlaid with `PICAGO_*` environment variables.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("PICAGO")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("client_id is required".to_string());
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required".to_string());
        }
        if self.capture_timeout_seconds == Some(0) {
            return Err("capture_timeout_seconds must be positive".to_string());
        }
        Ok(())
    }

    pub fn capture_timeout(&self) -> Option<Duration> {
        self.capture_timeout_seconds.map(Duration::from_secs)
    }
}
