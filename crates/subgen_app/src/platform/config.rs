use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use subgen_engine::{EngineConfig, PollSettings, ServiceSettings};
use subgen_logging::subgen_info;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "subgen.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Client settings, read from a RON file. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// `None` keeps polling until the job finishes.
    pub max_poll_duration_secs: Option<u64>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub max_download_bytes: u64,
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 2000,
            max_poll_duration_secs: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            upload_timeout_secs: 600,
            max_download_bytes: 10 * 1024 * 1024,
            output_dir: PathBuf::from("subtitles"),
        }
    }
}

impl ClientConfig {
    /// Reads `explicit` if given, else `./subgen.ron` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::from_ron(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.clone(),
                source,
            },
            other => other,
        })?;
        subgen_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Command-line flags win over the file.
    pub fn with_overrides(mut self, server: Option<String>, output_dir: Option<PathBuf>) -> Self {
        if let Some(server) = server {
            self.base_url = server;
        }
        if let Some(output_dir) = output_dir {
            self.output_dir = output_dir;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.max_poll_duration_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "max_poll_duration_secs must be positive when set".into(),
            ));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            service: ServiceSettings {
                base_url: self.base_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                upload_timeout: Duration::from_secs(self.upload_timeout_secs),
                max_download_bytes: self.max_download_bytes,
            },
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_duration: self.max_poll_duration_secs.map(Duration::from_secs),
            },
            output_dir: self.output_dir.clone(),
        }
    }
}
