//! Session configuration loaded with figment.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `taskboard.toml` in the working directory, or an explicit file
//! 3. Environment variables prefixed `TASKBOARD_` (e.g. `TASKBOARD_API_TOKEN`)

use crate::error::{Result, TaskboardError};
use crate::storage::StorageMode;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Default file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "taskboard.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TASKBOARD_";

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Exit animation length before a removed card or column disappears
pub const DEFAULT_EXIT_DELAY_MS: u64 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the REST API
    pub api_url: String,
    /// Bearer token; its presence selects the REST backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Directory holding the guest document
    pub data_dir: PathBuf,
    pub exit_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            data_dir: default_data_dir(),
            exit_delay_ms: DEFAULT_EXIT_DELAY_MS,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("taskboard"))
        .unwrap_or_else(|| PathBuf::from(".taskboard"))
}

impl Config {
    /// Load from defaults, a config file and the environment.
    ///
    /// With `path = None` the file is `taskboard.toml` in the working
    /// directory and may be absent. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(TaskboardError::invalid_value(
                        "config",
                        format!("no such file: {}", path.display()),
                    ));
                }
                path.to_path_buf()
            }
            None => PathBuf::from(CONFIG_FILE_NAME),
        };
        debug!(file = %file.display(), "loading configuration");

        let config: Config = Self::figment(&file).extract()?;
        if config.api_url.trim().is_empty() {
            return Err(TaskboardError::missing_field("api_url"));
        }
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Guest mode without a token
    pub fn mode(&self) -> StorageMode {
        match self.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => StorageMode::Remote,
            _ => StorageMode::Local,
        }
    }

    /// Force guest mode regardless of credentials
    pub fn into_local(mut self) -> Self {
        self.api_token = None;
        self
    }

    pub fn exit_delay(&self) -> Duration {
        Duration::from_millis(self.exit_delay_ms)
    }
}
