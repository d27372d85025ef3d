use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::paths;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub follow: FollowConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    pub path: Option<String>,
    pub env_var: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowConfig {
    pub poll_ms: Option<u64>,
}

const DEFAULT_POLL_MS: u64 = 500;

impl Config {
    /// Load config from `path`.
    /// Returns default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config: Config = match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Config::default());
            }
            Err(e) => return Err(e).with_context(|| format!("failed to read {}", path.display())),
        };
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if matches!(self.log.path.as_deref(), Some("")) {
            bail!("failed to parse {}: log.path must not be empty", path.display());
        }
        if matches!(self.log.env_var.as_deref(), Some("")) {
            bail!("failed to parse {}: log.env_var must not be empty", path.display());
        }
        if self.follow.poll_ms == Some(0) {
            bail!("failed to parse {}: follow.poll_ms must be positive", path.display());
        }
        Ok(())
    }

    /// Variable that gates `emit`.
    pub fn env_var(&self) -> &str {
        self.log.env_var.as_deref().unwrap_or(paths::ENV_VAR)
    }

    /// Safety-net poll interval for `follow`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.follow.poll_ms.unwrap_or(DEFAULT_POLL_MS))
    }
}
