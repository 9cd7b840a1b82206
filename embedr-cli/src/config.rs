use std::path::{Path, PathBuf};
use std::time::Duration;

use embed_resolver::extractor::ExtractorConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, Result};

const CONFIG_DIR: &str = "embedr";
const CONFIG_FILE: &str = "config.toml";

/// Settings persisted in `config.toml`, overridable from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub colored_output: bool,
    pub show_progress: bool,
    pub extractor: ExtractorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            colored_output: true,
            show_progress: true,
            extractor: ExtractorConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    fn resolve_path(custom: Option<&Path>) -> Result<PathBuf> {
        match custom {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path().ok_or(CliError::NoConfigDir),
        }
    }

    /// Loads the configuration, falling back to defaults when no file exists.
    pub fn load(custom: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(custom)?;
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, custom: Option<&Path>) -> Result<PathBuf> {
        let path = Self::resolve_path(custom)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.show()?)?;
        Ok(path)
    }

    /// Overwrites the configuration file with defaults.
    pub fn reset(custom: Option<&Path>) -> Result<PathBuf> {
        Self::default().save(custom)
    }

    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies command-line overrides on top of the file settings.
    pub fn with_overrides(
        mut self,
        timeout_secs: Option<u64>,
        retries: Option<u32>,
        user_agent: Option<String>,
        no_color: bool,
    ) -> Self {
        if let Some(secs) = timeout_secs {
            self.extractor.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = retries {
            self.extractor.max_retries = retries;
        }
        if let Some(user_agent) = user_agent {
            self.extractor.user_agent = user_agent;
        }
        if no_color {
            self.colored_output = false;
        }
        self
    }
}
