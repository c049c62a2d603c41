//! Application configuration.
//!
//! Stored as YAML in `~/.fcp/config.yaml`.

use std::path::{Path, PathBuf};

use fcp_analysis::AnalysisConfig;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".fcp";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Persistent settings of the `fcp` tool.
///
/// Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis parameters.
    pub analysis: AnalysisConfig,

    /// Input device name; the host default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,

    /// Output device name; the host default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,

    /// Format of reports written by `analyze`.
    pub output_format: OutputFormat,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

impl AppConfig {
    /// Gets the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to its file.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Sets or clears the input device and saves.
    pub fn set_input_device(&mut self, name: Option<String>) -> anyhow::Result<()> {
        self.input_device = name.filter(|n| !n.is_empty());
        self.save()
    }

    /// Sets or clears the output device and saves.
    pub fn set_output_device(&mut self, name: Option<String>) -> anyhow::Result<()> {
        self.output_device = name.filter(|n| !n.is_empty());
        self.save()
    }

    /// Restores the defaults, keeping the file location, and saves.
    pub fn reset(&mut self) -> anyhow::Result<()> {
        let path = std::mem::take(&mut self.config_path);
        *self = Self {
            config_path: path,
            ..Self::default()
        };
        self.save()
    }
}

/// Loads the configuration, creating the file with defaults if missing.
///
/// `custom_path` overrides `~/.fcp/config.yaml`. The analysis section is
/// validated so a bad file fails here rather than mid-session.
pub fn load_config(custom_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config_path = match custom_path {
        Some(p) => p.to_path_buf(),
        None => AppConfig::default_config_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        let cfg: AppConfig = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parse {}: {}", config_path.display(), e))?;
        cfg
    } else {
        AppConfig::default()
    };
    cfg.config_path = config_path;

    if !cfg.config_path.exists() {
        cfg.save()?;
    }
    cfg.analysis
        .validate()
        .map_err(|e| anyhow::anyhow!("{}: {}", cfg.config_path.display(), e))?;

    Ok(cfg)
}
