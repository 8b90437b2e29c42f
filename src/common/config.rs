use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::paths::HostPaths;
use crate::progress::Verbosity;

/// Global LazyMaint configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Target size for temp/thumbnails during a manual soft clean, in MB
    #[serde(default = "default_soft_budget_mb")]
    pub soft_clean_budget_mb: u64,

    /// Target size for temp/thumbnails during an automatic clean, in MB
    #[serde(default = "default_auto_budget_mb")]
    pub auto_clean_budget_mb: u64,

    /// How chatty progress reporting should be
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Kodi home directory (defaults to ~/.kodi)
    #[serde(default)]
    pub kodi_home: Option<PathBuf>,

    /// Addon folder that fresh start must leave in place
    #[serde(default = "default_addon_id")]
    pub addon_id: String,

    /// Where backups go when no destination is given
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    /// Write tracing output to this file as well
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_soft_budget_mb() -> u64 {
    5
}
fn default_auto_budget_mb() -> u64 {
    50
}
fn default_addon_id() -> String {
    "script.lazymaintenance".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            soft_clean_budget_mb: default_soft_budget_mb(),
            auto_clean_budget_mb: default_auto_budget_mb(),
            verbosity: Verbosity::default(),
            kodi_home: None,
            addon_id: default_addon_id(),
            backup_dir: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Get the LazyMaint data directory (~/.lazymaint)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".lazymaint")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Update a single key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "soft_clean_budget_mb" => self.soft_clean_budget_mb = value.parse()?,
            "auto_clean_budget_mb" => self.auto_clean_budget_mb = value.parse()?,
            "verbosity" => {
                self.verbosity = match value {
                    "silent" => Verbosity::Silent,
                    "normal" => Verbosity::Normal,
                    _ => anyhow::bail!("Invalid verbosity '{}': use silent or normal", value),
                }
            }
            "kodi_home" => self.kodi_home = optional_path(value),
            "addon_id" => self.addon_id = value.to_string(),
            "backup_dir" => self.backup_dir = optional_path(value),
            "log_file" => self.log_file = optional_path(value),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    pub fn soft_clean_budget_bytes(&self) -> u64 {
        mb_to_bytes(self.soft_clean_budget_mb)
    }

    pub fn auto_clean_budget_bytes(&self) -> u64 {
        mb_to_bytes(self.auto_clean_budget_mb)
    }

    /// Resolve the Kodi home directory, falling back to ~/.kodi
    pub fn kodi_home(&self) -> PathBuf {
        self.kodi_home.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".kodi")
        })
    }

    pub fn host_paths(&self) -> HostPaths {
        HostPaths::from_home(self.kodi_home())
    }
}

/// Budget in bytes for a size in MB. Huge values clamp to `u64::MAX`
/// so an oversized budget means "keep everything", never a wrapped tiny one.
pub fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
