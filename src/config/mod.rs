use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    allocation::AllocatorSettings,
    errors::{Result, SettlementError},
    history::DEFAULT_HISTORY_CAPACITY,
    storage::json_backend::{tmp_path, write_atomic},
    utils::{app_data_dir, ensure_dir},
};

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const EXPORT_DIR: &str = "exports";

/// User preferences for the settlement shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Roster used when none has been stored yet.
    #[serde(default = "Config::default_units_value")]
    pub default_units: Vec<String>,
    #[serde(default = "Config::default_currency_label")]
    pub currency_label: String,
    #[serde(default = "Config::default_grouping_separator")]
    pub grouping_separator: char,
    #[serde(default)]
    pub allocator: AllocatorSettings,
    #[serde(default = "Config::default_history_capacity")]
    pub history_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_units: Self::default_units_value(),
            currency_label: Self::default_currency_label(),
            grouping_separator: Self::default_grouping_separator(),
            allocator: AllocatorSettings::default(),
            history_capacity: Self::default_history_capacity(),
            export_dir: None,
        }
    }
}

impl Config {
    pub fn default_units_value() -> Vec<String> {
        vec!["301호".into(), "302호".into()]
    }

    pub fn default_currency_label() -> String {
        "원".into()
    }

    pub fn default_grouping_separator() -> char {
        ','
    }

    pub fn default_history_capacity() -> usize {
        DEFAULT_HISTORY_CAPACITY
    }

    pub fn resolve_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| app_data_dir().join(EXPORT_DIR))
    }
}

/// Loads and saves [`Config`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        let config_dir = base.join(CONFIG_DIR);
        ensure_dir(&config_dir)?;
        Ok(Self::new(config_dir.join(CONFIG_FILE)))
    }

    pub fn new_default() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored configuration, or the defaults when none exists.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            SettlementError::Config(format!("{}: {}", self.path.display(), err))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}
