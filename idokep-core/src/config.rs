use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    coordinator::UPDATE_INTERVAL,
    mapping::{ConditionMapper, Vocabulary, WindForceMapper},
    model::Condition,
    provider::idokep::{DEFAULT_BASE_URL, DEFAULT_LOCATION, DEFAULT_TIMEOUT},
};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// location = "Szeged"
/// poll_interval_minutes = 20
///
/// [conditions]
/// "ónos eső" = "snowy-rainy"
///
/// [wind_forces]
/// "mérsékelt" = 25
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Location slug as used in the site's URLs, e.g. "Budapest".
    pub location: Option<String>,

    pub base_url: Option<String>,

    pub timeout_secs: Option<u64>,

    pub poll_interval_minutes: Option<u64>,

    /// Extra phrase → condition token entries on top of the built-in table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub conditions: HashMap<String, String>,

    /// Extra force label → km/h entries on top of the built-in table.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub wind_forces: HashMap<String, u32>,
}

impl Config {
    pub fn location(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Time between fetch cycles, never below one minute.
    pub fn poll_interval(&self) -> Duration {
        match self.poll_interval_minutes {
            Some(minutes) => Duration::from_secs(minutes.max(1) * 60),
            None => UPDATE_INTERVAL,
        }
    }

    /// Built-in vocabulary extended with the configured overrides.
    pub fn vocabulary(&self) -> Result<Vocabulary> {
        let conditions = self
            .conditions
            .iter()
            .map(|(phrase, token)| {
                let condition = token
                    .parse::<Condition>()
                    .with_context(|| format!("Invalid [conditions] entry for '{phrase}'"))?;
                Ok((phrase.trim().to_lowercase(), condition))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Vocabulary {
            conditions: ConditionMapper::default().with_entries(conditions),
            wind: WindForceMapper::default()
                .with_entries(self.wind_forces.clone()),
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("hu", "idokep", "idokep")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
