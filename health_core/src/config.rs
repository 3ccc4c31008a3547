//! Configuration file support for the health rule engine.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/healthrules/config.toml`.

use crate::narrative::NarrativeBackend;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub trends: TrendConfig,

    #[serde(default)]
    pub narrative: NarrativeConfig,
}

/// Reference data configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// JSON catalog snapshot; the built-in catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

/// Significance thresholds for trend analysis, as fractions of the baseline
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendConfig {
    /// Changes below this are negligible
    #[serde(default = "default_negligible_below")]
    pub negligible_below: f64,

    /// Changes above this are significant
    #[serde(default = "default_significant_above")]
    pub significant_above: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            negligible_below: default_negligible_below(),
            significant_above: default_significant_above(),
        }
    }
}

/// External text-generation backend selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NarrativeConfig {
    #[serde(default)]
    pub backend: NarrativeBackend,

    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            backend: NarrativeBackend::default(),
            model: default_model(),
        }
    }
}

// Default value functions
fn default_negligible_below() -> f64 {
    0.05
}

fn default_significant_above() -> f64 {
    0.15
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(".config"))
                .unwrap_or_else(|| PathBuf::from(".config"))
        });
        base.join("healthrules").join("config.toml")
    }

    /// Reject thresholds that cannot order negligible below significant
    pub fn validate(&self) -> Result<()> {
        let TrendConfig {
            negligible_below,
            significant_above,
        } = self.trends;

        for (name, value) in [
            ("negligible_below", negligible_below),
            ("significant_above", significant_above),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "trends.{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }

        if negligible_below > significant_above {
            return Err(Error::Config(format!(
                "trends.negligible_below ({}) exceeds trends.significant_above ({})",
                negligible_below, significant_above
            )));
        }

        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
