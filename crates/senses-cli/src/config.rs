//! Configuration file management.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use senses_core::{ProviderLimits, SenseCatalog, StaticSignals};

/// Environment variable overriding `service_url`.
pub const SERVICE_URL_ENV: &str = "SENSES_SERVICE_URL";

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the persistence API
    #[serde(default)]
    pub service_url: Option<String>,

    /// Sense catalog overrides
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Provider account limits
    #[serde(default)]
    pub limits: ProviderLimits,

    /// Default device signals for `fingerprint` and device-location records
    #[serde(default)]
    pub device: StaticSignals,
}

/// Overrides applied on top of the built-in catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Replace the essential set. `None` keeps the built-in set.
    #[serde(default)]
    pub essential: Option<BTreeSet<String>>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("persona-senses")
            .join("config.toml")
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`. Missing or unreadable files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to parse config"),
            },
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to read config"),
        }
        Self::default()
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// The built-in catalog with config overrides applied.
    pub fn catalog(&self) -> SenseCatalog {
        let catalog = SenseCatalog::default();
        match &self.catalog.essential {
            Some(essential) => catalog.with_essential(essential),
            None => catalog,
        }
    }
}

/// Resolve the service URL: explicit value, then env var, then config.
pub fn resolve_service_url(explicit: Option<String>, config: &Config) -> Option<String> {
    explicit
        .or_else(|| env::var(SERVICE_URL_ENV).ok().filter(|s| !s.is_empty()))
        .or_else(|| config.service_url.clone())
}
