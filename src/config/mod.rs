//! Configuration module for Stackmate
//! Handles loading and parsing of `stackmate.toml` configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::analyzer::DEFAULT_MONOREPO_THRESHOLD;
use crate::registry::{
    MetadataCache, RegistryClient, DEFAULT_CACHE_CAPACITY, DEFAULT_REGISTRY, REGISTRY_ENV,
};

/// Default configuration file name
pub const CONFIG_FILE: &str = "stackmate.toml";

/// Main configuration structure for Stackmate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackmateConfig {
    /// Registry access and caching
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the npm-compatible registry
    #[serde(default = "default_registry_url")]
    pub url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How long fetched metadata stays fresh, in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Maximum number of packages kept in the metadata cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_seconds: default_timeout_seconds(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Dependency count above which a monorepo setup is recommended
    #[serde(default = "default_monorepo_threshold")]
    pub monorepo_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            monorepo_threshold: default_monorepo_threshold(),
        }
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_cache_ttl_seconds() -> u64 {
    60 * 60
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_monorepo_threshold() -> usize {
    DEFAULT_MONOREPO_THRESHOLD
}

impl StackmateConfig {
    /// Load configuration from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: StackmateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Override the registry URL from `STACKMATE_REGISTRY` when set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(REGISTRY_ENV) {
            if !url.trim().is_empty() {
                self.registry.url = url;
            }
        }
        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let header = "# Stackmate Configuration\n# See https://github.com/stackmate/stackmate for documentation\n\n";
        let full_content = format!("{}{}", header, content);

        fs::write(path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Create a default configuration file
    pub fn create_default(path: &Path) -> Result<Self> {
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.registry.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("registry.url must be an http(s) URL, got '{}'", url);
        }

        if self.registry.timeout_seconds == 0 {
            anyhow::bail!("registry.timeout_seconds must be greater than 0");
        }

        if self.registry.cache_capacity == 0 {
            anyhow::bail!("registry.cache_capacity must be greater than 0");
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.registry.cache_ttl_seconds)
    }

    /// Build a registry client from these settings
    pub fn registry_client(&self) -> Result<RegistryClient> {
        let cache = MetadataCache::new(self.registry.cache_capacity, self.cache_ttl());
        RegistryClient::http(&self.registry.url, self.request_timeout(), cache)
            .with_context(|| format!("Failed to create registry client for {}", self.registry.url))
    }
}
