// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gang Admission Configuration
//
// Defines the configuration schema of the admission coordinator:
// - Default wait duration handed out with every Wait decision
// - Annotation keys carrying group identity and quorum
// - Group state store backend (global lock or sharded)
// - Event bus buffering

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::repository::StoreBackend;

pub const DEFAULT_GROUP_ANNOTATION: &str = "batch.scheduling.k8s.io/group";
pub const DEFAULT_MIN_AVAILABLE_ANNOTATION: &str = "batch.scheduling.k8s.io/min-available";

/// Environment variable pointing at a configuration file.
pub const CONFIG_PATH_ENV: &str = "GANG_ADMISSION_CONFIG_PATH";
/// Environment variable overriding `wait_timeout` (humantime, e.g. "90s").
pub const WAIT_TIMEOUT_ENV: &str = "GANG_ADMISSION_WAIT_TIMEOUT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GangAdmissionConfig {
    /// How long a suspended member waits before its suspension is reconsidered
    #[serde(with = "humantime_serde", default = "default_wait_timeout")]
    pub wait_timeout: Duration,

    /// Annotation holding the group name
    #[serde(default = "default_group_annotation")]
    pub group_annotation: String,

    /// Annotation holding the quorum (minimum members to start the gang)
    #[serde(default = "default_min_available_annotation")]
    pub min_available_annotation: String,

    #[serde(default)]
    pub store: StoreConfig,

    /// Events buffered per subscriber before the oldest are dropped
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreKind,

    /// Partition count, only read for the sharded backend
    #[serde(default = "default_shards")]
    pub shards: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Global,
    Sharded,
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        match self.backend {
            StoreKind::Global => StoreBackend::Global,
            StoreKind::Sharded => StoreBackend::Sharded { shards: self.shards },
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreKind::Global,
            shards: default_shards(),
        }
    }
}

impl Default for GangAdmissionConfig {
    fn default() -> Self {
        Self {
            wait_timeout: default_wait_timeout(),
            group_annotation: default_group_annotation(),
            min_available_annotation: default_min_available_annotation(),
            store: StoreConfig::default(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl GangAdmissionConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GANG_ADMISSION_CONFIG_PATH environment variable
    /// 2. ./gang-admission.yaml (working directory)
    /// 3. ~/.gang-admission/config.yaml (user home)
    /// 4. /etc/gang-admission/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }

    /// Candidate configuration paths in precedence order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./gang-admission.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gang-admission").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/gang-admission/config.yaml"));

        paths
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(WAIT_TIMEOUT_ENV) {
            self.apply_wait_timeout_override(&val);
        }
    }

    fn apply_wait_timeout_override(&mut self, val: &str) {
        match humantime_serde::re::humantime::parse_duration(val) {
            Ok(timeout) => {
                tracing::info!("Environment override: {}={}", WAIT_TIMEOUT_ENV, val);
                self.wait_timeout = timeout;
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid value for {}: '{}' ({}). Expected a duration like '90s'. Ignoring.",
                    WAIT_TIMEOUT_ENV,
                    val,
                    e
                );
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.wait_timeout.is_zero() {
            anyhow::bail!("wait_timeout must be greater than zero");
        }

        if self.group_annotation.trim().is_empty() {
            anyhow::bail!("group_annotation cannot be empty");
        }

        if self.min_available_annotation.trim().is_empty() {
            anyhow::bail!("min_available_annotation cannot be empty");
        }

        if self.group_annotation == self.min_available_annotation {
            anyhow::bail!(
                "group_annotation and min_available_annotation must differ (both '{}')",
                self.group_annotation
            );
        }

        if self.store.backend == StoreKind::Sharded && self.store.shards == 0 {
            anyhow::bail!("store.shards must be at least 1 for the sharded backend");
        }

        if self.event_bus_capacity == 0 {
            anyhow::bail!("event_bus_capacity must be at least 1");
        }

        Ok(())
    }
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_group_annotation() -> String {
    DEFAULT_GROUP_ANNOTATION.to_string()
}

fn default_min_available_annotation() -> String {
    DEFAULT_MIN_AVAILABLE_ANNOTATION.to_string()
}

fn default_shards() -> usize {
    16
}

fn default_event_bus_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GangAdmissionConfig::default();
        assert_eq!(config.wait_timeout, Duration::from_secs(600));
        assert_eq!(config.group_annotation, DEFAULT_GROUP_ANNOTATION);
        assert_eq!(config.min_available_annotation, DEFAULT_MIN_AVAILABLE_ANNOTATION);
        assert_eq!(config.store.backend(), StoreBackend::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = GangAdmissionConfig::from_yaml_str(
            "wait_timeout: 90s\nstore:\n  backend: sharded\n  shards: 4\n",
        )
        .unwrap();

        assert_eq!(config.wait_timeout, Duration::from_secs(90));
        assert_eq!(config.group_annotation, DEFAULT_GROUP_ANNOTATION);
        assert_eq!(config.store.backend(), StoreBackend::Sharded { shards: 4 });
        assert_eq!(config.event_bus_capacity, 1000);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gang-admission.yaml");

        let mut config = GangAdmissionConfig::default();
        config.wait_timeout = Duration::from_secs(45);
        config.group_annotation = "example.com/gang".to_string();
        config.to_yaml_file(&path).unwrap();

        let parsed = GangAdmissionConfig::from_yaml_file(&path).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_wait_timeout_override() {
        let mut config = GangAdmissionConfig::default();

        config.apply_wait_timeout_override("2m");
        assert_eq!(config.wait_timeout, Duration::from_secs(120));

        // Garbage is ignored
        config.apply_wait_timeout_override("soon");
        assert_eq!(config.wait_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_validation() {
        let mut config = GangAdmissionConfig::default();

        config.wait_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.wait_timeout = Duration::from_secs(1);

        config.group_annotation = " ".to_string();
        assert!(config.validate().is_err());
        config.group_annotation = DEFAULT_GROUP_ANNOTATION.to_string();

        config.min_available_annotation = DEFAULT_GROUP_ANNOTATION.to_string();
        assert!(config.validate().is_err());
        config.min_available_annotation = DEFAULT_MIN_AVAILABLE_ANNOTATION.to_string();

        config.store = StoreConfig {
            backend: StoreKind::Sharded,
            shards: 0,
        };
        assert!(config.validate().is_err());
        config.store.shards = 8;

        config.event_bus_capacity = 0;
        assert!(config.validate().is_err());
        config.event_bus_capacity = 10;

        assert!(config.validate().is_ok());
    }
}
