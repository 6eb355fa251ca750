//! Configuration management for the module host
//!
//! Handles configuration loading (TOML or JSON) and defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::module::registry::ManifestPolicy;
use crate::module::traits::ModuleError;

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "modhost=debug"); `RUST_LOG` takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON instead of human-readable lines (needs the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Application name; also selects the persisted manifest file
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Directory holding `<application_name>.toml` manifests
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: PathBuf,

    /// How manifest entries are reconciled with registered modules
    #[serde(default)]
    pub manifest_policy: ManifestPolicy,

    /// Timing samples kept by the default profiler
    #[serde(default = "default_profiler_samples")]
    pub profiler_samples: usize,

    /// Values exposed to modules through the shared context
    #[serde(default)]
    pub context: HashMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_application_name() -> String {
    "app".to_string()
}

fn default_manifest_dir() -> PathBuf {
    PathBuf::from("modules")
}

fn default_profiler_samples() -> usize {
    1000
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            application_name: default_application_name(),
            manifest_dir: default_manifest_dir(),
            manifest_policy: ManifestPolicy::default(),
            profiler_samples: default_profiler_samples(),
            context: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl HostConfig {
    /// Config for `application_name` with every other field defaulted
    pub fn for_application(application_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            ..Self::default()
        }
    }

    pub fn with_manifest_dir<P: AsRef<Path>>(mut self, manifest_dir: P) -> Self {
        self.manifest_dir = manifest_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_manifest_policy(mut self, policy: ManifestPolicy) -> Self {
        self.manifest_policy = policy;
        self
    }

    /// Load configuration from a TOML file, or JSON when the extension is `.json`
    pub fn from_file(path: &Path) -> Result<Self, ModuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModuleError::ConfigError(format!("Failed to read {:?}: {}", path, e)))?;

        let config: HostConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content).map_err(|e| ModuleError::ConfigError(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as TOML
    pub fn to_file(&self, path: &Path) -> Result<(), ModuleError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ModuleError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModuleError> {
        if self.application_name.trim().is_empty() {
            return Err(ModuleError::ConfigError(
                "application_name cannot be empty".to_string(),
            ));
        }
        if self.profiler_samples == 0 {
            return Err(ModuleError::ConfigError(
                "profiler_samples must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
