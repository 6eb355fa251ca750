//! Persisted module manifest
//!
//! Handles loading `<manifest_dir>/<application_name>.toml`, the ordered list of
//! modules an application ships with:
//!
//! ```toml
//! [[modules]]
//! identity = "analytics"
//! level = 2
//! priority = 10
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::module::registry::descriptor::{ModuleDescriptor, Ranked};
use crate::module::traits::{ModuleError, ModuleLevel};

/// One persisted module record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub identity: String,
    pub level: ModuleLevel,
    #[serde(default)]
    pub priority: i32,
}

impl From<ManifestEntry> for ModuleDescriptor {
    fn from(entry: ManifestEntry) -> Self {
        ModuleDescriptor::new(entry.identity, entry.level, entry.priority)
    }
}

impl Ranked for ManifestEntry {
    fn rank_level(&self) -> ModuleLevel {
        self.level
    }

    fn rank_priority(&self) -> i32 {
        self.priority
    }
}

/// Module manifest (`<application_name>.toml` structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleManifest {
    #[serde(default)]
    pub modules: Vec<ManifestEntry>,
}

impl ModuleManifest {
    /// Parse manifest TOML
    pub fn from_toml(contents: &str) -> Result<Self, ModuleError> {
        let manifest: ModuleManifest = toml::from_str(contents)?;

        if let Some(entry) = manifest.modules.iter().find(|m| m.identity.is_empty()) {
            return Err(ModuleError::InvalidManifest(format!(
                "Module identity cannot be empty (level {})",
                entry.level
            )));
        }

        Ok(manifest)
    }

    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModuleError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ModuleError::InvalidManifest(format!("Failed to read manifest file: {}", e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn to_toml(&self) -> Result<String, ModuleError> {
        toml::to_string_pretty(self).map_err(|e| ModuleError::InvalidManifest(e.to_string()))
    }
}

/// Locates and reads the manifest for an application
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    manifest_dir: PathBuf,
}

impl ManifestLoader {
    pub fn new<P: AsRef<Path>>(manifest_dir: P) -> Self {
        Self {
            manifest_dir: manifest_dir.as_ref().to_path_buf(),
        }
    }

    pub fn manifest_path(&self, application_name: &str) -> PathBuf {
        self.manifest_dir.join(format!("{}.toml", application_name))
    }

    /// Load the manifest entries for `application_name`
    ///
    /// A missing file is an empty list, not an error.
    pub fn load(&self, application_name: &str) -> Result<Vec<ManifestEntry>, ModuleError> {
        let path = self.manifest_path(application_name);
        if !path.exists() {
            debug!("No module manifest at {:?}, using empty list", path);
            return Ok(Vec::new());
        }

        let manifest = ModuleManifest::from_file(&path)?;
        info!(
            "Loaded {} manifest entries from {:?}",
            manifest.modules.len(),
            path
        );
        Ok(manifest.modules)
    }
}
