//! Configuration for [`FileReferenceStore`](crate::FileReferenceStore).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};

/// Default file name of the persisted catalog.
pub const DEFAULT_FILE_NAME: &str = "repositories.json";

/// Where and how the reference store persists its catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backing file. Relative paths are resolved against the working
    /// directory when the store is opened.
    pub path: PathBuf,
    /// Unix permission bits of the backing file.
    pub file_mode: u32,
    /// Flush each write to disk before renaming it into place.
    pub sync_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_FILE_NAME),
            file_mode: 0o600,
            sync_writes: true,
        }
    }
}

impl StoreConfig {
    /// Default settings for a store backed by `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Parse a config from TOML. Missing keys take their defaults.
    ///
    /// ```
    /// use imgref_refs::StoreConfig;
    ///
    /// let toml = r#"path = "/var/lib/images/repositories.json""#;
    /// let config = StoreConfig::from_toml_str(toml).unwrap();
    /// assert_eq!(config.file_mode, 0o600);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RefError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(RefError::Config("path must not be empty".into()));
        }
        if self.file_mode & !0o777 != 0 {
            return Err(RefError::Config(format!(
                "file_mode {:o} has bits outside 0o777",
                self.file_mode
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.path, PathBuf::from(DEFAULT_FILE_NAME));
        assert_eq!(c.file_mode, 0o600);
        assert!(c.sync_writes);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn from_toml_fills_defaults() {
        let toml = "path = \"/tmp/refs.json\"\nsync_writes = false\n";
        let c = StoreConfig::from_toml_str(toml).unwrap();
        assert_eq!(c.path, PathBuf::from("/tmp/refs.json"));
        assert!(!c.sync_writes);
        assert_eq!(c.file_mode, 0o600);
    }

    #[test]
    fn reject_bad_values() {
        assert!(StoreConfig::from_toml_str("path = \"\"").is_err());
        assert!(StoreConfig::from_toml_str("file_mode = 4096").is_err());
        assert!(StoreConfig::from_toml_str("path = 3").is_err());
    }
}
