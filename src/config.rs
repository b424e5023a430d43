use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Settings for [`FileAuditLog`](crate::audit::FileAuditLog)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Log file
    pub path: PathBuf,
    /// Keep existing contents instead of truncating
    pub append: bool,
    /// Echo entries to stdout
    pub console_output: bool,
    /// Flush after every entry
    pub auto_flush: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("app.log"),
            append: true,
            console_output: true,
            auto_flush: true,
        }
    }
}

impl AuditConfig {
    /// Read settings from a JSON file. Keys that are absent keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError::LoadError` if the file cannot be read or is not valid JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CatalogError::LoadError(format!("Failed to read config {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| CatalogError::LoadError(format!("Failed to parse config: {e}")))
    }
}
