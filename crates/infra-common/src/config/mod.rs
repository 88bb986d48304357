//! Configuration file loading
//!
//! Configuration structs are plain serde types; this module only knows how to
//! turn a file on disk into one of them. The format is picked from the file
//! extension (`.toml` or `.json`).

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// JSON document
    Json,
}

impl ConfigFormat {
    /// Detect the format from a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Some(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            _ => None,
        }
    }

    /// Parse a document in this format
    pub fn parse<T: DeserializeOwned>(&self, contents: &str) -> std::result::Result<T, String> {
        match self {
            Self::Toml => toml::from_str(contents).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(contents).map_err(|e| e.to_string()),
        }
    }
}

/// Load a configuration struct from a TOML or JSON file
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let path_display = path.display().to_string();

    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        Error::config(format!(
            "Unsupported configuration file extension: {} (expected .toml or .json)",
            path_display
        ))
    })?;

    let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path_display.clone(),
        source,
    })?;

    let config = format.parse(&contents).map_err(|message| Error::Parse {
        path: path_display.clone(),
        message,
    })?;

    debug!("Loaded {:?} configuration from {}", format, path_display);
    Ok(config)
}

/// Load a configuration struct, falling back to `T::default()` when no path is
/// given or the file does not exist. Parse failures are still reported.
pub fn load_config_or_default<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match path {
        Some(path) if path.exists() => load_config(path),
        Some(path) => {
            info!("Configuration file {} not found, using defaults", path.display());
            Ok(T::default())
        }
        None => Ok(T::default()),
    }
}
