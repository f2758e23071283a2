//! Driver configuration
//!
//! Configuration is loaded from environment variables.

use std::env;
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Mask image used for authoring and as the paint template
    pub template: PathBuf,
    /// Directory metafiles are written to
    pub metafile_dir: PathBuf,
    /// Where the painted map is saved
    pub output: PathBuf,
    /// Country written into headers when an authoring request has none
    pub default_country: Option<String>,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: PathBuf::from("map.png"),
            metafile_dir: PathBuf::from("mf"),
            output: PathBuf::from("result.png"),
            default_country: None,
            log_filter: "regionmap=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable lookup; empty values are ignored
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(path) = var("REGIONMAP_TEMPLATE") {
            config.template = PathBuf::from(path);
        }
        if let Some(dir) = var("REGIONMAP_METAFILE_DIR") {
            config.metafile_dir = PathBuf::from(dir);
        }
        if let Some(path) = var("REGIONMAP_OUTPUT") {
            config.output = PathBuf::from(path);
        }
        if let Some(country) = var("REGIONMAP_COUNTRY") {
            config.default_country = Some(country);
        }
        if let Some(filter) = var("REGIONMAP_LOG") {
            config.log_filter = filter;
        }

        config
    }
}
