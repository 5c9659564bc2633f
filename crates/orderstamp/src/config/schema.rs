use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest font size an operator may place.
pub const MIN_FONT_SIZE: f64 = 8.0;
/// Largest font size an operator may place.
pub const MAX_FONT_SIZE: f64 = 72.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_font_size")]
    pub default_font_size: f64,
    /// Sub-folders created under the date folder when settings are saved.
    #[serde(default = "default_folders")]
    pub default_folders: Vec<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_font_size() -> f64 {
    12.0
}

fn default_folders() -> Vec<String> {
    vec!["CH".to_string(), "CD".to_string(), "BL".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            log_level: default_log_level(),
            default_font_size: default_font_size(),
            default_folders: default_folders(),
        }
    }
}

impl Config {
    /// Database location: the configured path, else `~/.orderstamp/data/orderstamp.db`.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

/// Returns the canonical config path: `~/.orderstamp/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".orderstamp").join("config.json"))
}
