//! Runtime settings read from the environment (after `.env` is loaded).

use std::env;
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "BIKESHARE_DATA_DIR";
pub const DATA_URL_VAR: &str = "BIKESHARE_DATA_URL";
pub const LOG_FILE_VAR: &str = "LOG_FILE_PATH";

/// Where trip data comes from and where logs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding `chicago.csv` and friends.
    pub data_dir: PathBuf,
    /// Base URL to download city files from. Takes precedence over `data_dir`.
    pub data_url: Option<String>,
    pub log_file_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            data_url: None,
            log_file_path: PathBuf::from("logs/bikeshare_explorer.log"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_dir: non_empty(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            data_url: non_empty(DATA_URL_VAR),
            log_file_path: non_empty(LOG_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file_path),
        }
    }
}
