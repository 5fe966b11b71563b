//! Runtime settings.
//!
//! Settings live in a JSON file, by default `<config dir>/scrubline/config.json`.
//! A missing file means defaults; a malformed or out-of-range one is an error.
//! Every field is optional in the file.
//!
//! ```json
//! {
//!   "log_level": "debug",
//!   "iqr_multiplier": 3.0,
//!   "null_tokens": ["", "null", "?"]
//! }
//! ```

use crate::error::{CleanError, Result};
use crate::stages::outliers::check_multiplier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIR: &str = "scrubline";
pub const CONFIG_FILE: &str = "config.json";

/// Cell text treated as missing by `standardise_nulls` when a step gives no list.
pub const DEFAULT_NULL_TOKENS: &[&str] = &["", "null", "n/a", "na", "nan", "none", "-"];

/// Formats tried, in order, when casting categorical text to temporal.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_level: String,
    /// Directory for rolling log files; platform data dir when unset
    pub log_dir: Option<PathBuf>,
    pub null_tokens: Vec<String>,
    pub date_formats: Vec<String>,
    /// Fence multiplier for IQR outlier steps that do not set their own
    pub iqr_multiplier: f64,
    /// Pretty-print JSON documents written by the CLI
    pub pretty_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_dir: None,
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| (*s).to_owned()).collect(),
            date_formats: DEFAULT_DATE_FORMATS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            iqr_multiplier: 1.5,
            pretty_json: true,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values no stage can use.
    pub fn validate(&self) -> Result<()> {
        match check_multiplier(self.iqr_multiplier) {
            Some(problem) => Err(CleanError::invalid(format!("iqr_multiplier: {problem}"))),
            None => Ok(()),
        }
    }

    /// Loads from `path` when given, otherwise from the default location.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path.map(Path::to_path_buf).or_else(get_config_path) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Whether `cell` is one of the configured null tokens (trimmed, case-insensitive).
    pub fn is_null_token(&self, cell: &str) -> bool {
        is_null_token(&self.null_tokens, cell)
    }
}

pub(crate) fn is_null_token(tokens: &[String], cell: &str) -> bool {
    let cell = cell.trim();
    tokens.iter().any(|t| t.trim().eq_ignore_ascii_case(cell))
}

/// Default settings path: `<config dir>/scrubline/config.json`.
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
