//! # Host Configuration
//!
//! Loaded once at startup from `pancakes.toml`:
//!
//! ```toml
//! save_path = "pancakes.snapshot"
//! frame_rate = 60
//! notes_shown = 50
//! log_filter = "pancakes=info"
//!
//! [bulk]
//! shift = 5
//! alt = 10
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pancakes_economy::{EconomyError, EconomyResult};
use serde::Deserialize;
use tracing::info;

/// Config file looked up when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "pancakes.toml";

/// Highest accepted tick rate.
pub const MAX_FRAME_RATE: u32 = 240;

/// Quantity multipliers for the shop, the analogue of holding a modifier
/// key while clicking Buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulkConfig {
    /// `buy <ingredient> shift`
    pub shift: u32,
    /// `buy <ingredient> alt`
    pub alt: u32,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self { shift: 5, alt: 10 }
    }
}

/// Everything the host reads from its config file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Snapshot file.
    pub save_path: PathBuf,
    /// Ticks per second while running.
    pub frame_rate: u32,
    /// How many recent notes `status` lists.
    pub notes_shown: usize,
    /// Shop multipliers.
    pub bulk: BulkConfig,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("pancakes.snapshot"),
            frame_rate: 60,
            notes_shown: 50,
            bulk: BulkConfig::default(),
            log_filter: "pancakes=info".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on syntax errors, unknown keys or
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> EconomyResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| EconomyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> EconomyResult<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_toml_str(&text).map_err(|e| match e {
                    EconomyError::InvalidConfig(msg) => {
                        EconomyError::InvalidConfig(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })?;
                info!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(EconomyError::InvalidConfig(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Time between ticks.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    fn validate(&self) -> EconomyResult<()> {
        if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            return Err(EconomyError::InvalidConfig(format!(
                "frame_rate must be between 1 and {MAX_FRAME_RATE}, got {}",
                self.frame_rate
            )));
        }
        if self.bulk.shift == 0 || self.bulk.alt == 0 {
            return Err(EconomyError::InvalidConfig(
                "bulk multipliers must be positive".to_string(),
            ));
        }
        if self.save_path.as_os_str().is_empty() {
            return Err(EconomyError::InvalidConfig(
                "save_path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(TrackerConfig::from_toml_str("").unwrap(), TrackerConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = TrackerConfig::from_toml_str(
            r#"
            frame_rate = 10
            [bulk]
            alt = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.frame_rate, 10);
        assert_eq!(config.bulk, BulkConfig { shift: 5, alt: 25 });
        assert_eq!(config.notes_shown, 50);
        assert_eq!(config.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(TrackerConfig::from_toml_str("frame_rate = 0").is_err());
        assert!(TrackerConfig::from_toml_str("frame_rate = 1000").is_err());
        assert!(TrackerConfig::from_toml_str("[bulk]\nshift = 0").is_err());
        assert!(TrackerConfig::from_toml_str("save_path = \"\"").is_err());
        assert!(TrackerConfig::from_toml_str("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = TrackerConfig::load(Path::new("/definitely/not/here/pancakes.toml")).unwrap();
        assert_eq!(config, TrackerConfig::default());
    }
}
