//! Configuration management
//!
//! Loads settings from /etc/levelup/config.toml (overridable with
//! $LEVELUP_CONFIG) or falls back to defaults, so the daemon runs with no
//! config file present.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Default config file path
pub const CONFIG_PATH: &str = "/etc/levelup/config.toml";

/// Env var overriding the config file path
pub const CONFIG_ENV: &str = "LEVELUP_CONFIG";

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the API. Localhost only by default.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:7870".to_string()
}

fn default_db_path() -> String {
    "/var/lib/levelup/levelup.db".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
        }
    }
}

/// Daily reset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Local hour (0-23) at which the daily cycle rolls over.
    #[serde(default = "default_reset_hour")]
    pub reset_hour: u32,
}

fn default_reset_hour() -> u32 {
    6
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            reset_hour: default_reset_hour(),
        }
    }
}

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelUpConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub reset: ResetConfig,
}

impl LevelUpConfig {
    /// Load from the configured path, or return defaults when the file is
    /// missing or unreadable. A malformed file is a warning, not a crash.
    pub fn load_or_default() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from an explicit path with the same fallback behavior.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Malformed config at {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Cannot read config at {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LevelUpConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:7870");
        assert_eq!(config.reset.reset_hour, 6);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reset]\nreset_hour = 4").unwrap();
        let config = LevelUpConfig::load_from(file.path());
        assert_eq!(config.reset.reset_hour, 4);
        assert_eq!(config.server.db_path, default_db_path());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = LevelUpConfig::load_from(Path::new("/nonexistent/levelup.toml"));
        assert_eq!(config.server.listen_addr, "127.0.0.1:7870");
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not [valid toml").unwrap();
        let config = LevelUpConfig::load_from(file.path());
        assert_eq!(config.reset.reset_hour, 6);
    }
}
