//! Default paths for pacer
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/pacer/config.toml` or `~/.config/pacer/config.toml`
//! - Data: `$PACER_DATA_DIR`, `$XDG_DATA_HOME/pacer` or `~/.local/share/pacer`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const PACER_DATA_DIR_ENV: &str = "PACER_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "pacer";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$PACER_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/pacer` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/pacer` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(PACER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the PACER_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}
