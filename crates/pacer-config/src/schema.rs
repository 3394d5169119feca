//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Session tracker settings
    #[serde(default)]
    pub tracker: RawTrackerConfig,

    /// Athlete profile
    #[serde(default)]
    pub profile: RawProfile,

    /// History storage settings
    #[serde(default)]
    pub storage: RawStorage,
}

/// Tracker settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTrackerConfig {
    /// Minimum movement between delivered fixes: 5 or 10 meters
    pub sample_interval_meters: Option<u32>,

    /// Recenter the map on every applied fix
    pub recenter_on_fix: Option<bool>,
}

/// Athlete profile
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawProfile {
    /// Body weight used for calorie estimates
    pub body_weight_kg: Option<f64>,
}

/// History storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorage {
    /// "json" or "sqlite"
    pub backend: Option<String>,

    /// Data directory (defaults to the per-user data dir)
    pub data_dir: Option<PathBuf>,

    /// History file name inside the data directory
    pub history_file: Option<String>,
}
