//! Validated configuration structures

use crate::schema::{RawConfig, RawProfile, RawStorage, RawTrackerConfig};
use pacer_util::default_data_dir;
use std::path::PathBuf;

/// Body weight assumed when the profile does not set one
pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;

/// Upper bound accepted for body weight
pub const MAX_BODY_WEIGHT_KG: f64 = 400.0;

/// Default history file name for the JSON backend
pub const DEFAULT_JSON_HISTORY_FILE: &str = "history.json";

/// Default history file name for the SQLite backend
pub const DEFAULT_SQLITE_HISTORY_FILE: &str = "history.db";

/// Validated configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub tracker: TrackerSettings,
    pub profile: ProfileSettings,
    pub storage: StorageSettings,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            tracker: TrackerSettings::from_raw(raw.tracker),
            profile: ProfileSettings::from_raw(raw.profile),
            storage: StorageSettings::from_raw(raw.storage),
        }
    }
}

/// Distance filter for location fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleInterval {
    #[default]
    Five,
    Ten,
}

impl SampleInterval {
    pub fn from_meters(meters: u32) -> Option<Self> {
        match meters {
            5 => Some(Self::Five),
            10 => Some(Self::Ten),
            _ => None,
        }
    }

    pub fn meters(self) -> f64 {
        match self {
            Self::Five => 5.0,
            Self::Ten => 10.0,
        }
    }
}

/// Session tracker options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub sample_interval_meters: SampleInterval,
    pub recenter_on_fix: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            sample_interval_meters: SampleInterval::Five,
            recenter_on_fix: true,
        }
    }
}

impl TrackerSettings {
    fn from_raw(raw: RawTrackerConfig) -> Self {
        let defaults = Self::default();
        Self {
            sample_interval_meters: raw
                .sample_interval_meters
                .and_then(SampleInterval::from_meters)
                .unwrap_or(defaults.sample_interval_meters),
            recenter_on_fix: raw.recenter_on_fix.unwrap_or(defaults.recenter_on_fix),
        }
    }
}

/// Athlete profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSettings {
    pub body_weight_kg: f64,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            body_weight_kg: DEFAULT_BODY_WEIGHT_KG,
        }
    }
}

impl ProfileSettings {
    fn from_raw(raw: RawProfile) -> Self {
        Self {
            body_weight_kg: raw.body_weight_kg.unwrap_or(DEFAULT_BODY_WEIGHT_KG),
        }
    }
}

/// History persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Json,
    Sqlite,
}

impl StorageBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    fn default_file(self) -> &'static str {
        match self {
            Self::Json => DEFAULT_JSON_HISTORY_FILE,
            Self::Sqlite => DEFAULT_SQLITE_HISTORY_FILE,
        }
    }
}

/// History storage location
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub history_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self::from_raw(RawStorage::default())
    }
}

impl StorageSettings {
    fn from_raw(raw: RawStorage) -> Self {
        let backend = raw
            .backend
            .as_deref()
            .and_then(StorageBackend::parse)
            .unwrap_or_default();

        Self {
            backend,
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            history_file: raw
                .history_file
                .unwrap_or_else(|| backend.default_file().to_string()),
        }
    }

    /// Full path of the history file
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }
}
