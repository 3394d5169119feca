//! Configuration validation

use crate::schema::{RawConfig, RawStorage};
use crate::settings::{MAX_BODY_WEIGHT_KG, SampleInterval, StorageBackend};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("sample_interval_meters must be 5 or 10, got {0}")]
    InvalidSampleInterval(u32),

    #[error("body_weight_kg must be in (0, {max}], got {value}")]
    InvalidBodyWeight { value: f64, max: f64 },

    #[error("Unknown storage backend '{0}' (expected \"json\" or \"sqlite\")")]
    UnknownBackend(String),

    #[error("Invalid history file name '{value}': {message}")]
    InvalidHistoryFile { value: String, message: String },
}

/// Validate a raw configuration, collecting every error
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(interval) = config.tracker.sample_interval_meters
        && SampleInterval::from_meters(interval).is_none()
    {
        errors.push(ValidationError::InvalidSampleInterval(interval));
    }

    if let Some(weight) = config.profile.body_weight_kg
        && !(weight.is_finite() && weight > 0.0 && weight <= MAX_BODY_WEIGHT_KG)
    {
        errors.push(ValidationError::InvalidBodyWeight {
            value: weight,
            max: MAX_BODY_WEIGHT_KG,
        });
    }

    errors.extend(validate_storage(&config.storage));

    errors
}

fn validate_storage(storage: &RawStorage) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(backend) = &storage.backend
        && StorageBackend::parse(backend).is_none()
    {
        errors.push(ValidationError::UnknownBackend(backend.clone()));
    }

    if let Some(file) = &storage.history_file {
        if file.trim().is_empty() {
            errors.push(ValidationError::InvalidHistoryFile {
                value: file.clone(),
                message: "cannot be empty".into(),
            });
        } else if file.contains('/') || file.contains('\\') || matches!(file.trim(), "." | "..") {
            errors.push(ValidationError::InvalidHistoryFile {
                value: file.clone(),
                message: "must be a file name, not a path".into(),
            });
        }
    }

    errors
}
