//! Shared utilities for pacer
//!
//! This crate provides:
//! - ID types (RunId, SubscriptionId, TimerId)
//! - Clock access with debug-build mock time
//! - Elapsed-time and time-of-day formatting
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
