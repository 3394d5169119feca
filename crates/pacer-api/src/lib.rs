//! Shared domain types for pacer
//!
//! This crate defines the types passed between the tracker, its
//! collaborators and the presentation layer:
//! - Coordinates and their validation
//! - Session status and snapshots
//! - Saved run records
//! - Tracker input events

mod coordinate;
mod events;
mod record;
mod types;

pub use coordinate::*;
pub use events::*;
pub use record::*;
pub use types::*;
