//! Collaborator trait interfaces for pacer
//!
//! This crate defines the boundary between the session tracker and the
//! platform services it depends on (location fixes, a repeating timer).
//! It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
