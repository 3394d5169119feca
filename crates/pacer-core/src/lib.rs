//! Geo math and session state machine for pacer
//!
//! This crate is the heart of pacer, containing:
//! - Great-circle distance and derived metrics (speed, calories)
//! - Session state machine (Idle -> Running -> Stopped -> Idle)
//! - Folding timer ticks and position fixes into the live session
//! - Turning a finished session into a saved run

mod engine;
mod events;
pub mod geo;
mod session;

pub use engine::*;
pub use events::*;
pub use geo::{average_speed_kmh, estimate_calories, haversine_distance};
pub use session::*;
