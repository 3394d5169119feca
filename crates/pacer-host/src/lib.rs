//! Host collaborators for pacer
//!
//! Provides:
//! - A tokio-backed repeating timer
//! - A location source that replays a recorded track file

mod replay;
mod timer;

pub use replay::*;
pub use timer::*;
