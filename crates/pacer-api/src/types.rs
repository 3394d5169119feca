//! Session status and snapshots

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Tracker state machine status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Nothing recorded yet, or just reset/saved
    #[default]
    Idle,
    /// Timer ticking and fixes being folded in
    Running,
    /// Paused; may resume, reset or save
    Stopped,
}

/// Read-only copy of the live session, for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub elapsed_seconds: u64,
    pub distance_meters: f64,
    pub route: Vec<Coordinate>,
}

impl SessionSnapshot {
    /// Most recent recorded position, if any
    pub fn last_position(&self) -> Option<Coordinate> {
        self.route.last().copied()
    }

    /// Whether a save would pass validation (ignoring status)
    pub fn has_saveable_data(&self) -> bool {
        self.elapsed_seconds > 0 && self.distance_meters > 0.0
    }
}
