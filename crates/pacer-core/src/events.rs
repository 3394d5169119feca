//! Core events emitted by the tracker

use pacer_api::{Coordinate, RunRecord};

/// Events emitted by the session tracker for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// Session entered Running
    SessionStarted {
        /// True when continuing a stopped session
        resumed: bool,
        elapsed_seconds: u64,
    },

    /// One second counted
    Ticked { elapsed_seconds: u64 },

    /// A fix was appended to the route
    RouteExtended {
        coordinate: Coordinate,
        segment_meters: f64,
        distance_meters: f64,
        points: usize,
    },

    /// The map should follow the latest fix
    RecenterRequested { coordinate: Coordinate },

    /// Session left Running
    SessionStopped {
        elapsed_seconds: u64,
        distance_meters: f64,
    },

    /// Session cleared back to Idle
    SessionReset,

    /// A run was handed to the history store
    RunSaved {
        record: RunRecord,
        persisted: bool,
    },
}
