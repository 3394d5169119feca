//! Events fed into the tracker by its collaborators

use pacer_util::{SubscriptionId, TimerId};

use crate::Coordinate;

/// An input event for the session tracker.
///
/// Each event carries the handle of the timer or subscription that produced
/// it, so the tracker can drop callbacks from sources it already cancelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    /// One timer period elapsed
    Tick { timer: TimerId },

    /// A position fix arrived from the location subscription
    Fix {
        subscription: SubscriptionId,
        coordinate: Coordinate,
    },
}
