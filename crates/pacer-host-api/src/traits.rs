//! Location and timer source traits

use pacer_api::{Coordinate, TrackerEvent};
use pacer_util::{SubscriptionId, TimerId};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from collaborator operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    #[error("Timer not found: {0}")]
    TimerNotFound(TimerId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Sending half of the tracker's event queue
pub type EventSender = mpsc::UnboundedSender<TrackerEvent>;

/// Receiving half of the tracker's event queue
pub type EventReceiver = mpsc::UnboundedReceiver<TrackerEvent>;

/// Create the single queue through which every collaborator feeds the tracker
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Tick cadence of the session timer
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Options for a location subscription
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscribeOptions {
    /// Minimum movement in meters between delivered fixes
    pub distance_interval_meters: f64,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            distance_interval_meters: 5.0,
        }
    }
}

/// Source of position fixes
///
/// Implementations deliver fixes asynchronously by sending
/// [`TrackerEvent::Fix`] into the provided sender, tagged with the returned
/// subscription handle.
pub trait LocationSource: Send + Sync {
    /// Ask for permission to read location. `Ok(false)` means denied.
    fn request_permission(&self) -> HostResult<bool>;

    /// Start delivering fixes into `sink`
    fn subscribe(&self, options: SubscribeOptions, sink: EventSender) -> HostResult<SubscriptionId>;

    /// Stop delivering fixes for `subscription`
    fn unsubscribe(&self, subscription: SubscriptionId) -> HostResult<()>;

    /// One-shot position read, used for map recentering
    fn current_position(&self) -> HostResult<Coordinate>;
}

/// Source of periodic ticks
pub trait TimerSource: Send + Sync {
    /// Send a [`TrackerEvent::Tick`] into `sink` every `interval`
    fn schedule_repeating(&self, interval: Duration, sink: EventSender) -> HostResult<TimerId>;

    /// Stop a repeating timer
    fn cancel(&self, timer: TimerId) -> HostResult<()>;
}
