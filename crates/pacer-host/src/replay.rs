//! Location source that replays a recorded track

use pacer_api::{Coordinate, TrackerEvent};
use pacer_core::haversine_distance;
use pacer_host_api::{
    EventSender, HostError, HostResult, LocationSource, SubscribeOptions,
};
use pacer_util::SubscriptionId;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default spacing between replayed fixes
pub const DEFAULT_FIX_INTERVAL: Duration = Duration::from_millis(1000);

/// One entry of a track file, before range checks
#[derive(Debug, Deserialize)]
struct TrackPoint {
    latitude: f64,
    longitude: f64,
}

/// Replays a fixed list of coordinates as if they were live GPS fixes.
///
/// Playback position is shared by all subscriptions, so a session that is
/// stopped and resumed picks up where the track left off. Points closer than
/// the subscription's distance filter to the last delivered fix are skipped.
pub struct ReplayLocation {
    track: Arc<Vec<Coordinate>>,
    fix_interval: Duration,
    cursor: Arc<AtomicUsize>,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
    subscriptions: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl ReplayLocation {
    pub fn new(track: Vec<Coordinate>, fix_interval: Duration) -> HostResult<Self> {
        if track.is_empty() {
            return Err(HostError::LocationUnavailable("Replay track is empty".into()));
        }

        Ok(Self {
            track: Arc::new(track),
            fix_interval,
            cursor: Arc::new(AtomicUsize::new(0)),
            last_fix: Arc::new(Mutex::new(None)),
            subscriptions: Mutex::new(HashMap::new()),
        })
    }

    /// Load a JSON array of `{ "latitude": .., "longitude": .. }` objects.
    /// Entries outside the valid coordinate ranges are skipped.
    pub fn from_file(path: &Path, fix_interval: Duration) -> HostResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let points: Vec<TrackPoint> = serde_json::from_str(&content).map_err(|e| {
            HostError::LocationUnavailable(format!("Invalid track file {}: {}", path.display(), e))
        })?;

        let total = points.len();
        let track: Vec<Coordinate> = points
            .into_iter()
            .enumerate()
            .filter_map(|(index, p)| match Coordinate::new(p.latitude, p.longitude) {
                Ok(coordinate) => Some(coordinate),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid track point");
                    None
                }
            })
            .collect();

        info!(
            path = %path.display(),
            points = track.len(),
            skipped = total - track.len(),
            "Replay track loaded"
        );
        Self::new(track, fix_interval)
    }

    /// Number of points not yet replayed
    pub fn remaining(&self) -> usize {
        self.track
            .len()
            .saturating_sub(self.cursor.load(Ordering::SeqCst))
    }

    fn subscriptions(&self) -> MutexGuard<'_, HashMap<SubscriptionId, JoinHandle<()>>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_fix(slot: &Mutex<Option<Coordinate>>) -> MutexGuard<'_, Option<Coordinate>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LocationSource for ReplayLocation {
    fn request_permission(&self) -> HostResult<bool> {
        Ok(true)
    }

    fn subscribe(&self, options: SubscribeOptions, sink: EventSender) -> HostResult<SubscriptionId> {
        let runtime = Handle::try_current()
            .map_err(|e| HostError::Internal(format!("No tokio runtime: {}", e)))?;

        let id = SubscriptionId::next();
        let track = self.track.clone();
        let cursor = self.cursor.clone();
        let last_fix = self.last_fix.clone();
        let fix_interval = self.fix_interval;
        let min_spacing = options.distance_interval_meters;

        let task = runtime.spawn(async move {
            loop {
                tokio::time::sleep(fix_interval).await;

                let index = cursor.fetch_add(1, Ordering::SeqCst);
                let Some(&coordinate) = track.get(index) else {
                    info!(subscription = %id, "Replay track exhausted");
                    break;
                };

                let previous = *lock_fix(&last_fix);
                if let Some(previous) = previous
                    && haversine_distance(&previous, &coordinate) < min_spacing
                {
                    debug!(subscription = %id, index, "Point within distance filter, skipped");
                    continue;
                }

                *lock_fix(&last_fix) = Some(coordinate);
                if sink
                    .send(TrackerEvent::Fix {
                        subscription: id,
                        coordinate,
                    })
                    .is_err()
                {
                    debug!(subscription = %id, "Event queue closed, replay exiting");
                    break;
                }
            }
        });

        self.subscriptions().insert(id, task);
        info!(
            subscription = %id,
            distance_interval_meters = min_spacing,
            remaining = self.remaining(),
            "Replay subscription started"
        );
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> HostResult<()> {
        let task = self
            .subscriptions()
            .remove(&subscription)
            .ok_or(HostError::SubscriptionNotFound(subscription))?;
        task.abort();
        info!(subscription = %subscription, "Replay subscription stopped");
        Ok(())
    }

    fn current_position(&self) -> HostResult<Coordinate> {
        let last = *lock_fix(&self.last_fix);
        Ok(last.unwrap_or(self.track[0]))
    }
}

impl Drop for ReplayLocation {
    fn drop(&mut self) {
        for (_, task) in self.subscriptions().drain() {
            task.abort();
        }
    }
}
