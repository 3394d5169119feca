//! Repeating timer on the tokio runtime

use pacer_api::TrackerEvent;
use pacer_host_api::{EventSender, HostError, HostResult, TimerSource};
use pacer_util::TimerId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info};

/// Timer source that spawns one tokio task per scheduled timer.
///
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub struct IntervalTimer {
    tasks: Mutex<HashMap<TimerId, JoinHandle<()>>>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TimerId, JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn active_count(&self) -> usize {
        self.tasks().len()
    }
}

impl TimerSource for IntervalTimer {
    fn schedule_repeating(&self, period: Duration, sink: EventSender) -> HostResult<TimerId> {
        let runtime = Handle::try_current()
            .map_err(|e| HostError::Internal(format!("No tokio runtime: {}", e)))?;

        let id = TimerId::next();
        let task = runtime.spawn(async move {
            // First tick one full period after scheduling
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if sink.send(TrackerEvent::Tick { timer: id }).is_err() {
                    debug!(timer = %id, "Event queue closed, timer exiting");
                    break;
                }
            }
        });

        self.tasks().insert(id, task);
        info!(timer = %id, period_ms = period.as_millis() as u64, "Timer scheduled");
        Ok(id)
    }

    fn cancel(&self, timer: TimerId) -> HostResult<()> {
        let task = self
            .tasks()
            .remove(&timer)
            .ok_or(HostError::TimerNotFound(timer))?;
        task.abort();
        info!(timer = %timer, "Timer cancelled");
        Ok(())
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        for (_, task) in self.tasks().drain() {
            task.abort();
        }
    }
}
