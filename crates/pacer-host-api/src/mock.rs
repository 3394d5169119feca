//! Mock collaborators for testing

use pacer_api::{Coordinate, TrackerEvent};
use pacer_util::{SubscriptionId, TimerId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::{
    EventSender, HostError, HostResult, LocationSource, SubscribeOptions, TimerSource,
};

/// Mock location source for unit/integration testing
///
/// Fixes are only delivered when a test calls [`MockLocation::emit_fix`].
pub struct MockLocation {
    subscriptions: Mutex<HashMap<SubscriptionId, (SubscribeOptions, EventSender)>>,
    current: Mutex<Option<Coordinate>>,

    /// Configure permission to be denied
    pub deny_permission: Mutex<bool>,

    /// Configure subscribe to fail
    pub fail_subscribe: Mutex<bool>,

    /// Number of unsubscribe calls seen
    pub unsubscribe_calls: Mutex<usize>,
}

impl MockLocation {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            deny_permission: Mutex::new(false),
            fail_subscribe: Mutex::new(false),
            unsubscribe_calls: Mutex::new(0),
        }
    }

    pub fn denying_permission() -> Self {
        let mock = Self::new();
        *mock.deny_permission.lock().unwrap() = true;
        mock
    }

    /// Deliver a fix to every active subscription.
    /// Returns the number of subscriptions it reached.
    pub fn emit_fix(&self, coordinate: Coordinate) -> usize {
        *self.current.lock().unwrap() = Some(coordinate);

        let subscriptions = self.subscriptions.lock().unwrap();
        for (id, (_, sink)) in subscriptions.iter() {
            let _ = sink.send(TrackerEvent::Fix {
                subscription: *id,
                coordinate,
            });
        }
        subscriptions.len()
    }

    /// Set the value returned by `current_position`
    pub fn set_current(&self, coordinate: Coordinate) {
        *self.current.lock().unwrap() = Some(coordinate);
    }

    pub fn active_subscriptions(&self) -> Vec<SubscriptionId> {
        self.subscriptions.lock().unwrap().keys().copied().collect()
    }

    /// Options passed to an active subscription
    pub fn options_for(&self, subscription: SubscriptionId) -> Option<SubscribeOptions> {
        self.subscriptions
            .lock()
            .unwrap()
            .get(&subscription)
            .map(|(options, _)| *options)
    }
}

impl Default for MockLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationSource for MockLocation {
    fn request_permission(&self) -> HostResult<bool> {
        Ok(!*self.deny_permission.lock().unwrap())
    }

    fn subscribe(&self, options: SubscribeOptions, sink: EventSender) -> HostResult<SubscriptionId> {
        if *self.fail_subscribe.lock().unwrap() {
            return Err(HostError::LocationUnavailable("Mock subscribe failure".into()));
        }

        let id = SubscriptionId::next();
        self.subscriptions.lock().unwrap().insert(id, (options, sink));
        Ok(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> HostResult<()> {
        *self.unsubscribe_calls.lock().unwrap() += 1;

        match self.subscriptions.lock().unwrap().remove(&subscription) {
            Some(_) => Ok(()),
            None => Err(HostError::SubscriptionNotFound(subscription)),
        }
    }

    fn current_position(&self) -> HostResult<Coordinate> {
        self.current
            .lock()
            .unwrap()
            .ok_or_else(|| HostError::LocationUnavailable("No fix yet".into()))
    }
}

/// Mock timer for unit/integration testing
///
/// Ticks are only delivered when a test calls [`MockTimer::fire`].
pub struct MockTimer {
    timers: Mutex<HashMap<TimerId, (Duration, EventSender)>>,

    /// Configure scheduling to fail
    pub fail_schedule: Mutex<bool>,
}

impl MockTimer {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            fail_schedule: Mutex::new(false),
        }
    }

    /// Fire every active timer `times` times.
    /// Returns the number of timers that fired.
    pub fn fire(&self, times: usize) -> usize {
        let timers = self.timers.lock().unwrap();
        for (id, (_, sink)) in timers.iter() {
            for _ in 0..times {
                let _ = sink.send(TrackerEvent::Tick { timer: *id });
            }
        }
        timers.len()
    }

    pub fn active_timers(&self) -> Vec<TimerId> {
        self.timers.lock().unwrap().keys().copied().collect()
    }

    pub fn interval_of(&self, timer: TimerId) -> Option<Duration> {
        self.timers.lock().unwrap().get(&timer).map(|(i, _)| *i)
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSource for MockTimer {
    fn schedule_repeating(&self, interval: Duration, sink: EventSender) -> HostResult<TimerId> {
        if *self.fail_schedule.lock().unwrap() {
            return Err(HostError::Internal("Mock schedule failure".into()));
        }

        let id = TimerId::next();
        self.timers.lock().unwrap().insert(id, (interval, sink));
        Ok(id)
    }

    fn cancel(&self, timer: TimerId) -> HostResult<()> {
        match self.timers.lock().unwrap().remove(&timer) {
            Some(_) => Ok(()),
            None => Err(HostError::TimerNotFound(timer)),
        }
    }
}
