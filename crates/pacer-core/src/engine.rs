//! Session tracker state machine

use chrono::{DateTime, Local};
use pacer_api::{Coordinate, RunRecord, SessionSnapshot, SessionStatus, TrackerEvent};
use pacer_config::{ProfileSettings, TrackerSettings};
use pacer_host_api::{
    EventSender, HostError, LocationSource, SubscribeOptions, TimerSource, TICK_INTERVAL,
};
use pacer_store::HistoryStore;
use pacer_util::{SubscriptionId, TimerId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geo::{average_speed_kmh, estimate_calories};
use crate::{CoreEvent, SessionState};

/// Why a save was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SaveRejection {
    #[error("no time has been recorded")]
    NoElapsedTime,

    #[error("no distance has been recorded")]
    NoDistance,
}

/// Tracker errors
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Session is already running")]
    AlreadyRunning,

    #[error("Session is not running")]
    NotRunning,

    #[error("Stop the session before saving")]
    StillRunning,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Cannot save run: {0}")]
    SaveRejected(SaveRejection),

    #[error("Collaborator failure: {0}")]
    Host(#[from] HostError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// The session tracker
///
/// Owns the live [`SessionState`] and the handles of the timer and location
/// subscription feeding it. All input arrives either as a direct intent
/// (`start`, `stop`, `reset`, `save`) or as a [`TrackerEvent`] taken off the
/// queue and passed to [`SessionTracker::handle_event`].
pub struct SessionTracker {
    settings: TrackerSettings,
    profile: ProfileSettings,
    location: Arc<dyn LocationSource>,
    timer: Arc<dyn TimerSource>,
    history: Arc<HistoryStore>,
    sink: EventSender,
    state: SessionState,
    subscription: Option<SubscriptionId>,
    ticker: Option<TimerId>,
}

impl SessionTracker {
    pub fn new(
        settings: TrackerSettings,
        profile: ProfileSettings,
        location: Arc<dyn LocationSource>,
        timer: Arc<dyn TimerSource>,
        history: Arc<HistoryStore>,
        sink: EventSender,
    ) -> Self {
        info!(
            sample_interval_meters = settings.sample_interval_meters.meters(),
            recenter_on_fix = settings.recenter_on_fix,
            body_weight_kg = profile.body_weight_kg,
            "Session tracker initialized"
        );

        Self {
            settings,
            profile,
            location,
            timer,
            history,
            sink,
            state: SessionState::default(),
            subscription: None,
            ticker: None,
        }
    }

    /// Begin or resume recording
    pub fn start(&mut self) -> TrackerResult<CoreEvent> {
        if self.state.status() == SessionStatus::Running {
            return Err(TrackerError::AlreadyRunning);
        }

        if !self.location.request_permission()? {
            warn!("Location permission denied, session not started");
            return Err(TrackerError::PermissionDenied);
        }

        let options = SubscribeOptions {
            distance_interval_meters: self.settings.sample_interval_meters.meters(),
        };
        let subscription = self.location.subscribe(options, self.sink.clone())?;

        let ticker = match self.timer.schedule_repeating(TICK_INTERVAL, self.sink.clone()) {
            Ok(ticker) => ticker,
            Err(e) => {
                if let Err(unsub) = self.location.unsubscribe(subscription) {
                    warn!(subscription = %subscription, error = %unsub, "Failed to roll back subscription");
                }
                return Err(e.into());
            }
        };

        let resumed = self.state.status() == SessionStatus::Stopped;
        self.subscription = Some(subscription);
        self.ticker = Some(ticker);
        self.state.set_status(SessionStatus::Running);

        info!(
            subscription = %subscription,
            timer = %ticker,
            resumed,
            elapsed_seconds = self.state.elapsed_seconds(),
            "Session started"
        );

        Ok(CoreEvent::SessionStarted {
            resumed,
            elapsed_seconds: self.state.elapsed_seconds(),
        })
    }

    /// Pause recording. Timer and subscription are released before returning.
    pub fn stop(&mut self) -> TrackerResult<CoreEvent> {
        if self.state.status() != SessionStatus::Running {
            return Err(TrackerError::NotRunning);
        }

        self.release_sources();
        self.state.set_status(SessionStatus::Stopped);

        info!(
            elapsed_seconds = self.state.elapsed_seconds(),
            distance_meters = self.state.distance_meters(),
            points = self.state.route().len(),
            "Session stopped"
        );

        Ok(CoreEvent::SessionStopped {
            elapsed_seconds: self.state.elapsed_seconds(),
            distance_meters: self.state.distance_meters(),
        })
    }

    /// Discard the session from any state
    pub fn reset(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        if let Ok(stopped) = self.stop() {
            events.push(stopped);
        }

        self.state.clear();
        info!("Session reset");

        events.push(CoreEvent::SessionReset);
        events
    }

    /// Count one second; ignored unless running
    pub fn tick(&mut self) -> Option<CoreEvent> {
        if self.state.status() != SessionStatus::Running {
            return None;
        }

        let elapsed_seconds = self.state.record_tick();
        debug!(elapsed_seconds, "Tick");
        Some(CoreEvent::Ticked { elapsed_seconds })
    }

    /// Fold a position fix into the route; ignored unless running
    pub fn on_position_fix(&mut self, coordinate: Coordinate) -> Vec<CoreEvent> {
        if self.state.status() != SessionStatus::Running {
            debug!(%coordinate, status = ?self.state.status(), "Fix ignored, session not running");
            return Vec::new();
        }

        let segment_meters = self.state.record_fix(coordinate);
        let distance_meters = self.state.distance_meters();
        let points = self.state.route().len();

        debug!(%coordinate, segment_meters, distance_meters, points, "Route extended");

        let mut events = vec![CoreEvent::RouteExtended {
            coordinate,
            segment_meters,
            distance_meters,
            points,
        }];
        if self.settings.recenter_on_fix {
            events.push(CoreEvent::RecenterRequested { coordinate });
        }
        events
    }

    /// Apply one event from the queue.
    ///
    /// Events stamped with a timer or subscription that is no longer active
    /// are dropped.
    pub fn handle_event(&mut self, event: TrackerEvent) -> Vec<CoreEvent> {
        match event {
            TrackerEvent::Tick { timer } => {
                if self.ticker != Some(timer) {
                    debug!(timer = %timer, "Dropping tick from inactive timer");
                    return Vec::new();
                }
                self.tick().into_iter().collect()
            }
            TrackerEvent::Fix {
                subscription,
                coordinate,
            } => {
                if self.subscription != Some(subscription) {
                    warn!(subscription = %subscription, %coordinate, "Dropping fix from inactive subscription");
                    return Vec::new();
                }
                self.on_position_fix(coordinate)
            }
        }
    }

    /// Turn the stopped session into a run record, append it to history and
    /// reset. State is untouched when the save is refused.
    pub fn save(&mut self, saved_at: DateTime<Local>) -> TrackerResult<Vec<CoreEvent>> {
        if self.state.status() == SessionStatus::Running {
            return Err(TrackerError::StillRunning);
        }

        let elapsed_seconds = self.state.elapsed_seconds();
        let distance_meters = self.state.distance_meters();

        if distance_meters <= 0.0 && elapsed_seconds > 0 {
            return Err(TrackerError::SaveRejected(SaveRejection::NoDistance));
        }
        // Both are None exactly when elapsed_seconds is zero
        let (Some(speed), Some(calories)) = (
            average_speed_kmh(distance_meters, elapsed_seconds),
            estimate_calories(distance_meters, elapsed_seconds, self.profile.body_weight_kg),
        ) else {
            return Err(TrackerError::SaveRejected(SaveRejection::NoElapsedTime));
        };

        let record = RunRecord::new(elapsed_seconds, distance_meters, speed, calories, saved_at);
        info!(
            run_id = %record.id,
            elapsed_seconds,
            distance_meters,
            average_speed_kmh = speed,
            calories_kcal = calories,
            "Saving run"
        );

        let persisted = self.history.append(record.clone()).is_persisted();

        let mut events = vec![CoreEvent::RunSaved { record, persisted }];
        events.extend(self.reset());
        Ok(events)
    }

    /// One-shot position read for map recentering. Never touches the route.
    pub fn locate(&self) -> TrackerResult<Coordinate> {
        let coordinate = self.location.current_position()?;
        debug!(%coordinate, "Located");
        Ok(coordinate)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.state.elapsed_seconds()
    }

    pub fn distance_meters(&self) -> f64 {
        self.state.distance_meters()
    }

    pub fn route(&self) -> &[Coordinate] {
        self.state.route()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    fn release_sources(&mut self) {
        if let Some(ticker) = self.ticker.take()
            && let Err(e) = self.timer.cancel(ticker)
        {
            warn!(timer = %ticker, error = %e, "Failed to cancel timer");
        }

        if let Some(subscription) = self.subscription.take()
            && let Err(e) = self.location.unsubscribe(subscription)
        {
            warn!(subscription = %subscription, error = %e, "Failed to unsubscribe");
        }
    }
}

impl Drop for SessionTracker {
    fn drop(&mut self) {
        self.release_sources();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pacer_config::SampleInterval;
    use pacer_host_api::{event_channel, EventReceiver, MockLocation, MockTimer};
    use pacer_store::MemoryPersistence;

    struct Harness {
        tracker: SessionTracker,
        location: Arc<MockLocation>,
        timer: Arc<MockTimer>,
        persistence: Arc<MemoryPersistence>,
        rx: EventReceiver,
    }

    impl Harness {
        fn new() -> Self {
            Self::with(TrackerSettings::default(), MockLocation::new())
        }

        fn with(settings: TrackerSettings, location: MockLocation) -> Self {
            let location = Arc::new(location);
            let timer = Arc::new(MockTimer::new());
            let persistence = Arc::new(MemoryPersistence::new());
            let history = Arc::new(HistoryStore::load_all(persistence.clone()));
            let (tx, rx) = event_channel();

            let tracker = SessionTracker::new(
                settings,
                ProfileSettings::default(),
                location.clone(),
                timer.clone(),
                history,
                tx,
            );

            Self {
                tracker,
                location,
                timer,
                persistence,
                rx,
            }
        }

        /// Process every queued event in arrival order
        fn drain(&mut self) -> Vec<CoreEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.extend(self.tracker.handle_event(event));
            }
            events
        }

        fn fix(&mut self, lat: f64, lon: f64) -> Vec<CoreEvent> {
            self.location.emit_fix(coord(lat, lon));
            self.drain()
        }

        fn ticks(&mut self, n: usize) -> Vec<CoreEvent> {
            self.timer.fire(n);
            self.drain()
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn saved_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 7, 30, 45).unwrap()
    }

    #[test]
    fn start_subscribes_and_schedules() {
        let settings = TrackerSettings {
            sample_interval_meters: SampleInterval::Ten,
            recenter_on_fix: true,
        };
        let mut h = Harness::with(settings, MockLocation::new());

        let event = h.tracker.start().unwrap();
        assert_eq!(
            event,
            CoreEvent::SessionStarted {
                resumed: false,
                elapsed_seconds: 0
            }
        );
        assert_eq!(h.tracker.status(), SessionStatus::Running);

        let subs = h.location.active_subscriptions();
        assert_eq!(subs.len(), 1);
        assert_eq!(
            h.location.options_for(subs[0]).unwrap().distance_interval_meters,
            10.0
        );

        let timers = h.timer.active_timers();
        assert_eq!(timers.len(), 1);
        assert_eq!(h.timer.interval_of(timers[0]), Some(TICK_INTERVAL));
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();

        assert!(matches!(h.tracker.start(), Err(TrackerError::AlreadyRunning)));
        assert_eq!(h.location.active_subscriptions().len(), 1);
        assert_eq!(h.timer.active_timers().len(), 1);
    }

    #[test]
    fn permission_denied_stays_idle() {
        let mut h = Harness::with(TrackerSettings::default(), MockLocation::denying_permission());

        assert!(matches!(h.tracker.start(), Err(TrackerError::PermissionDenied)));
        assert_eq!(h.tracker.status(), SessionStatus::Idle);
        assert!(h.location.active_subscriptions().is_empty());
        assert!(h.timer.active_timers().is_empty());
    }

    #[test]
    fn timer_failure_rolls_back_subscription() {
        let mut h = Harness::new();
        *h.timer.fail_schedule.lock().unwrap() = true;

        assert!(matches!(h.tracker.start(), Err(TrackerError::Host(_))));
        assert_eq!(h.tracker.status(), SessionStatus::Idle);
        assert!(h.location.active_subscriptions().is_empty());
    }

    #[test]
    fn subscribe_failure_leaves_state_alone() {
        let mut h = Harness::new();
        *h.location.fail_subscribe.lock().unwrap() = true;

        assert!(matches!(h.tracker.start(), Err(TrackerError::Host(_))));
        assert_eq!(h.tracker.status(), SessionStatus::Idle);
        assert!(h.timer.active_timers().is_empty());
    }

    #[test]
    fn ticks_count_only_while_running() {
        let mut h = Harness::new();
        assert_eq!(h.tracker.tick(), None);

        h.tracker.start().unwrap();
        let events = h.ticks(7);
        assert_eq!(events.len(), 7);
        assert_eq!(events.last(), Some(&CoreEvent::Ticked { elapsed_seconds: 7 }));
        assert_eq!(h.tracker.elapsed_seconds(), 7);

        h.tracker.stop().unwrap();
        assert_eq!(h.tracker.tick(), None);
        assert_eq!(h.tracker.elapsed_seconds(), 7);
    }

    #[test]
    fn fixes_accumulate_distance() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();

        let first = h.fix(-23.5505, -46.6333);
        assert_eq!(
            first[0],
            CoreEvent::RouteExtended {
                coordinate: coord(-23.5505, -46.6333),
                segment_meters: 0.0,
                distance_meters: 0.0,
                points: 1
            }
        );

        h.fix(-23.5515, -46.6343);
        let expected = crate::haversine_distance(
            &coord(-23.5505, -46.6333),
            &coord(-23.5515, -46.6343),
        );
        assert!((h.tracker.distance_meters() - expected).abs() < 1e-9);
        assert_eq!(h.tracker.route().len(), 2);
    }

    #[test]
    fn recenter_follows_setting() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        let events = h.fix(1.0, 1.0);
        assert!(events.contains(&CoreEvent::RecenterRequested {
            coordinate: coord(1.0, 1.0)
        }));

        let settings = TrackerSettings {
            recenter_on_fix: false,
            ..TrackerSettings::default()
        };
        let mut h = Harness::with(settings, MockLocation::new());
        h.tracker.start().unwrap();
        let events = h.fix(1.0, 1.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], CoreEvent::RouteExtended { .. }));
    }

    #[test]
    fn stop_releases_sources() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.ticks(3);

        let event = h.tracker.stop().unwrap();
        assert!(matches!(
            event,
            CoreEvent::SessionStopped {
                elapsed_seconds: 3,
                ..
            }
        ));
        assert!(h.location.active_subscriptions().is_empty());
        assert!(h.timer.active_timers().is_empty());
        assert_eq!(*h.location.unsubscribe_calls.lock().unwrap(), 1);
    }

    #[test]
    fn stop_when_not_running_is_rejected() {
        let mut h = Harness::new();
        assert!(matches!(h.tracker.stop(), Err(TrackerError::NotRunning)));
    }

    #[test]
    fn in_flight_events_after_stop_are_dropped() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.fix(0.0, 0.001);
        let before = h.tracker.snapshot();

        // Queue events, then stop before they are processed
        h.location.emit_fix(coord(0.0, 0.002));
        h.timer.fire(2);
        h.tracker.stop().unwrap();

        assert!(h.drain().is_empty());
        let after = h.tracker.snapshot();
        assert_eq!(after.route, before.route);
        assert_eq!(after.distance_meters, before.distance_meters);
        assert_eq!(after.elapsed_seconds, before.elapsed_seconds);
    }

    #[test]
    fn direct_fix_after_stop_is_ignored() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.tracker.stop().unwrap();

        assert!(h.tracker.on_position_fix(coord(0.0, 0.01)).is_empty());
        assert_eq!(h.tracker.route().len(), 1);
        assert_eq!(h.tracker.distance_meters(), 0.0);
    }

    #[test]
    fn stale_handles_from_previous_run_are_dropped() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        let old_timer = h.timer.active_timers()[0];
        let old_sub = h.location.active_subscriptions()[0];
        h.tracker.stop().unwrap();

        let resumed = h.tracker.start().unwrap();
        assert_eq!(
            resumed,
            CoreEvent::SessionStarted {
                resumed: true,
                elapsed_seconds: 0
            }
        );

        assert!(h.tracker.handle_event(TrackerEvent::Tick { timer: old_timer }).is_empty());
        assert!(h
            .tracker
            .handle_event(TrackerEvent::Fix {
                subscription: old_sub,
                coordinate: coord(5.0, 5.0)
            })
            .is_empty());
        assert_eq!(h.tracker.elapsed_seconds(), 0);
        assert!(h.tracker.route().is_empty());
    }

    #[test]
    fn resume_continues_route() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.ticks(5);
        h.tracker.stop().unwrap();

        h.tracker.start().unwrap();
        h.ticks(5);
        h.fix(0.0, 0.001);

        assert_eq!(h.tracker.elapsed_seconds(), 10);
        let expected = crate::haversine_distance(&coord(0.0, 0.0), &coord(0.0, 0.001));
        assert!((h.tracker.distance_meters() - expected).abs() < 1e-9);
    }

    #[test]
    fn reset_from_any_state() {
        let mut h = Harness::new();
        let events = h.tracker.reset();
        assert_eq!(events, vec![CoreEvent::SessionReset]);

        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.fix(0.0, 0.001);
        h.ticks(4);

        let events = h.tracker.reset();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], CoreEvent::SessionStopped { .. }));
        assert!(h.timer.active_timers().is_empty());
        assert!(h.location.active_subscriptions().is_empty());

        let snapshot = h.tracker.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert_eq!(snapshot.elapsed_seconds, 0);
        assert_eq!(snapshot.distance_meters, 0.0);
        assert!(snapshot.route.is_empty());
    }

    #[test]
    fn reset_from_stopped_clears_route() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.fix(0.0, 0.001);
        h.ticks(6);
        h.tracker.stop().unwrap();
        assert_eq!(h.tracker.route().len(), 2);
        assert!(h.tracker.distance_meters() > 0.0);

        let events = h.tracker.reset();
        assert_eq!(events, vec![CoreEvent::SessionReset]);

        let snapshot = h.tracker.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Idle);
        assert_eq!(snapshot.elapsed_seconds, 0);
        assert_eq!(snapshot.distance_meters, 0.0);
        assert!(snapshot.route.is_empty());
        assert!(h.tracker.history().is_empty());
    }

    #[test]
    fn save_without_elapsed_time_is_rejected() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.tracker.stop().unwrap();

        let result = h.tracker.save(saved_at());
        assert!(matches!(
            result,
            Err(TrackerError::SaveRejected(SaveRejection::NoElapsedTime))
        ));
        assert_eq!(h.tracker.status(), SessionStatus::Stopped);
        assert!(h.tracker.history().is_empty());
        assert!(h.persistence.payload().is_none());
    }

    #[test]
    fn save_without_distance_is_rejected() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(3.0, 3.0);
        h.fix(3.0, 3.0);
        h.ticks(30);
        h.tracker.stop().unwrap();

        let result = h.tracker.save(saved_at());
        assert!(matches!(
            result,
            Err(TrackerError::SaveRejected(SaveRejection::NoDistance))
        ));
        assert_eq!(h.tracker.elapsed_seconds(), 30);
        assert_eq!(h.tracker.route().len(), 2);
        assert!(h.tracker.history().is_empty());
    }

    #[test]
    fn save_while_running_is_rejected() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.fix(0.0, 0.001);
        h.ticks(5);

        assert!(matches!(h.tracker.save(saved_at()), Err(TrackerError::StillRunning)));
        assert_eq!(h.tracker.status(), SessionStatus::Running);
        assert!(h.tracker.history().is_empty());
    }

    #[test]
    fn save_records_run_and_resets() {
        let mut h = Harness::new();
        h.tracker.start().unwrap();
        h.fix(-23.5505, -46.6333);
        h.fix(-23.5515, -46.6343);
        h.ticks(10);
        h.tracker.stop().unwrap();
        let distance = h.tracker.distance_meters();

        let events = h.tracker.save(saved_at()).unwrap();
        let CoreEvent::RunSaved { record, persisted } = &events[0] else {
            panic!("expected RunSaved, got {:?}", events[0]);
        };
        assert!(persisted);
        assert_eq!(record.elapsed_seconds, 10);
        assert_eq!(record.distance_meters, distance);
        assert!((record.average_speed_kmh - distance / 1000.0 / (10.0 / 3600.0)).abs() < 1e-9);
        assert!((record.calories_kcal - 2.000833).abs() < 1e-6);
        assert_eq!(record.time_of_day.to_string(), "07:30:00");
        assert_eq!(events.last(), Some(&CoreEvent::SessionReset));

        assert_eq!(h.tracker.status(), SessionStatus::Idle);
        assert_eq!(h.tracker.elapsed_seconds(), 0);
        assert_eq!(h.tracker.history().len(), 1);
        assert!(h.persistence.payload().is_some());
    }

    #[test]
    fn save_uses_profile_weight() {
        let location = Arc::new(MockLocation::new());
        let timer = Arc::new(MockTimer::new());
        let history = Arc::new(HistoryStore::load_all(Arc::new(MemoryPersistence::new())));
        let (tx, mut rx) = event_channel();
        let mut tracker = SessionTracker::new(
            TrackerSettings::default(),
            ProfileSettings { body_weight_kg: 140.0 },
            location.clone(),
            timer.clone(),
            history,
            tx,
        );

        tracker.start().unwrap();
        location.emit_fix(coord(-23.5505, -46.6333));
        location.emit_fix(coord(-23.5515, -46.6343));
        timer.fire(10);
        while let Ok(event) = rx.try_recv() {
            tracker.handle_event(event);
        }
        tracker.stop().unwrap();
        tracker.save(saved_at()).unwrap();

        let record = tracker.history().latest().unwrap();
        assert!((record.calories_kcal - 2.0 * 2.000833).abs() < 1e-5);
    }

    #[test]
    fn save_survives_persistence_failure() {
        let mut h = Harness::new();
        *h.persistence.fail_save.lock().unwrap() = true;

        h.tracker.start().unwrap();
        h.fix(0.0, 0.0);
        h.fix(0.0, 0.001);
        h.ticks(20);
        h.tracker.stop().unwrap();

        let events = h.tracker.save(saved_at()).unwrap();
        assert!(matches!(events[0], CoreEvent::RunSaved { persisted: false, .. }));
        assert_eq!(h.tracker.history().len(), 1);
        assert_eq!(h.tracker.status(), SessionStatus::Idle);
    }

    #[test]
    fn locate_does_not_touch_route() {
        let mut h = Harness::new();
        assert!(matches!(h.tracker.locate(), Err(TrackerError::Host(_))));

        h.location.set_current(coord(12.0, 34.0));
        assert_eq!(h.tracker.locate().unwrap(), coord(12.0, 34.0));

        h.tracker.start().unwrap();
        h.location.set_current(coord(12.0, 34.5));
        h.tracker.locate().unwrap();
        assert!(h.tracker.route().is_empty());
        assert_eq!(h.tracker.distance_meters(), 0.0);
    }

    #[test]
    fn drop_releases_sources() {
        let h = Harness::new();
        let location = h.location.clone();
        let timer = h.timer.clone();
        let mut tracker = h.tracker;
        tracker.start().unwrap();

        drop(tracker);
        assert!(location.active_subscriptions().is_empty());
        assert!(timer.active_timers().is_empty());
    }
}
