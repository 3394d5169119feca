//! Live session state

use pacer_api::{Coordinate, SessionSnapshot, SessionStatus};

use crate::geo::haversine_distance;

/// The mutable state of the session being recorded.
///
/// Owned exclusively by [`crate::SessionTracker`]. `distance_meters` is kept
/// equal to the sum of haversine distances between consecutive route points
/// by folding in each new point as it is appended.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    status: SessionStatus,
    elapsed_seconds: u64,
    distance_meters: f64,
    route: Vec<Coordinate>,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn route(&self) -> &[Coordinate] {
        &self.route
    }

    /// Count one elapsed second
    pub(crate) fn record_tick(&mut self) -> u64 {
        self.elapsed_seconds += 1;
        self.elapsed_seconds
    }

    /// Append a point and return the length of the new segment in meters
    pub(crate) fn record_fix(&mut self, coordinate: Coordinate) -> f64 {
        let segment = self
            .route
            .last()
            .map(|previous| haversine_distance(previous, &coordinate))
            .unwrap_or(0.0);

        self.route.push(coordinate);
        self.distance_meters += segment;
        segment
    }

    /// Back to an empty idle session
    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            elapsed_seconds: self.elapsed_seconds,
            distance_meters: self.distance_meters,
            route: self.route.clone(),
        }
    }
}
