//! Great-circle distance and derived run metrics

use pacer_api::Coordinate;

/// Mean Earth radius used for all distance calculations
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// MET for runs at or below [`FAST_PACE_THRESHOLD_KMH`]
pub const MET_MODERATE: f64 = 8.0;

/// MET for runs above [`FAST_PACE_THRESHOLD_KMH`]
pub const MET_VIGOROUS: f64 = 9.8;

/// Average speed strictly above which the vigorous MET applies
pub const FAST_PACE_THRESHOLD_KMH: f64 = 8.0;

/// Great-circle distance between two coordinates, in meters.
///
/// Uses the haversine form, which stays accurate for the few-meter segments
/// produced by GPS sampling. Identical points return exactly zero.
pub fn haversine_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.longitude() - a.longitude()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c * 1000.0
}

/// Average speed in km/h, or `None` when no time has elapsed
pub fn average_speed_kmh(distance_meters: f64, elapsed_seconds: u64) -> Option<f64> {
    if elapsed_seconds == 0 {
        return None;
    }
    Some((distance_meters / 1000.0) / (elapsed_seconds as f64 / 3600.0))
}

/// MET constant for a given average speed
pub fn met_for_speed(speed_kmh: f64) -> f64 {
    if speed_kmh > FAST_PACE_THRESHOLD_KMH {
        MET_VIGOROUS
    } else {
        MET_MODERATE
    }
}

/// Estimated energy expenditure in kcal, or `None` when no time has elapsed
pub fn estimate_calories(
    distance_meters: f64,
    elapsed_seconds: u64,
    body_weight_kg: f64,
) -> Option<f64> {
    let speed = average_speed_kmh(distance_meters, elapsed_seconds)?;
    let met = met_for_speed(speed);
    let minutes = elapsed_seconds as f64 / 60.0;
    Some(met * 3.5 * body_weight_kg / 200.0 * minutes)
}
