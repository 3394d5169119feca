//! Saved run records

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Timelike};
use pacer_util::RunId;
use serde::{Deserialize, Serialize};

/// Immutable summary of one completed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Stable identifier. History loading assigns [`RunRecord::content_id`]
    /// to records persisted without one.
    #[serde(default)]
    pub id: RunId,

    pub elapsed_seconds: u64,

    pub distance_meters: f64,

    pub average_speed_kmh: f64,

    pub calories_kcal: f64,

    /// Local calendar date the run was saved
    pub date: NaiveDate,

    /// Local time of day the run was saved, minute precision
    #[serde(with = "hhmm")]
    pub time_of_day: NaiveTime,
}

impl RunRecord {
    pub fn new(
        elapsed_seconds: u64,
        distance_meters: f64,
        average_speed_kmh: f64,
        calories_kcal: f64,
        saved_at: DateTime<Local>,
    ) -> Self {
        let time = saved_at.time();
        let time_of_day = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);

        Self {
            id: RunId::new(),
            elapsed_seconds,
            distance_meters,
            average_speed_kmh,
            calories_kcal,
            date: saved_at.date_naive(),
            time_of_day,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Id derived from the record's fields and its position in the log.
    /// Independent of the current `id`.
    pub fn content_id(&self, position: usize) -> RunId {
        let name = format!(
            "{}|{}T{}|{}|{}|{}|{}",
            position,
            self.date,
            self.time_of_day.format("%H:%M"),
            self.elapsed_seconds,
            self.distance_meters,
            self.average_speed_kmh,
            self.calories_kcal,
        );
        RunId::derived(name.as_bytes())
    }
}

/// `HH:MM` (de)serialization for time-of-day fields
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
