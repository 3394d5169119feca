//! Append-only run history

use pacer_api::RunRecord;
use pacer_util::RunId;
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use crate::{Persistence, StoreError};

/// Saved runs, oldest first
pub type HistoryLog = Vec<RunRecord>;

/// A persisted record whose `id` may be absent
#[derive(Deserialize)]
struct StoredRecord {
    id: Option<RunId>,
    #[serde(flatten)]
    record: RunRecord,
}

/// Parse a persisted log. Records without an id get their content id.
/// Returns the log and how many ids were assigned.
fn decode(payload: &[u8]) -> Result<(HistoryLog, usize), serde_json::Error> {
    let stored: Vec<StoredRecord> = serde_json::from_slice(payload)?;
    let mut assigned = 0;

    let records = stored
        .into_iter()
        .enumerate()
        .map(|(position, StoredRecord { id, mut record })| {
            record.id = match id {
                Some(id) => id,
                None => {
                    assigned += 1;
                    record.content_id(position)
                }
            };
            record
        })
        .collect();

    Ok((records, assigned))
}

/// Result of appending a record
#[derive(Debug)]
pub enum AppendOutcome {
    /// Record is in memory and the full log was written to the backend
    Persisted,

    /// Record is in memory but the backend write failed.
    /// Memory stays ahead of disk until the next successful append.
    InMemoryOnly { error: StoreError },
}

impl AppendOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, AppendOutcome::Persisted)
    }
}

/// Owns the history log and keeps its backend in sync.
///
/// Appends hold the log lock across serialization and the backend write, so
/// concurrent appends land on disk in the same total order as in memory.
pub struct HistoryStore {
    persistence: Arc<dyn Persistence>,
    records: Mutex<HistoryLog>,
}

impl HistoryStore {
    /// Load the persisted log once at startup.
    ///
    /// Never fails: a missing, unreadable or unparsable payload yields an
    /// empty history and a logged warning.
    pub fn load_all(persistence: Arc<dyn Persistence>) -> Self {
        let records = match persistence.load() {
            Ok(Some(payload)) => match decode(&payload) {
                Ok((records, assigned)) => {
                    info!(
                        backend = %persistence.describe(),
                        count = records.len(),
                        assigned_ids = assigned,
                        "History loaded"
                    );
                    if assigned > 0 {
                        Self::write_back(persistence.as_ref(), &records);
                    }
                    records
                }
                Err(e) => {
                    warn!(
                        backend = %persistence.describe(),
                        error = %e,
                        "History data is malformed, starting with empty history"
                    );
                    Vec::new()
                }
            },
            Ok(None) => {
                info!(backend = %persistence.describe(), "No saved history");
                Vec::new()
            }
            Err(e) => {
                warn!(
                    backend = %persistence.describe(),
                    error = %e,
                    "Failed to load history, starting with empty history"
                );
                Vec::new()
            }
        };

        Self {
            persistence,
            records: Mutex::new(records),
        }
    }

    /// Persist ids assigned at load. Failure is harmless: the same ids are
    /// derived again on the next load.
    fn write_back(persistence: &dyn Persistence, records: &HistoryLog) {
        let result = serde_json::to_vec_pretty(records)
            .map_err(StoreError::from)
            .and_then(|payload| persistence.save(&payload));

        if let Err(e) = result {
            warn!(
                backend = %persistence.describe(),
                error = %e,
                "Failed to persist assigned run ids"
            );
        }
    }

    fn records(&self) -> MutexGuard<'_, HistoryLog> {
        // The log is only ever pushed to, so a poisoned guard still holds a valid log
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record and persist the full log
    pub fn append(&self, record: RunRecord) -> AppendOutcome {
        let mut records = self.records();
        let run_id = record.id;
        records.push(record);

        let result = serde_json::to_vec_pretty(&*records)
            .map_err(StoreError::from)
            .and_then(|payload| self.persistence.save(&payload));

        match result {
            Ok(()) => {
                info!(run_id = %run_id, count = records.len(), "Run appended to history");
                AppendOutcome::Persisted
            }
            Err(error) => {
                warn!(
                    run_id = %run_id,
                    backend = %self.persistence.describe(),
                    error = %error,
                    "Failed to persist history, keeping run in memory only"
                );
                AppendOutcome::InMemoryOnly { error }
            }
        }
    }

    /// Copy of the whole log, oldest first
    pub fn list(&self) -> HistoryLog {
        self.records().clone()
    }

    /// Most recently appended record
    pub fn latest(&self) -> Option<RunRecord> {
        self.records().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JsonFilePersistence, MemoryPersistence};
    use chrono::{Local, TimeZone};

    fn record(elapsed_seconds: u64, distance_meters: f64) -> RunRecord {
        let saved_at = Local.with_ymd_and_hms(2025, 5, 2, 6, 45, 0).unwrap();
        RunRecord::new(elapsed_seconds, distance_meters, 10.0, 50.0, saved_at)
    }

    #[test]
    fn empty_backend_loads_empty() {
        let store = HistoryStore::load_all(Arc::new(MemoryPersistence::new()));
        assert!(store.is_empty());
        assert!(store.latest().is_none());
    }

    #[test]
    fn corrupt_payload_loads_empty() {
        let persistence = Arc::new(MemoryPersistence::with_payload("{not json"));
        let store = HistoryStore::load_all(persistence);
        assert!(store.is_empty());
    }

    #[test]
    fn failing_load_loads_empty() {
        let persistence = MemoryPersistence::new();
        *persistence.fail_load.lock().unwrap() = true;

        let store = HistoryStore::load_all(Arc::new(persistence));
        assert!(store.is_empty());
    }

    const LEGACY_PAYLOAD: &str = r#"[
        {"elapsed_seconds": 10, "distance_meters": 150.8, "average_speed_kmh": 54.3,
         "calories_kcal": 2.0, "date": "2024-11-03", "time_of_day": "07:15"},
        {"elapsed_seconds": 10, "distance_meters": 150.8, "average_speed_kmh": 54.3,
         "calories_kcal": 2.0, "date": "2024-11-03", "time_of_day": "07:15"}
    ]"#;

    #[test]
    fn missing_ids_are_stable_across_loads() {
        let load = || {
            let persistence = MemoryPersistence::with_payload(LEGACY_PAYLOAD);
            *persistence.fail_save.lock().unwrap() = true;
            HistoryStore::load_all(Arc::new(persistence)).list()
        };

        let first = load();
        let second = load();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, second[0].id);
        assert_eq!(first[1].id, second[1].id);
        // Identical runs still get distinct keys
        assert_ne!(first[0].id, first[1].id);
    }

    #[test]
    fn assigned_ids_are_written_back() {
        let persistence = Arc::new(MemoryPersistence::with_payload(LEGACY_PAYLOAD));
        let store = HistoryStore::load_all(persistence.clone());

        let saved: HistoryLog = serde_json::from_slice(&persistence.payload().unwrap()).unwrap();
        assert_eq!(saved, store.list());

        let reloaded = HistoryStore::load_all(persistence);
        assert_eq!(reloaded.list(), store.list());
    }

    #[test]
    fn stored_ids_are_kept() {
        let persistence = Arc::new(MemoryPersistence::new());
        let saved = record(60, 200.0);
        HistoryStore::load_all(persistence.clone()).append(saved.clone());

        let payload_before = persistence.payload();
        let reloaded = HistoryStore::load_all(persistence.clone());
        assert_eq!(reloaded.latest().unwrap().id, saved.id);
        assert_eq!(persistence.payload(), payload_before);
    }

    #[test]
    fn append_preserves_order_and_persists() {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = HistoryStore::load_all(persistence.clone());

        let first = record(60, 200.0);
        let second = record(120, 450.0);
        assert!(store.append(first.clone()).is_persisted());
        assert!(store.append(second.clone()).is_persisted());

        assert_eq!(store.list(), vec![first.clone(), second.clone()]);
        assert_eq!(store.latest(), Some(second.clone()));

        let saved: HistoryLog = serde_json::from_slice(&persistence.payload().unwrap()).unwrap();
        assert_eq!(saved, vec![first, second]);
    }

    #[test]
    fn append_failure_keeps_record_in_memory() {
        let persistence = Arc::new(MemoryPersistence::new());
        *persistence.fail_save.lock().unwrap() = true;
        let store = HistoryStore::load_all(persistence.clone());

        let outcome = store.append(record(60, 200.0));
        assert!(matches!(outcome, AppendOutcome::InMemoryOnly { .. }));
        assert_eq!(store.len(), 1);
        assert!(persistence.payload().is_none());

        // Next successful append catches the backend up
        *persistence.fail_save.lock().unwrap() = false;
        assert!(store.append(record(30, 100.0)).is_persisted());
        let saved: HistoryLog = serde_json::from_slice(&persistence.payload().unwrap()).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[test]
    fn reload_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let store = HistoryStore::load_all(Arc::new(JsonFilePersistence::new(&path)));
        let saved = record(600, 1500.0);
        store.append(saved.clone());

        let reloaded = HistoryStore::load_all(Arc::new(JsonFilePersistence::new(&path)));
        assert_eq!(reloaded.list(), vec![saved]);
    }

    #[test]
    fn concurrent_appends_are_totally_ordered() {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = Arc::new(HistoryStore::load_all(persistence.clone()));

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.append(record(i, i as f64 * 100.0)))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_persisted());
        }

        let saved: HistoryLog = serde_json::from_slice(&persistence.payload().unwrap()).unwrap();
        assert_eq!(saved, store.list());
        assert_eq!(saved.len(), 8);
    }
}
