//! In-memory backend

use std::sync::Mutex;

use crate::{Persistence, StoreError, StoreResult};

/// Keeps the payload in memory; failures can be injected for tests
#[derive(Default)]
pub struct MemoryPersistence {
    payload: Mutex<Option<Vec<u8>>>,

    /// Configure load to fail
    pub fail_load: Mutex<bool>,

    /// Configure save to fail
    pub fail_save: Mutex<bool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing payload
    pub fn with_payload(payload: impl Into<Vec<u8>>) -> Self {
        let persistence = Self::new();
        if let Ok(mut slot) = persistence.payload.lock() {
            *slot = Some(payload.into());
        }
        persistence
    }

    /// Current payload
    pub fn payload(&self) -> Option<Vec<u8>> {
        self.payload.lock().ok().and_then(|p| p.clone())
    }

    fn flag(flag: &Mutex<bool>) -> bool {
        flag.lock().map(|f| *f).unwrap_or(false)
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        if Self::flag(&self.fail_load) {
            return Err(StoreError::Unavailable("memory load failure".into()));
        }
        Ok(self.payload())
    }

    fn save(&self, payload: &[u8]) -> StoreResult<()> {
        if Self::flag(&self.fail_save) {
            return Err(StoreError::Unavailable("memory save failure".into()));
        }

        let mut slot = self
            .payload
            .lock()
            .map_err(|_| StoreError::Unavailable("payload lock poisoned".into()))?;
        *slot = Some(payload.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}
