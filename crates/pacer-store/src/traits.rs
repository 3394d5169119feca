//! Persistence collaborator trait

use crate::StoreResult;

/// Byte-level storage for the serialized history log.
///
/// Backends know nothing about the record format; they hold one opaque
/// payload and replace it wholesale on every save.
pub trait Persistence: Send + Sync {
    /// Load the last saved payload, `None` if nothing was ever saved
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replace the stored payload
    fn save(&self, payload: &[u8]) -> StoreResult<()>;

    /// Short human-readable location, for logs
    fn describe(&self) -> String;
}
