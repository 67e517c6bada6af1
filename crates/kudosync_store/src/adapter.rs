//! The storage adapter trait and the capability-detected opener.

use crate::error::StoreResult;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use kudosync_model::{Attachment, Exercise, PendingMutation, Profile};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Narrow persistence interface the sync engine works against.
///
/// All methods take `&self`; implementations are internally locked and
/// safe to share across threads. Operations are safe to call at any
/// time - backends open their underlying storage transparently on first
/// use.
pub trait StorageAdapter: Send + Sync {
    /// Returns a full snapshot of the stored records.
    fn get_exercises(&self) -> StoreResult<Vec<Exercise>>;

    /// Inserts or replaces records by merge key.
    ///
    /// Records already stored but absent from `records` are kept.
    fn bulk_upsert_exercises(&self, records: &[Exercise]) -> StoreResult<()>;

    /// Replaces the whole record table.
    ///
    /// Used only when migrating from the legacy storage format.
    fn replace_exercises(&self, records: &[Exercise]) -> StoreResult<()>;

    /// Returns the number of stored records.
    fn count_exercises(&self) -> StoreResult<usize>;

    /// Returns the persisted mutation queue in FIFO order.
    fn get_pending_mutations(&self) -> StoreResult<Vec<PendingMutation>>;

    /// Replaces the persisted mutation queue in full.
    fn set_pending_mutations(&self, mutations: &[PendingMutation]) -> StoreResult<()>;

    /// Returns the stored user profile, if any.
    fn get_user(&self) -> StoreResult<Option<Profile>>;

    /// Stores the user profile. `None` clears it.
    fn save_user(&self, profile: Option<&Profile>) -> StoreResult<()>;

    /// Stores a base64 payload under `key`, normalizing data-URL prefixes.
    fn save_attachment(&self, key: &str, data: &str, mime_type: &str) -> StoreResult<()>;

    /// Returns the attachment stored under `key`, if any.
    fn get_attachment(&self, key: &str) -> StoreResult<Option<Attachment>>;

    /// Deletes the attachment stored under `key`, if present.
    fn delete_attachment(&self, key: &str) -> StoreResult<()>;
}

/// Insert-or-replace by logical identity, preserving insertion order.
///
/// Shared by both backends so upsert semantics cannot drift between
/// them. Matching uses [`Exercise::same_entity`]: a stored local-only
/// record and its server-confirmed counterpart occupy one row.
pub(crate) fn upsert_by_merge_key(table: &mut Vec<Exercise>, records: &[Exercise]) {
    for record in records {
        match table
            .iter_mut()
            .find(|existing| existing.same_entity(record))
        {
            Some(existing) => *existing = record.clone(),
            None => table.push(record.clone()),
        }
    }
}

/// Opens durable storage at `path`, degrading to memory on failure.
///
/// This is the startup-time capability check: hosts without a writable
/// data directory (tests, ephemeral sandboxes) still get a working
/// adapter, at the cost of persistence for the session.
pub fn open_durable(path: &Path) -> Arc<dyn StorageAdapter> {
    match FileStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "durable storage unavailable, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}
