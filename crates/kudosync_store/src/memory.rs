//! In-memory storage backend.

use crate::adapter::{upsert_by_merge_key, StorageAdapter};
use crate::error::StoreResult;
use kudosync_model::{Attachment, Exercise, PendingMutation, Profile};
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory storage adapter.
///
/// Holds all four logical tables in locked maps. Suitable for:
/// - Unit and integration tests
/// - Hosts without durable storage (degraded mode for short sessions)
///
/// Data does not survive the process; [`crate::open_durable`] only
/// selects this backend when the file backend cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    exercises: RwLock<Vec<Exercise>>,
    mutations: RwLock<Vec<PendingMutation>>,
    user: RwLock<Option<Profile>>,
    attachments: RwLock<HashMap<String, Attachment>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStore {
    fn get_exercises(&self) -> StoreResult<Vec<Exercise>> {
        Ok(self.exercises.read().clone())
    }

    fn bulk_upsert_exercises(&self, records: &[Exercise]) -> StoreResult<()> {
        upsert_by_merge_key(&mut self.exercises.write(), records);
        Ok(())
    }

    fn replace_exercises(&self, records: &[Exercise]) -> StoreResult<()> {
        *self.exercises.write() = records.to_vec();
        Ok(())
    }

    fn count_exercises(&self) -> StoreResult<usize> {
        Ok(self.exercises.read().len())
    }

    fn get_pending_mutations(&self) -> StoreResult<Vec<PendingMutation>> {
        Ok(self.mutations.read().clone())
    }

    fn set_pending_mutations(&self, mutations: &[PendingMutation]) -> StoreResult<()> {
        *self.mutations.write() = mutations.to_vec();
        Ok(())
    }

    fn get_user(&self) -> StoreResult<Option<Profile>> {
        Ok(self.user.read().clone())
    }

    fn save_user(&self, profile: Option<&Profile>) -> StoreResult<()> {
        *self.user.write() = profile.cloned();
        Ok(())
    }

    fn save_attachment(&self, key: &str, data: &str, mime_type: &str) -> StoreResult<()> {
        let attachment = Attachment::new(key, data, mime_type);
        self.attachments.write().insert(key.to_string(), attachment);
        Ok(())
    }

    fn get_attachment(&self, key: &str) -> StoreResult<Option<Attachment>> {
        Ok(self.attachments.read().get(key).cloned())
    }

    fn delete_attachment(&self, key: &str) -> StoreResult<()> {
        self.attachments.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kudosync_model::MutationKind;

    #[test]
    fn upsert_replaces_by_merge_key() {
        let store = MemoryStore::new();

        let mut first = Exercise::new("a");
        first.thanks_count = 1;
        store.bulk_upsert_exercises(&[first]).unwrap();

        let mut second = Exercise::new("a");
        second.thanks_count = 5;
        store.bulk_upsert_exercises(&[second.clone()]).unwrap();

        let all = store.get_exercises().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].thanks_count, 5);
    }

    #[test]
    fn upsert_is_idempotent() {
        let store = MemoryStore::new();
        let record = Exercise::new("a").with_field("title", "x".into());

        store.bulk_upsert_exercises(&[record.clone()]).unwrap();
        store.bulk_upsert_exercises(&[record.clone()]).unwrap();

        let all = store.get_exercises().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], record);
    }

    #[test]
    fn upsert_matches_on_server_id() {
        let store = MemoryStore::new();

        let mut local = Exercise::new("local-1");
        local.server_id = Some("srv-1".into());
        store.bulk_upsert_exercises(&[local]).unwrap();

        // Same server identity under a different local id collapses.
        let mut confirmed = Exercise::new("other");
        confirmed.server_id = Some("srv-1".into());
        store.bulk_upsert_exercises(&[confirmed]).unwrap();

        assert_eq!(store.count_exercises().unwrap(), 1);
    }

    #[test]
    fn upsert_collapses_confirmed_counterpart() {
        let store = MemoryStore::new();
        store.bulk_upsert_exercises(&[Exercise::new("local-1")]).unwrap();

        // The server-confirmed version keeps the client id but gains a
        // server id; it must replace the local-only row, not join it.
        let mut confirmed = Exercise::new("local-1");
        confirmed.server_id = Some("srv-9".into());
        store.bulk_upsert_exercises(&[confirmed]).unwrap();

        let all = store.get_exercises().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].server_id.as_deref(), Some("srv-9"));
    }

    #[test]
    fn upsert_never_removes_absent_records() {
        let store = MemoryStore::new();
        store
            .bulk_upsert_exercises(&[Exercise::new("a"), Exercise::new("b")])
            .unwrap();

        store.bulk_upsert_exercises(&[Exercise::new("a")]).unwrap();
        assert_eq!(store.count_exercises().unwrap(), 2);
    }

    #[test]
    fn replace_is_wholesale() {
        let store = MemoryStore::new();
        store
            .bulk_upsert_exercises(&[Exercise::new("a"), Exercise::new("b")])
            .unwrap();

        store.replace_exercises(&[Exercise::new("c")]).unwrap();

        let all = store.get_exercises().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "c");
    }

    #[test]
    fn queue_round_trips_in_order() {
        let store = MemoryStore::new();
        let first = PendingMutation::new(MutationKind::ThankExercise {
            exercise_id: "a".into(),
        });
        let second = PendingMutation::new(MutationKind::ThankExercise {
            exercise_id: "b".into(),
        });

        store
            .set_pending_mutations(&[first.clone(), second.clone()])
            .unwrap();

        let queue = store.get_pending_mutations().unwrap();
        assert_eq!(queue, vec![first, second]);
    }

    #[test]
    fn user_none_clears() {
        let store = MemoryStore::new();
        store.save_user(Some(&Profile::new("u1"))).unwrap();
        assert!(store.get_user().unwrap().is_some());

        store.save_user(None).unwrap();
        assert!(store.get_user().unwrap().is_none());
    }

    #[test]
    fn attachment_lifecycle() {
        let store = MemoryStore::new();
        store
            .save_attachment("k", "data:image/png;base64,abcd", "image/png")
            .unwrap();

        let att = store.get_attachment("k").unwrap().unwrap();
        assert_eq!(att.data, "abcd");

        store.delete_attachment("k").unwrap();
        assert!(store.get_attachment("k").unwrap().is_none());
    }
}
