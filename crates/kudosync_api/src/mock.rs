//! A scriptable in-memory server double for engine tests.

use crate::client::RemoteApi;
use crate::error::{ApiError, ApiResult};
use kudosync_model::{now_rfc3339, Exercise};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// A mock remote API backed by an in-memory canonical record set.
///
/// Behaves like the real server contract: `create` assigns a
/// `server_id` and stores the canonical record, `thank` increments the
/// counter server-side resolving either identity, `fetch` returns the
/// canonical set. Failures are injected per operation, and every call
/// is logged in order so tests can assert dispatch sequencing.
#[derive(Debug, Default)]
pub struct MockApi {
    records: Mutex<Vec<Exercise>>,
    call_log: Mutex<Vec<String>>,
    fetch_calls: AtomicU32,
    next_server_id: AtomicU64,
    fail_fetches: AtomicU32,
    fail_creates: AtomicU32,
    fail_thanks: AtomicU32,
}

impl MockApi {
    /// Creates an empty mock server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the canonical record set returned by `fetch_exercises`.
    pub fn set_records(&self, records: Vec<Exercise>) {
        *self.records.lock() = records;
    }

    /// Returns the canonical record set as the server currently stores it.
    pub fn records(&self) -> Vec<Exercise> {
        self.records.lock().clone()
    }

    /// Fails the next `n` fetch calls with a transport error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.fail_fetches.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` create calls with a transport error.
    pub fn fail_next_creates(&self, n: u32) {
        self.fail_creates.store(n, Ordering::SeqCst);
    }

    /// Fails the next `n` thank calls with a transport error.
    pub fn fail_next_thanks(&self, n: u32) {
        self.fail_thanks.store(n, Ordering::SeqCst);
    }

    /// Number of `fetch_exercises` calls made so far.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Ordered log of every call, e.g. `["create a", "thank srv-1"]`.
    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    fn take_failure(&self, counter: &AtomicU32) -> ApiResult<()> {
        let remaining = counter.load(Ordering::SeqCst);
        if remaining > 0 {
            counter.store(remaining - 1, Ordering::SeqCst);
            return Err(ApiError::Transport("injected failure".into()));
        }
        Ok(())
    }
}

impl RemoteApi for MockApi {
    fn fetch_exercises(&self) -> ApiResult<Vec<Exercise>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.call_log.lock().push("fetch".into());
        self.take_failure(&self.fail_fetches)?;
        Ok(self.records.lock().clone())
    }

    fn create_exercise(&self, exercise: &Exercise) -> ApiResult<Exercise> {
        self.call_log.lock().push(format!("create {}", exercise.id));
        self.take_failure(&self.fail_creates)?;

        let mut canonical = exercise.clone();
        let n = self.next_server_id.fetch_add(1, Ordering::SeqCst) + 1;
        canonical.server_id = Some(format!("srv-{n}"));
        canonical.updated_at = Some(now_rfc3339());
        if canonical.created_at.is_none() {
            canonical.created_at = canonical.updated_at.clone();
        }

        self.records.lock().push(canonical.clone());
        Ok(canonical)
    }

    fn thank_exercise(&self, id: &str) -> ApiResult<Exercise> {
        self.call_log.lock().push(format!("thank {id}"));
        self.take_failure(&self.fail_thanks)?;

        let mut records = self.records.lock();
        match records.iter_mut().find(|r| r.matches_id(id)) {
            Some(record) => {
                record.thanks_count += 1;
                record.updated_at = Some(now_rfc3339());
                Ok(record.clone())
            }
            None => Err(ApiError::Status {
                status: 404,
                message: format!("no exercise with id {id}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_server_id_and_stores() {
        let api = MockApi::new();
        let created = api.create_exercise(&Exercise::new("a")).unwrap();

        assert_eq!(created.server_id.as_deref(), Some("srv-1"));
        assert_eq!(api.records().len(), 1);
        assert_eq!(api.fetch_exercises().unwrap().len(), 1);
    }

    #[test]
    fn thank_resolves_either_identity() {
        let api = MockApi::new();
        let created = api.create_exercise(&Exercise::new("local-a")).unwrap();

        let by_local = api.thank_exercise("local-a").unwrap();
        assert_eq!(by_local.thanks_count, 1);

        let by_server = api
            .thank_exercise(created.server_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(by_server.thanks_count, 2);
    }

    #[test]
    fn thank_unknown_id_is_404() {
        let api = MockApi::new();
        let err = api.thank_exercise("missing").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
    }

    #[test]
    fn injected_failures_are_consumed_in_order() {
        let api = MockApi::new();
        api.fail_next_creates(2);

        assert!(api.create_exercise(&Exercise::new("a")).is_err());
        assert!(api.create_exercise(&Exercise::new("a")).is_err());
        assert!(api.create_exercise(&Exercise::new("a")).is_ok());
    }

    #[test]
    fn call_log_preserves_order() {
        let api = MockApi::new();
        api.create_exercise(&Exercise::new("a")).unwrap();
        api.thank_exercise("a").unwrap();

        assert_eq!(api.call_log(), vec!["create a", "thank a"]);
    }
}
