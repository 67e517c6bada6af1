//! The sync engine state machine.

use crate::config::EngineConfig;
use crate::connectivity::Connectivity;
use crate::error::{EngineError, EngineResult};
use crate::feed::SnapshotFeed;
use crate::merge;
use crate::seed;
use crate::status::SyncStatus;
use kudosync_api::{ApiResult, RemoteApi};
use kudosync_model::{now_rfc3339, Exercise, MutationKind, PendingMutation};
use kudosync_store::StorageAdapter;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Engine lifecycle. `Ready` is permanent for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
}

/// The offline-first synchronization engine.
///
/// Owns the in-memory record cache and the mirror of the durable
/// mutation queue, and orchestrates hydration, optimistic writes, and
/// queue replay. One instance per process, created with its
/// collaborators injected; the UI observes it through
/// [`subscribe_cache`](SyncEngine::subscribe_cache) and
/// [`subscribe_status`](SyncEngine::subscribe_status).
///
/// All methods take `&self`; internal locking makes the engine safe to
/// share across threads. Cache and queue are persisted immediately
/// after every in-memory change - the storage adapter is not assumed to
/// provide cross-table transactions.
pub struct SyncEngine {
    store: Arc<dyn StorageAdapter>,
    api: Arc<dyn RemoteApi>,
    connectivity: Arc<dyn Connectivity>,
    config: EngineConfig,

    state: Mutex<EngineState>,
    cache: RwLock<Vec<Exercise>>,
    queue: RwLock<Vec<PendingMutation>>,
    last_synced_at: RwLock<Option<String>>,
    /// Online state at the last observed transition.
    last_online: AtomicBool,
    /// In-flight hydrate-or-flush operations; drives `is_syncing`.
    active_syncs: AtomicU64,
    /// Re-entrancy guard: at most one flush runs at a time.
    flushing: AtomicBool,

    cache_feed: SnapshotFeed<Vec<Exercise>>,
    status_feed: SnapshotFeed<SyncStatus>,
}

impl SyncEngine {
    /// Creates an engine over the given collaborators.
    ///
    /// The engine does nothing until [`init`](SyncEngine::init) runs.
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        api: Arc<dyn RemoteApi>,
        connectivity: Arc<dyn Connectivity>,
        config: EngineConfig,
    ) -> Arc<Self> {
        let online = connectivity.is_online();
        Arc::new(Self {
            store,
            api,
            connectivity,
            config,
            state: Mutex::new(EngineState::Uninitialized),
            cache: RwLock::new(Vec::new()),
            queue: RwLock::new(Vec::new()),
            last_synced_at: RwLock::new(None),
            last_online: AtomicBool::new(online),
            active_syncs: AtomicU64::new(0),
            flushing: AtomicBool::new(false),
            cache_feed: SnapshotFeed::new(Vec::new()),
            status_feed: SnapshotFeed::new(SyncStatus::default()),
        })
    }

    /// Initializes the engine: loads local state, publishes the first
    /// snapshots, and, when online, hydrates from the server and
    /// replays the queue.
    ///
    /// Idempotent and safe to call from many threads at once: the first
    /// caller does the work while the rest block on the same lock, so
    /// every caller returns with the engine ready and exactly one
    /// hydration pass performed. Calls after readiness are no-ops.
    ///
    /// Hydration failure never fails `init`; only storage failures do.
    pub fn init(self: &Arc<Self>) -> EngineResult<()> {
        let mut state = self.state.lock();
        if *state == EngineState::Ready {
            return Ok(());
        }
        *state = EngineState::Initializing;

        if let Err(err) = self.load_local_state() {
            *state = EngineState::Uninitialized;
            return Err(err);
        }

        self.publish_cache();
        self.publish_status();
        self.last_online
            .store(self.connectivity.is_online(), Ordering::SeqCst);

        if self.connectivity.is_online() {
            // Settles (success or failure) before readiness.
            self.hydrate_from_server();
            self.spawn_flush();
        }

        *state = EngineState::Ready;
        Ok(())
    }

    /// Loads cache and queue from storage, seeding an empty store with
    /// the bundled dataset.
    fn load_local_state(&self) -> EngineResult<()> {
        let mut records = self.store.get_exercises()?;
        if records.is_empty() {
            records = seed::default_exercises();
            if !records.is_empty() {
                info!(count = records.len(), "seeding empty store with bundled dataset");
                self.store.bulk_upsert_exercises(&records)?;
            }
        }
        *self.cache.write() = records;
        *self.queue.write() = self.store.get_pending_mutations()?;
        Ok(())
    }

    fn ensure_ready(&self) -> EngineResult<()> {
        if *self.state.lock() == EngineState::Ready {
            Ok(())
        } else {
            Err(EngineError::NotInitialized)
        }
    }

    /// Creates a record optimistically and queues it for the server.
    ///
    /// Stamps `created_at` (when absent) and `updated_at`, applies the
    /// record to the cache and storage, notifies subscribers, enqueues
    /// a `createExercise` mutation, and triggers replay when online.
    /// Returns the record as cached.
    pub fn create_exercise(self: &Arc<Self>, mut exercise: Exercise) -> EngineResult<Exercise> {
        self.ensure_ready()?;

        let now = now_rfc3339();
        if exercise.created_at.is_none() {
            exercise.created_at = Some(now.clone());
        }
        exercise.updated_at = Some(now);

        let entry = {
            let mut cache = self.cache.write();
            merge::apply_local_upsert(&mut cache, &exercise)
        };
        self.store.bulk_upsert_exercises(&[entry.clone()])?;
        self.publish_cache();

        self.enqueue(MutationKind::CreateExercise {
            exercise: entry.clone(),
        })?;
        Ok(entry)
    }

    /// Increments the thanks counter for the record matching `id`
    /// (client or server id) optimistically, then queues the thank.
    ///
    /// The queued mutation targets the record's server id when known so
    /// the server sees its own identity; a thank for an unknown record
    /// is logged and ignored.
    pub fn increment_thanks(self: &Arc<Self>, id: &str) -> EngineResult<()> {
        self.ensure_ready()?;

        let found = {
            let mut cache = self.cache.write();
            cache.iter_mut().find(|e| e.matches_id(id)).map(|entry| {
                entry.thanks_count += 1;
                entry.updated_at = Some(now_rfc3339());
                let target = entry
                    .server_id
                    .clone()
                    .unwrap_or_else(|| entry.id.clone());
                (entry.clone(), target)
            })
        };

        let Some((entry, target)) = found else {
            warn!(id, "thanks for unknown record ignored");
            return Ok(());
        };

        self.store.bulk_upsert_exercises(&[entry])?;
        self.publish_cache();

        self.enqueue(MutationKind::ThankExercise {
            exercise_id: target,
        })
    }

    /// Appends a mutation to the durable queue and triggers replay when
    /// online.
    fn enqueue(self: &Arc<Self>, kind: MutationKind) -> EngineResult<()> {
        let snapshot = {
            let mut queue = self.queue.write();
            queue.push(PendingMutation::new(kind));
            queue.clone()
        };
        self.store.set_pending_mutations(&snapshot)?;
        self.publish_status();

        if self.connectivity.is_online() {
            self.spawn_flush();
        }
        Ok(())
    }

    /// Fire-and-forget queue replay.
    fn spawn_flush(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        thread::spawn(move || {
            if let Err(err) = engine.flush_queue() {
                warn!(error = %err, "queue replay stopped on storage error");
            }
        });
    }

    /// Replays the pending-mutation queue against the remote API.
    ///
    /// At most one flush runs at a time; a call while one is in flight
    /// returns immediately (the running flush drains later arrivals
    /// since it loops until the queue is empty). Strictly FIFO: the
    /// head retries with exponential backoff until it succeeds or the
    /// engine goes offline. A stuck head blocks later mutations, which
    /// preserves create-before-thank ordering.
    pub fn flush_queue(&self) -> EngineResult<()> {
        loop {
            if self
                .flushing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return Ok(());
            }

            self.active_syncs.fetch_add(1, Ordering::SeqCst);
            self.publish_status();

            let result = self.flush_loop();

            self.active_syncs.fetch_sub(1, Ordering::SeqCst);
            self.flushing.store(false, Ordering::SeqCst);
            self.publish_status();
            result?;

            // A mutation enqueued after flush_loop saw the queue empty
            // but before the flag cleared had its trigger swallowed by
            // the CAS above. Re-check and drain it here.
            if !self.connectivity.is_online() || self.queue.read().is_empty() {
                return Ok(());
            }
        }
    }

    fn flush_loop(&self) -> EngineResult<()> {
        loop {
            // Re-checked before every dispatch; going offline stops the
            // flush without touching the head's attempt count again.
            if !self.connectivity.is_online() {
                debug!("offline, stopping queue replay");
                return Ok(());
            }

            let Some(head) = self.queue.read().first().cloned() else {
                return Ok(());
            };

            match self.dispatch(&head.kind) {
                Ok(canonical) => {
                    self.absorb_canonical(&canonical)?;
                    let snapshot = {
                        let mut queue = self.queue.write();
                        if queue.first().map(|m| m.id) == Some(head.id) {
                            queue.remove(0);
                        }
                        queue.clone()
                    };
                    self.store.set_pending_mutations(&snapshot)?;
                    self.publish_status();
                    debug!(mutation = %head.id, "mutation dispatched");
                }
                Err(err) => {
                    let attempts = {
                        let mut queue = self.queue.write();
                        match queue.first_mut() {
                            Some(head_mut) => {
                                head_mut.record_attempt();
                                head_mut.attempts
                            }
                            None => 0,
                        }
                    };
                    let snapshot = self.queue.read().clone();
                    self.store.set_pending_mutations(&snapshot)?;
                    self.publish_status();

                    warn!(
                        mutation = %head.id,
                        attempts,
                        retryable = err.is_retryable(),
                        error = %err,
                        "mutation dispatch failed, backing off"
                    );
                    thread::sleep(self.config.backoff.delay_for(attempts));
                }
            }
        }
    }

    /// Maps a mutation to its remote call.
    fn dispatch(&self, kind: &MutationKind) -> ApiResult<Exercise> {
        match kind {
            MutationKind::CreateExercise { exercise } => self.api.create_exercise(exercise),
            MutationKind::ThankExercise { exercise_id } => self.api.thank_exercise(exercise_id),
        }
    }

    /// Merges a canonical server record into cache and storage.
    fn absorb_canonical(&self, canonical: &Exercise) -> EngineResult<()> {
        let merged = {
            let mut cache = self.cache.write();
            match cache.iter().position(|e| e.same_entity(canonical)) {
                Some(pos) => {
                    let merged = merge::resolve(&cache[pos], canonical);
                    cache[pos] = merged.clone();
                    merged
                }
                None => {
                    cache.push(canonical.clone());
                    canonical.clone()
                }
            }
        };
        self.store.bulk_upsert_exercises(&[merged])?;
        self.publish_cache();
        Ok(())
    }

    /// Fetches the full server record set and merges it into the cache.
    ///
    /// Never fails: network errors are logged and the local cache is
    /// left untouched. Local-only records absent from the response are
    /// always kept.
    pub fn hydrate_from_server(&self) {
        self.active_syncs.fetch_add(1, Ordering::SeqCst);
        self.publish_status();

        match self.api.fetch_exercises() {
            Ok(records) => {
                if !records.is_empty() {
                    let merged = {
                        let mut cache = self.cache.write();
                        let merged = merge::merge_server_set(&cache, &records);
                        *cache = merged.clone();
                        merged
                    };
                    if let Err(err) = self.store.bulk_upsert_exercises(&merged) {
                        warn!(error = %err, "persisting hydrated records failed");
                    }
                    self.publish_cache();
                }
                *self.last_synced_at.write() = Some(now_rfc3339());
                debug!(count = records.len(), "hydrated from server");
            }
            Err(err) => {
                warn!(error = %err, "hydration failed, keeping local cache");
            }
        }

        self.active_syncs.fetch_sub(1, Ordering::SeqCst);
        self.publish_status();
    }

    /// Reacts to a connectivity transition signaled by the host.
    ///
    /// Publishes the new status and returns immediately. An
    /// offline-to-online transition kicks off hydration followed by
    /// queue replay on a background thread, so a host event loop is
    /// never held hostage by a retrying queue head.
    pub fn connectivity_changed(self: &Arc<Self>) {
        let online = self.connectivity.is_online();
        let was_online = self.last_online.swap(online, Ordering::SeqCst);
        self.publish_status();

        if online && !was_online {
            info!("connectivity restored, hydrating and replaying queue");
            let engine = Arc::clone(self);
            thread::spawn(move || {
                engine.hydrate_from_server();
                if let Err(err) = engine.flush_queue() {
                    warn!(error = %err, "queue replay stopped on storage error");
                }
            });
        }
    }

    /// Subscribes to cache snapshots: the full record set, delivered
    /// immediately and after every mutation or merge.
    pub fn subscribe_cache(&self) -> Receiver<Vec<Exercise>> {
        self.cache_feed.subscribe()
    }

    /// Subscribes to sync-status snapshots, delivered immediately and
    /// after every status change.
    pub fn subscribe_status(&self) -> Receiver<SyncStatus> {
        self.status_feed.subscribe()
    }

    /// Returns the current cache snapshot.
    pub fn exercises(&self) -> Vec<Exercise> {
        self.cache.read().clone()
    }

    /// Returns the current sync status.
    pub fn status(&self) -> SyncStatus {
        self.build_status()
    }

    /// Returns the number of queued mutations.
    pub fn pending_count(&self) -> usize {
        self.queue.read().len()
    }

    /// Returns the persisted queue mirror, FIFO order.
    pub fn pending_mutations(&self) -> Vec<PendingMutation> {
        self.queue.read().clone()
    }

    fn build_status(&self) -> SyncStatus {
        SyncStatus {
            is_online: self.connectivity.is_online(),
            is_syncing: self.active_syncs.load(Ordering::SeqCst) > 0,
            last_synced_at: self.last_synced_at.read().clone(),
            pending_mutations: self.queue.read().len(),
        }
    }

    fn publish_status(&self) {
        self.status_feed.publish(self.build_status());
    }

    fn publish_cache(&self) {
        self.cache_feed.publish(self.cache.read().clone());
    }
}
