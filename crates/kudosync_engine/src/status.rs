//! The publicly observable sync status.

/// A snapshot of the engine's sync state, published to subscribers on
/// every change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// Whether the host reports network connectivity.
    pub is_online: bool,
    /// True while at least one hydrate or flush operation is in flight.
    ///
    /// Reference-counted, not boolean-overwritten: overlapping
    /// operations do not clear the flag prematurely.
    pub is_syncing: bool,
    /// Timestamp of the last successful hydration, RFC 3339.
    pub last_synced_at: Option<String>,
    /// Number of mutations waiting in the queue.
    pub pending_mutations: usize,
}
