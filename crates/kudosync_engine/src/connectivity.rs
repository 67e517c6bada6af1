//! Network connectivity as an injected capability.
//!
//! The engine never touches a platform event system directly. The host
//! supplies an observer it keeps current (from browser events, netlink,
//! a reachability probe, ...) and calls
//! [`SyncEngine::connectivity_changed`](crate::SyncEngine::connectivity_changed)
//! on transitions.

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the host currently has network connectivity.
pub trait Connectivity: Send + Sync {
    /// Returns the current online state.
    fn is_online(&self) -> bool;
}

/// A connectivity observer driven by explicit `set_online` calls.
///
/// The default observer for tests and for hosts that surface
/// connectivity as a simple flag.
#[derive(Debug)]
pub struct ManualConnectivity {
    online: AtomicBool,
}

impl ManualConnectivity {
    /// Creates an observer with the given initial state.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Updates the online state.
    ///
    /// Callers should follow up with
    /// [`SyncEngine::connectivity_changed`](crate::SyncEngine::connectivity_changed)
    /// so the engine reacts to the transition.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for ManualConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
