//! # kudosync Engine
//!
//! The offline-first synchronization core.
//!
//! This crate provides:
//! - Optimistic local writes with a durable FIFO mutation queue
//! - Queue replay against the remote API with exponential backoff
//! - Last-writer-wins conflict resolution with a monotonic counter
//! - Hydration of the local cache from the server
//! - Observable cache and sync-status snapshot feeds
//!
//! ## Architecture
//!
//! The [`SyncEngine`] is instantiated once at process start with its
//! collaborators injected: a storage adapter (`kudosync_store`), a
//! remote API client (`kudosync_api`), and a [`Connectivity`] observer
//! supplied by the host. The UI layer only subscribes to the engine's
//! feeds; it never mutates records directly.
//!
//! ## Key invariants
//!
//! - A mutation leaves the queue only after a successful dispatch
//! - Queue replay is strictly FIFO; a failing head blocks later
//!   mutations, so a create always precedes the thanks that reference it
//! - The thanks counter never regresses in a merge
//! - A server id, once learned, is never forgotten
//! - Hydration never drops a local-only record

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod engine;
mod error;
mod feed;
mod merge;
mod seed;
mod status;

pub use config::{BackoffPolicy, EngineConfig};
pub use connectivity::{Connectivity, ManualConnectivity};
pub use engine::SyncEngine;
pub use error::{EngineError, EngineResult};
pub use feed::SnapshotFeed;
pub use status::SyncStatus;
