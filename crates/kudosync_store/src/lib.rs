//! # kudosync Store
//!
//! Storage adapter trait and backends for the kudosync offline-first
//! engine.
//!
//! The sync engine persists four logical tables through this crate:
//! domain records, the pending-mutation queue, the user profile, and
//! binary attachments. Backends are swappable behind the
//! [`StorageAdapter`] trait:
//!
//! - [`FileStore`] - one JSON file per table under a root directory,
//!   with atomic whole-table rewrites and migration of the legacy
//!   single-blob format.
//! - [`MemoryStore`] - an in-memory map for tests and for hosts without
//!   durable storage.
//!
//! [`open_durable`] performs runtime capability detection: it prefers
//! the file backend and degrades to memory when the directory cannot be
//! opened. Storage-open failures never crash the caller.
//!
//! ## Consistency model
//!
//! The adapter serializes its own writes per store instance. It does
//! not provide cross-table transactions; the engine maintains its
//! invariants by persisting the queue and cache immediately after each
//! in-memory change.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod file;
mod memory;

pub use adapter::{open_durable, StorageAdapter};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
