//! # kudosync Model
//!
//! Shared domain types for the kudosync offline-first engine.
//!
//! This crate defines the records that flow between the storage adapter,
//! the remote API client, and the sync engine:
//!
//! - [`Exercise`] - the synchronized domain record
//! - [`PendingMutation`] / [`MutationKind`] - durable write intents
//! - [`Profile`] - the locally stored user profile
//! - [`Attachment`] - binary payloads stored alongside records
//!
//! All types serialize to camelCase JSON so persisted files and API
//! bodies round-trip with the server unchanged. Domain fields the engine
//! does not interpret are preserved opaquely via flattened maps.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attachment;
mod exercise;
mod mutation;
mod profile;
mod time;

pub use attachment::Attachment;
pub use exercise::Exercise;
pub use mutation::{MutationKind, PendingMutation};
pub use profile::Profile;
pub use time::{now_epoch_millis, now_rfc3339, parse_epoch_millis};
