//! The locally stored user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user profile persisted as a single row by the storage adapter.
///
/// The engine never interprets profile contents; fields beyond the id
/// are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Stable profile identifier.
    pub id: String,
    /// Remaining profile fields, opaque to the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    /// Creates a profile with the given id and no extra fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}
