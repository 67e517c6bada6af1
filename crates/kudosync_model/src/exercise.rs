//! The synchronized domain record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An exercise record - the unit of synchronized data.
///
/// The engine only interprets identity (`id`/`server_id`), the
/// `updated_at` timestamp, and the monotonic `thanks_count` counter.
/// Every other domain field (title, description, tags, moderation
/// metadata) is carried opaquely in [`Exercise::extra`] and merged as a
/// value.
///
/// # Identity
///
/// A record's *merge key* is `server_id` when present, otherwise `id`.
/// Two records sharing a merge key are the same logical entity: a locally
/// created record and its server-confirmed counterpart converge to one
/// cache entry once the server assigns a `server_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Client-assigned identifier, stable for the record's lifetime.
    pub id: String,
    /// Identifier assigned by the server once the record is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Creation timestamp, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last-update timestamp, RFC 3339. Authority for conflict resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Monotonic counter. Never decreases in a merge.
    #[serde(default)]
    pub thanks_count: u64,
    /// Remaining domain fields, opaque to the engine.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Exercise {
    /// Creates a record with the given client id and empty domain fields.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            server_id: None,
            created_at: None,
            updated_at: None,
            thanks_count: 0,
            extra: Map::new(),
        }
    }

    /// The identity used to match this record to its server counterpart.
    pub fn merge_key(&self) -> &str {
        self.server_id.as_deref().unwrap_or(&self.id)
    }

    /// Returns true if either the local or server id equals `id`.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || self.server_id.as_deref() == Some(id)
    }

    /// Returns true if both records represent the same logical entity.
    ///
    /// Matches on equal merge keys, or on equal client ids: a record
    /// created locally (merge key = client id) and its server-confirmed
    /// counterpart (merge key = server id, client id echoed back) must
    /// converge to one entry.
    pub fn same_entity(&self, other: &Exercise) -> bool {
        self.merge_key() == other.merge_key() || self.id == other.id
    }

    /// Sets an opaque domain field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_key_prefers_server_id() {
        let mut ex = Exercise::new("local-1");
        assert_eq!(ex.merge_key(), "local-1");

        ex.server_id = Some("srv-9".into());
        assert_eq!(ex.merge_key(), "srv-9");
    }

    #[test]
    fn matches_either_identity() {
        let mut ex = Exercise::new("local-1");
        ex.server_id = Some("srv-9".into());

        assert!(ex.matches_id("local-1"));
        assert!(ex.matches_id("srv-9"));
        assert!(!ex.matches_id("other"));
    }

    #[test]
    fn same_entity_collapses_confirmed_counterpart() {
        let local = Exercise::new("local-1");

        let mut confirmed = Exercise::new("local-1");
        confirmed.server_id = Some("srv-9".into());

        assert!(local.same_entity(&confirmed));
        assert!(confirmed.same_entity(&local));
        assert!(!local.same_entity(&Exercise::new("local-2")));
    }

    #[test]
    fn serde_round_trips_camel_case_and_extras() {
        let raw = json!({
            "id": "a",
            "serverId": "s1",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-02-01T00:00:00Z",
            "thanksCount": 7,
            "title": "Morning stretch",
            "tags": ["mobility"],
        });

        let ex: Exercise = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(ex.server_id.as_deref(), Some("s1"));
        assert_eq!(ex.thanks_count, 7);
        assert_eq!(ex.extra["title"], json!("Morning stretch"));

        let back = serde_json::to_value(&ex).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn missing_optional_fields_default() {
        let ex: Exercise = serde_json::from_value(json!({ "id": "a" })).unwrap();
        assert_eq!(ex.server_id, None);
        assert_eq!(ex.thanks_count, 0);
        assert!(ex.extra.is_empty());
    }
}
