//! Binary attachments stored alongside records.

use crate::time::now_rfc3339;
use serde::{Deserialize, Serialize};

/// A binary payload stored by the adapter under an opaque string key.
///
/// Payloads are kept base64-encoded. Data-URL prefixes
/// (`data:<mime>;base64,`) are stripped on construction so that keys
/// captured from different host environments normalize to the same form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Opaque lookup key.
    pub key: String,
    /// Base64-encoded payload, without any data-URL prefix.
    pub data: String,
    /// MIME type of the decoded payload.
    pub mime_type: String,
    /// Last write timestamp, RFC 3339.
    pub updated_at: String,
}

impl Attachment {
    /// Creates an attachment, normalizing a data-URL payload if present.
    pub fn new(key: impl Into<String>, data: &str, mime_type: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: normalize_base64(data).to_string(),
            mime_type: mime_type.into(),
            updated_at: now_rfc3339(),
        }
    }
}

/// Strips a `data:*;base64,` prefix, leaving the bare base64 payload.
fn normalize_base64(data: &str) -> &str {
    if data.starts_with("data:") {
        if let Some(idx) = data.find(";base64,") {
            return &data[idx + ";base64,".len()..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base64_is_kept() {
        let att = Attachment::new("k", "aGVsbG8=", "text/plain");
        assert_eq!(att.data, "aGVsbG8=");
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let att = Attachment::new("k", "data:image/png;base64,iVBORw0KGgo=", "image/png");
        assert_eq!(att.data, "iVBORw0KGgo=");
        assert_eq!(att.mime_type, "image/png");
    }

    #[test]
    fn updated_at_is_stamped() {
        let att = Attachment::new("k", "aGVsbG8=", "text/plain");
        assert!(crate::time::parse_epoch_millis(&att.updated_at).is_some());
    }
}
