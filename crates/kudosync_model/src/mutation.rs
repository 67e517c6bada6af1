//! Durable write intents queued while offline.

use crate::exercise::Exercise;
use crate::time::now_rfc3339;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a pending mutation.
///
/// Tagged with a `type` discriminator on the wire so persisted queues
/// from the previous client format deserialize unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MutationKind {
    /// Create a new exercise on the server.
    #[serde(rename_all = "camelCase")]
    CreateExercise {
        /// The full record as authored locally.
        exercise: Exercise,
    },
    /// Increment the thanks counter for an exercise.
    #[serde(rename_all = "camelCase")]
    ThankExercise {
        /// Server id when known, otherwise the local id.
        exercise_id: String,
    },
}

/// A pending mutation awaiting dispatch to the remote API.
///
/// # Invariants
///
/// - Dispatch order is strictly FIFO.
/// - A mutation leaves the queue only when its dispatch succeeded.
/// - `attempts` counts failed dispatches; there is no attempt cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    /// Globally unique id, generated at enqueue time.
    pub id: Uuid,
    /// The write intent.
    #[serde(flatten)]
    pub kind: MutationKind,
    /// Number of failed dispatch attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// Enqueue timestamp, RFC 3339.
    pub created_at: String,
    /// Timestamp of the most recent dispatch attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<String>,
}

impl PendingMutation {
    /// Creates a fresh mutation with a random id and zero attempts.
    pub fn new(kind: MutationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            attempts: 0,
            created_at: now_rfc3339(),
            last_attempt_at: None,
        }
    }

    /// Records a failed dispatch attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
        self.last_attempt_at = Some(now_rfc3339());
    }
}
