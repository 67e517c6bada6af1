//! The bundled default dataset.
//!
//! Used on first run (empty local storage) and as the known-good
//! fallback when the persisted record table is unreadable.

use kudosync_model::Exercise;
use tracing::warn;

const SEED_JSON: &str = include_str!("seed.json");

/// Returns the bundled starter exercises.
pub fn default_exercises() -> Vec<Exercise> {
    match serde_json::from_str(SEED_JSON) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "bundled seed dataset unreadable");
            Vec::new()
        }
    }
}
