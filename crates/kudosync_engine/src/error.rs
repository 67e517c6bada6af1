//! Error types for the sync engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors the engine reports to callers.
///
/// Transient conditions (network failures, dispatch errors) never
/// surface here - they are absorbed by retry and backoff and are only
/// visible through the status feed. What remains is storage failures on
/// the specific operation that hit them, and contract violations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A storage operation failed.
    #[error("storage error: {0}")]
    Store(#[from] kudosync_store::StoreError),

    /// An operation was called before `init()` completed.
    #[error("engine not initialized")]
    NotInitialized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_initialized_display() {
        assert_eq!(
            EngineError::NotInitialized.to_string(),
            "engine not initialized"
        );
    }
}
