//! Error types for history-store.

/// Result type for history-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in history-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No history was ever recorded for this identifier.
    #[error("Location history not found: {0}")]
    NotFound(String),
}
