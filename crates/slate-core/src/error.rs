//! Error types for the director core.

/// Errors that can occur in director operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing request fields. Nothing was mutated.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced session or project does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Brief is missing required slots at commit time.
    #[error("brief not ready; missing: {}", missing.join(", "))]
    NotReady {
        /// The literal set of still-missing required slot keys.
        missing: Vec<&'static str>,
    },

    /// The creative-generation collaborator failed or returned an invalid
    /// payload. Session state is left intact so the user can retry.
    #[error("generation error: {0}")]
    Upstream(#[from] slate_gen::Error),

    /// SQLite database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization / deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General internal error
    #[error("{0}")]
    Internal(String),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
