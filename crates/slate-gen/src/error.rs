//! Error types for the generation contract.

/// Errors that can occur when talking to a creative-generation backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend produced output that failed schema validation.
    /// Distinct from caller input errors on purpose: the user's brief is
    /// fine, the upstream payload is not.
    #[error("upstream validation failed: {0}")]
    Validation(String),

    /// The backend itself errored (network, quota, refusal).
    #[error("generation backend error: {0}")]
    Backend(String),

    /// Payload could not be parsed as JSON at all.
    #[error("payload parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience Result type.
pub type Result<T> = std::result::Result<T, Error>;
