use thiserror::Error;

/// Why a token could not be issued or accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token signing failed: {0}")]
    SigningFailed(String),

    /// Malformed token, foreign algorithm, or signature mismatch.
    #[error("Token rejected: {0}")]
    Rejected(String),

    #[error("Token expired")]
    Expired,

    #[error("Token has no '{0}' claim")]
    MissingClaim(&'static str),
}
