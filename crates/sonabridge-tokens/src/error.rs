//! Error types for token operations.

use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors that can occur when issuing, decoding, or rejecting tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signature, format, version, or key mismatch. Not recoverable without
    /// re-authentication.
    #[error("invalid token: {reason}")]
    Invalid { reason: String },

    /// The token expired but its signature checked out; the embedded service
    /// token can be used to silently re-issue.
    #[error("token expired at {expired_at} (unix)")]
    Expired {
        service_token: String,
        expired_at: i64,
    },

    /// No credential was supplied at all.
    #[error("no credential supplied")]
    MissingCredential,

    /// Signing failed at issue time.
    #[error("token signing failed: {0}")]
    Signing(String),
}
