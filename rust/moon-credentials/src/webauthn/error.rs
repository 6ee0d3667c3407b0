//! Error types for WebAuthn operations.

use thiserror::Error;

/// Errors from WebAuthn signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebAuthnVerifyError {
    /// The verifying key is not a valid P-256 point.
    #[error("invalid P-256 public key")]
    InvalidKey,

    /// The inner ECDSA signature is invalid (DER-decode or verification failed).
    #[error("invalid ECDSA signature: {0}")]
    InvalidSignature(String),

    /// The `clientDataJSON` could not be parsed as JSON.
    #[error("invalid clientDataJSON: {0}")]
    InvalidClientData(String),

    /// The challenge in `clientDataJSON` is not the expected message.
    #[error("challenge mismatch")]
    ChallengeMismatch,
}
