use thiserror::Error;

/// Errors raised while converting signatures and keys between encodings.
///
/// Each variant carries enough context (expected versus actual) to be logged
/// or turned into a user-facing message without re-inspecting the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The DER signature is structurally invalid.
    #[error("malformed DER signature: {reason}")]
    MalformedSignature {
        /// What the decoder tripped on.
        reason: String,
    },

    /// A raw signature did not have the expected length.
    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidSignatureFormat {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A public key did not have the expected length.
    #[error("invalid public key length: expected {expected} bytes, got {actual}")]
    InvalidKeyFormat {
        /// Required length in bytes.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A public key started with a prefix byte that is not valid for its form.
    #[error("invalid public key prefix: expected {expected}, got {actual:#04x}")]
    InvalidKeyPrefix {
        /// Human readable list of allowed prefixes.
        expected: &'static str,
        /// Prefix byte that was found.
        actual: u8,
    },

    /// A public key could not be recovered from registration data.
    #[error("failed to extract public key: {reason}")]
    KeyExtractionFailed {
        /// What the extractor tripped on.
        reason: String,
    },
}

impl FormatError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        FormatError::MalformedSignature {
            reason: reason.into(),
        }
    }

    pub(crate) fn extraction(reason: impl Into<String>) -> Self {
        FormatError::KeyExtractionFailed {
            reason: reason.into(),
        }
    }
}
