use thiserror::Error;

/// Errors that can occur while decoding account data or addresses.
///
/// Decoding never reads past the end of its input; running out of bytes is
/// reported as [`DecodeError::CorruptAccountData`] naming the field that did
/// not fit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ended before `field` could be read.
    ///
    /// `needed` is the number of bytes the field requires and `available`
    /// the number left in the buffer at that point. Length-prefixed fields
    /// whose prefix points past the end are reported the same way.
    #[error("corrupt account data: {field} needs {needed} bytes but only {available} remain")]
    CorruptAccountData {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    /// The account's leading 8 bytes name a different account type.
    #[error("expected {kind} account discriminator {expected:02x?}, found {actual:02x?}")]
    UnexpectedAccountType {
        kind: &'static str,
        expected: [u8; 8],
        actual: [u8; 8],
    },

    /// A proposal status byte outside the known table.
    #[error("unknown proposal status code {0}")]
    UnknownStatus(u8),

    /// A string field held bytes that are not UTF-8.
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },
}

/// Errors that can occur while serializing instruction arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Borsh refused a field, in practice a string or byte vector longer
    /// than its `u32` length prefix can describe.
    #[error("failed to serialize {instruction} arguments: {reason}")]
    Serialize {
        instruction: &'static str,
        reason: String,
    },
}
