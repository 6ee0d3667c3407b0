//! ECDSA P-256 signature encodings.
//!
//! Authenticators hand back signatures as ASN.1 DER. The secp256r1 verifier
//! on the ledger only understands the fixed-width form:
//!
//! ```text
//! ┌───────────────────────────────┬───────────────────────────────┐
//! │ r (32 bytes, big-endian)      │ s (32 bytes, big-endian)      │
//! └───────────────────────────────┴───────────────────────────────┘
//! ```
//!
//! and additionally insists that `s` lies in the lower half of the group
//! order. [`der_to_raw`] produces the first, [`normalize_low_s`] the second.

mod der;
mod low_s;

pub use der::der_to_raw;
pub use low_s::{SECP256R1_HALF_ORDER, SECP256R1_ORDER, is_low_s, normalize_low_s};

use crate::FormatError;

/// Byte length of one scalar (`r` or `s`).
pub const SCALAR_LENGTH: usize = 32;

/// Byte length of a raw `r || s` signature.
pub const RAW_SIGNATURE_LENGTH: usize = 2 * SCALAR_LENGTH;

/// A fixed-width `r || s` ECDSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSignature([u8; RAW_SIGNATURE_LENGTH]);

impl RawSignature {
    /// Assemble a signature from its two scalars.
    pub fn from_scalars(r: [u8; SCALAR_LENGTH], s: [u8; SCALAR_LENGTH]) -> Self {
        let mut bytes = [0u8; RAW_SIGNATURE_LENGTH];
        bytes[..SCALAR_LENGTH].copy_from_slice(&r);
        bytes[SCALAR_LENGTH..].copy_from_slice(&s);
        Self(bytes)
    }

    /// The `r` scalar.
    pub fn r(&self) -> [u8; SCALAR_LENGTH] {
        let mut r = [0u8; SCALAR_LENGTH];
        r.copy_from_slice(&self.0[..SCALAR_LENGTH]);
        r
    }

    /// The `s` scalar.
    pub fn s(&self) -> [u8; SCALAR_LENGTH] {
        let mut s = [0u8; SCALAR_LENGTH];
        s.copy_from_slice(&self.0[SCALAR_LENGTH..]);
        s
    }

    pub fn as_bytes(&self) -> &[u8; RAW_SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl From<[u8; RAW_SIGNATURE_LENGTH]> for RawSignature {
    fn from(bytes: [u8; RAW_SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for RawSignature {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; RAW_SIGNATURE_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| FormatError::InvalidSignatureFormat {
                    expected: RAW_SIGNATURE_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for RawSignature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_splits_scalars() {
        let signature = RawSignature::from_scalars([1u8; 32], [2u8; 32]);
        assert_eq!(signature.r(), [1u8; 32]);
        assert_eq!(signature.s(), [2u8; 32]);
        assert_eq!(signature.as_bytes()[31], 1);
        assert_eq!(signature.as_bytes()[32], 2);
    }

    #[test]
    fn it_rejects_slices_of_the_wrong_length() {
        let result = RawSignature::try_from(&[0u8; 63][..]);
        assert_eq!(
            result,
            Err(FormatError::InvalidSignatureFormat {
                expected: 64,
                actual: 63
            })
        );
    }
}
