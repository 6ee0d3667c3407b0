//! P-256 public key encodings.
//!
//! Passkey registration yields an uncompressed SEC1 point; the secp256r1
//! verifier and the wallet program both want the compressed form:
//!
//! ```text
//! uncompressed (65):  04 │ X (32) │ Y (32)
//! compressed   (33):  02 | 03 │ X (32)        02 when Y is even, 03 when odd
//! ```

use crate::FormatError;
use sha2::{Digest, Sha256};

/// Length of a compressed SEC1 point.
pub const COMPRESSED_KEY_LENGTH: usize = 33;

/// Length of an uncompressed SEC1 point.
pub const UNCOMPRESSED_KEY_LENGTH: usize = 65;

/// Length of an SPKI-wrapped P-256 public key.
pub const SPKI_KEY_LENGTH: usize = P256_SPKI_HEADER.len() + UNCOMPRESSED_KEY_LENGTH;

const UNCOMPRESSED_PREFIX: u8 = 0x04;
const EVEN_PREFIX: u8 = 0x02;
const ODD_PREFIX: u8 = 0x03;

/// DER prefix of a P-256 SubjectPublicKeyInfo.
///
/// ```text
/// 30 59                                   SEQUENCE (89 bytes)
///    30 13                                SEQUENCE (19 bytes)
///       06 07 2a8648ce3d0201              OID 1.2.840.10045.2.1 (ecPublicKey)
///       06 08 2a8648ce3d030107            OID 1.2.840.10045.3.1.7 (P-256)
///    03 42 00                             BIT STRING (66 bytes, 0 unused)
/// ```
///
/// Followed by the 65-byte uncompressed point `04 || X || Y`.
pub const P256_SPKI_HEADER: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

/// Number of SHA-256 bytes used for a key's short hash.
const SHORT_HASH_LENGTH: usize = 6;

/// A 65-byte `04 || X || Y` P-256 point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UncompressedPublicKey([u8; UNCOMPRESSED_KEY_LENGTH]);

impl UncompressedPublicKey {
    /// Build a key from its two coordinates.
    pub fn from_coordinates(x: &[u8; 32], y: &[u8; 32]) -> Self {
        let mut bytes = [0u8; UNCOMPRESSED_KEY_LENGTH];
        bytes[0] = UNCOMPRESSED_PREFIX;
        bytes[1..33].copy_from_slice(x);
        bytes[33..].copy_from_slice(y);
        Self(bytes)
    }

    pub fn x(&self) -> &[u8] {
        &self.0[1..33]
    }

    pub fn y(&self) -> &[u8] {
        &self.0[33..]
    }

    pub fn as_bytes(&self) -> &[u8; UNCOMPRESSED_KEY_LENGTH] {
        &self.0
    }

    /// Compress the point: the parity of Y picks the prefix, X follows.
    pub fn compress(&self) -> CompressedPublicKey {
        let mut bytes = [0u8; COMPRESSED_KEY_LENGTH];
        bytes[0] = if self.0[UNCOMPRESSED_KEY_LENGTH - 1] & 1 == 0 {
            EVEN_PREFIX
        } else {
            ODD_PREFIX
        };
        bytes[1..].copy_from_slice(self.x());
        CompressedPublicKey(bytes)
    }

    /// Wrap the point in a DER SubjectPublicKeyInfo for generic verifiers.
    pub fn to_spki(&self) -> [u8; SPKI_KEY_LENGTH] {
        let mut spki = [0u8; SPKI_KEY_LENGTH];
        spki[..P256_SPKI_HEADER.len()].copy_from_slice(&P256_SPKI_HEADER);
        spki[P256_SPKI_HEADER.len()..].copy_from_slice(&self.0);
        spki
    }
}

impl TryFrom<&[u8]> for UncompressedPublicKey {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; UNCOMPRESSED_KEY_LENGTH] =
            bytes.try_into().map_err(|_| FormatError::InvalidKeyFormat {
                expected: UNCOMPRESSED_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        if bytes[0] != UNCOMPRESSED_PREFIX {
            return Err(FormatError::InvalidKeyPrefix {
                expected: "0x04",
                actual: bytes[0],
            });
        }
        Ok(Self(bytes))
    }
}

/// Compress a 65-byte uncompressed key given as a slice.
///
/// # Errors
///
/// Fails unless `uncompressed` is exactly 65 bytes starting with `0x04`.
pub fn compress(uncompressed: &[u8]) -> Result<CompressedPublicKey, FormatError> {
    Ok(UncompressedPublicKey::try_from(uncompressed)?.compress())
}

/// A 33-byte `02|03 || X` P-256 point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPublicKey([u8; COMPRESSED_KEY_LENGTH]);

impl CompressedPublicKey {
    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    pub fn x(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn as_bytes(&self) -> &[u8; COMPRESSED_KEY_LENGTH] {
        &self.0
    }

    /// The same X coordinate with the opposite Y parity.
    ///
    /// Some registrations computed the parity from the wrong end of Y. This
    /// exists only so those keys can still be addressed; see
    /// `VerifierOptions::flip_key_parity` in the bridge.
    pub fn with_flipped_parity(&self) -> Self {
        let mut bytes = self.0;
        bytes[0] = if bytes[0] == EVEN_PREFIX {
            ODD_PREFIX
        } else {
            EVEN_PREFIX
        };
        Self(bytes)
    }

    /// Lowercase hex of the first six bytes of `SHA-256(key)`.
    ///
    /// Binds challenge messages to the signing key without embedding it whole.
    pub fn short_hash_hex(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..SHORT_HASH_LENGTH])
    }
}

impl TryFrom<&[u8]> for CompressedPublicKey {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; COMPRESSED_KEY_LENGTH] =
            bytes.try_into().map_err(|_| FormatError::InvalidKeyFormat {
                expected: COMPRESSED_KEY_LENGTH,
                actual: bytes.len(),
            })?;
        if bytes[0] != EVEN_PREFIX && bytes[0] != ODD_PREFIX {
            return Err(FormatError::InvalidKeyPrefix {
                expected: "0x02 or 0x03",
                actual: bytes[0],
            });
        }
        Ok(Self(bytes))
    }
}

impl AsRef<[u8]> for CompressedPublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A public key in whichever SEC1 form a registration produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicKey {
    Compressed(CompressedPublicKey),
    Uncompressed(UncompressedPublicKey),
}

impl PublicKey {
    pub fn to_compressed(&self) -> CompressedPublicKey {
        match self {
            PublicKey::Compressed(key) => *key,
            PublicKey::Uncompressed(key) => key.compress(),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            PublicKey::Compressed(key) => key.as_bytes().to_vec(),
            PublicKey::Uncompressed(key) => key.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = FormatError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            COMPRESSED_KEY_LENGTH => Ok(PublicKey::Compressed(bytes.try_into()?)),
            UNCOMPRESSED_KEY_LENGTH => Ok(PublicKey::Uncompressed(bytes.try_into()?)),
            actual => Err(FormatError::InvalidKeyFormat {
                expected: UNCOMPRESSED_KEY_LENGTH,
                actual,
            }),
        }
    }
}

impl From<CompressedPublicKey> for PublicKey {
    fn from(key: CompressedPublicKey) -> Self {
        PublicKey::Compressed(key)
    }
}

impl From<UncompressedPublicKey> for PublicKey {
    fn from(key: UncompressedPublicKey) -> Self {
        PublicKey::Uncompressed(key)
    }
}
