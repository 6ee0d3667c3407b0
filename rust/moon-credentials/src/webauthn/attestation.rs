//! Public key recovery from registration ceremonies.
//!
//! A registration response exposes the credential key in two places: the
//! attested credential data inside `authenticatorData`, and (on browsers that
//! support `getPublicKey()`) a DER SubjectPublicKeyInfo. Both are parsed here
//! into an [`UncompressedPublicKey`] that is checked to lie on P-256.
//!
//! Attested credential data layout:
//!
//! ```text
//! ┌──────────────┬───────┬─────────┬──────────┬──────────────┬─────────┬──────────────┐
//! │ rpIdHash (32)│ flags │ count(4)│ AAGUID 16│ credIdLen u16│ credId  │ COSE_Key ... │
//! └──────────────┴───────┴─────────┴──────────┴──────────────┴─────────┴──────────────┘
//!                                              big-endian
//! ```
//!
//! The COSE key is a CBOR map; for EC2 keys `1 => 2` (kty), `3 => -7` (alg),
//! `-1 => 1` (crv P-256), `-2 => x`, `-3 => y`.

use crate::FormatError;
use crate::key::{P256_SPKI_HEADER, SPKI_KEY_LENGTH, UncompressedPublicKey};
use ciborium::value::Value;

const RP_ID_HASH_LENGTH: usize = 32;
const FLAGS_OFFSET: usize = RP_ID_HASH_LENGTH;
const AAGUID_OFFSET: usize = RP_ID_HASH_LENGTH + 1 + 4;
const CREDENTIAL_ID_LENGTH_OFFSET: usize = AAGUID_OFFSET + 16;
const CREDENTIAL_ID_OFFSET: usize = CREDENTIAL_ID_LENGTH_OFFSET + 2;

const ATTESTED_CREDENTIAL_DATA_FLAG: u8 = 0x40;

const COSE_KTY: i128 = 1;
const COSE_ALG: i128 = 3;
const COSE_EC2_CRV: i128 = -1;
const COSE_EC2_X: i128 = -2;
const COSE_EC2_Y: i128 = -3;
const COSE_KTY_EC2: i128 = 2;
const COSE_ALG_ES256: i128 = -7;
const COSE_CRV_P256: i128 = 1;

/// The credential recovered from attested credential data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredential {
    pub credential_id: Vec<u8>,
    pub public_key: UncompressedPublicKey,
}

/// Parse the attested credential data of a registration's `authenticatorData`.
///
/// # Errors
///
/// [`FormatError::KeyExtractionFailed`] if the data is truncated, carries no
/// attested credential, or holds anything but an ES256 P-256 key. No key is
/// ever made up in place of one that cannot be read.
pub fn extract_credential_from_auth_data(
    auth_data: &[u8],
) -> Result<AttestedCredential, FormatError> {
    let flags = *auth_data.get(FLAGS_OFFSET).ok_or_else(|| {
        FormatError::extraction(format!(
            "authenticator data is {} bytes, too short for flags",
            auth_data.len()
        ))
    })?;
    if flags & ATTESTED_CREDENTIAL_DATA_FLAG == 0 {
        return Err(FormatError::extraction(
            "authenticator data carries no attested credential",
        ));
    }

    let length_bytes = auth_data
        .get(CREDENTIAL_ID_LENGTH_OFFSET..CREDENTIAL_ID_OFFSET)
        .ok_or_else(|| FormatError::extraction("truncated before credential id length"))?;
    let credential_id_length = u16::from_be_bytes([length_bytes[0], length_bytes[1]]) as usize;
    let cose_offset = CREDENTIAL_ID_OFFSET + credential_id_length;
    let credential_id = auth_data
        .get(CREDENTIAL_ID_OFFSET..cose_offset)
        .ok_or_else(|| {
            FormatError::extraction(format!(
                "credential id declares {credential_id_length} bytes but authenticator data ends first"
            ))
        })?
        .to_vec();

    let public_key = parse_cose_ec2_key(&auth_data[cose_offset..])?;
    Ok(AttestedCredential {
        credential_id,
        public_key,
    })
}

/// Recover just the public key from a registration's `authenticatorData`.
pub fn extract_public_key_from_auth_data(
    auth_data: &[u8],
) -> Result<UncompressedPublicKey, FormatError> {
    Ok(extract_credential_from_auth_data(auth_data)?.public_key)
}

/// Recover the public key from a DER SubjectPublicKeyInfo.
///
/// # Errors
///
/// [`FormatError::KeyExtractionFailed`] unless the input is a P-256 SPKI
/// holding an uncompressed point on the curve.
pub fn extract_public_key_from_spki(spki: &[u8]) -> Result<UncompressedPublicKey, FormatError> {
    if spki.len() != SPKI_KEY_LENGTH {
        return Err(FormatError::extraction(format!(
            "SPKI is {} bytes, expected {SPKI_KEY_LENGTH}",
            spki.len()
        )));
    }
    let (header, point) = spki.split_at(P256_SPKI_HEADER.len());
    if header != P256_SPKI_HEADER {
        return Err(FormatError::extraction("SPKI does not describe a P-256 key"));
    }
    let key = UncompressedPublicKey::try_from(point)
        .map_err(|error| FormatError::extraction(error.to_string()))?;
    ensure_on_curve(key)
}

fn ensure_on_curve(key: UncompressedPublicKey) -> Result<UncompressedPublicKey, FormatError> {
    p256::PublicKey::from_sec1_bytes(key.as_bytes())
        .map_err(|_| FormatError::extraction("point is not on the P-256 curve"))?;
    Ok(key)
}

/// Read an EC2 key out of a COSE_Key map.
///
/// Only the first CBOR item is decoded, so extension data following the key
/// is left alone. Labels other than the five below may hold any CBOR value.
fn parse_cose_ec2_key(bytes: &[u8]) -> Result<UncompressedPublicKey, FormatError> {
    let value: Value = ciborium::de::from_reader(bytes)
        .map_err(|error| FormatError::extraction(format!("COSE key is not valid CBOR: {error}")))?;
    let entries = value
        .into_map()
        .map_err(|_| FormatError::extraction("COSE key is not a CBOR map"))?;

    let label = |wanted: i128| {
        entries
            .iter()
            .find(|(key, _)| key.as_integer().map(i128::from) == Some(wanted))
            .map(|(_, value)| value)
    };
    let integer = |wanted: i128| label(wanted).and_then(Value::as_integer).map(i128::from);

    let kty = integer(COSE_KTY);
    if kty != Some(COSE_KTY_EC2) {
        return Err(FormatError::extraction(format!(
            "COSE key type {kty:?} is not EC2"
        )));
    }
    let alg = integer(COSE_ALG);
    if alg.is_some_and(|alg| alg != COSE_ALG_ES256) {
        return Err(FormatError::extraction(format!(
            "COSE algorithm {alg:?} is not ES256"
        )));
    }
    let crv = integer(COSE_EC2_CRV);
    if crv.is_some_and(|crv| crv != COSE_CRV_P256) {
        return Err(FormatError::extraction(format!(
            "COSE curve {crv:?} is not P-256"
        )));
    }

    let x = coordinate(label(COSE_EC2_X), "x")?;
    let y = coordinate(label(COSE_EC2_Y), "y")?;
    ensure_on_curve(UncompressedPublicKey::from_coordinates(&x, &y))
}

fn coordinate(value: Option<&Value>, name: &str) -> Result<[u8; 32], FormatError> {
    let value = value
        .and_then(Value::as_bytes)
        .ok_or_else(|| FormatError::extraction(format!("COSE key has no {name} byte string")))?;
    value.as_slice().try_into().map_err(|_| {
        FormatError::extraction(format!(
            "COSE {name} coordinate is {} bytes, expected 32",
            value.len()
        ))
    })
}
