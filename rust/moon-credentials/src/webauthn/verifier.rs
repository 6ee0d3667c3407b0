//! Native P-256 verification of WebAuthn assertions.
//!
//! The ledger's secp256r1 program is the verifier that counts. This one runs
//! locally so a bad signature or key is caught before a transaction is paid
//! for, and gives tests an independent oracle for the byte conversions.

use super::assertion::WebAuthnAssertion;
use super::error::WebAuthnVerifyError;
use crate::key::{CompressedPublicKey, PublicKey};
use crate::signature::RawSignature;
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{DerSignature, Signature, VerifyingKey};
use p256::pkcs8::DecodePublicKey;

/// A guardian's passkey public key, ready to verify assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnVerifier {
    key: VerifyingKey,
}

impl WebAuthnVerifier {
    /// Create a verifier from SEC1 bytes in either form.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a point on P-256.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, WebAuthnVerifyError> {
        let key =
            VerifyingKey::from_sec1_bytes(bytes).map_err(|_| WebAuthnVerifyError::InvalidKey)?;
        Ok(Self { key })
    }

    pub fn from_public_key(key: &PublicKey) -> Result<Self, WebAuthnVerifyError> {
        Self::from_sec1_bytes(&key.to_vec())
    }

    /// Create a verifier from a DER SubjectPublicKeyInfo, the form browsers
    /// hand to `crypto.subtle.importKey("spki", ...)`.
    pub fn from_spki(spki: &[u8]) -> Result<Self, WebAuthnVerifyError> {
        let key =
            VerifyingKey::from_public_key_der(spki).map_err(|_| WebAuthnVerifyError::InvalidKey)?;
        Ok(Self { key })
    }

    /// The compressed form of the key, as embedded in instructions.
    pub fn compressed(&self) -> Result<CompressedPublicKey, WebAuthnVerifyError> {
        let point = self.key.to_encoded_point(true);
        CompressedPublicKey::try_from(point.as_bytes()).map_err(|_| WebAuthnVerifyError::InvalidKey)
    }

    /// Verify the DER signature of an assertion over its verification data.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature cannot be decoded or does not verify.
    pub fn verify_assertion(&self, assertion: &WebAuthnAssertion) -> Result<(), WebAuthnVerifyError> {
        let signature = DerSignature::from_bytes(&assertion.signature)
            .map_err(|error| WebAuthnVerifyError::InvalidSignature(error.to_string()))?;
        self.key
            .verify(&assertion.verification_data(), &signature)
            .map_err(|error| WebAuthnVerifyError::InvalidSignature(error.to_string()))
    }

    /// Verify a fixed-width signature over `message`, exactly as the
    /// secp256r1 program would see it.
    pub fn verify_raw(
        &self,
        message: &[u8],
        signature: &RawSignature,
    ) -> Result<(), WebAuthnVerifyError> {
        let signature = Signature::from_slice(signature.as_bytes())
            .map_err(|error| WebAuthnVerifyError::InvalidSignature(error.to_string()))?;
        self.key
            .verify(message, &signature)
            .map_err(|error| WebAuthnVerifyError::InvalidSignature(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::UncompressedPublicKey;
    use p256::ecdsa::{SigningKey, signature::Signer as _};
    use sha2::{Digest, Sha256};

    fn assertion_for(key: &SigningKey, client_data_json: &[u8]) -> WebAuthnAssertion {
        let mut authenticator_data = Sha256::digest(b"moon.wallet").to_vec();
        authenticator_data.push(0x05);
        authenticator_data.extend_from_slice(&[0, 0, 0, 9]);

        let mut signed = authenticator_data.clone();
        signed.extend_from_slice(&Sha256::digest(client_data_json));
        let signature: DerSignature = key.sign(&signed);

        WebAuthnAssertion::new(
            signature.as_bytes().to_vec(),
            authenticator_data,
            client_data_json.to_vec(),
        )
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[42u8; 32].into()).unwrap()
    }

    #[test]
    fn it_verifies_an_assertion() {
        let key = signing_key();
        let verifier = WebAuthnVerifier {
            key: *key.verifying_key(),
        };
        let assertion = assertion_for(&key, br#"{"type":"webauthn.get"}"#);

        verifier.verify_assertion(&assertion).unwrap();
    }

    #[test]
    fn it_rejects_tampered_authenticator_data() {
        let key = signing_key();
        let verifier = WebAuthnVerifier {
            key: *key.verifying_key(),
        };
        let mut assertion = assertion_for(&key, br#"{"type":"webauthn.get"}"#);
        assertion.authenticator_data[0] ^= 0xff;

        assert!(matches!(
            verifier.verify_assertion(&assertion),
            Err(WebAuthnVerifyError::InvalidSignature(_))
        ));
    }

    #[test]
    fn it_verifies_the_normalized_raw_signature() {
        let key = signing_key();
        let assertion = assertion_for(&key, br#"{"type":"webauthn.get","n":1}"#);
        let point = key.verifying_key().to_encoded_point(false);
        let uncompressed = UncompressedPublicKey::try_from(point.as_bytes()).unwrap();

        let verifier = WebAuthnVerifier::from_spki(&uncompressed.to_spki()).unwrap();
        let raw = assertion.normalized_signature().unwrap();
        verifier.verify_raw(&assertion.verification_data(), &raw).unwrap();
    }

    #[test]
    fn it_compresses_the_same_way_as_the_codec() {
        let key = signing_key();
        let point = key.verifying_key().to_encoded_point(false);
        let uncompressed = UncompressedPublicKey::try_from(point.as_bytes()).unwrap();

        let verifier = WebAuthnVerifier::from_public_key(&uncompressed.into()).unwrap();
        assert_eq!(verifier.compressed().unwrap(), uncompressed.compress());
    }

    #[test]
    fn it_rejects_points_off_the_curve() {
        let bogus = UncompressedPublicKey::from_coordinates(&[1u8; 32], &[2u8; 32]);
        assert_eq!(
            WebAuthnVerifier::from_spki(&bogus.to_spki()),
            Err(WebAuthnVerifyError::InvalidKey)
        );
    }
}
