use super::error::WebAuthnVerifyError;
use crate::FormatError;
use crate::key::PublicKey;
use crate::signature::{RawSignature, der_to_raw, normalize_low_s};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// The byte string a WebAuthn assertion signature covers.
///
/// ```text
/// authenticatorData || SHA-256(clientDataJSON)
/// ```
///
/// The result is always `authenticator_data.len() + 32` bytes.
pub fn verification_data(authenticator_data: &[u8], client_data_json: &[u8]) -> Vec<u8> {
    let client_data_hash = Sha256::digest(client_data_json);
    let mut data = Vec::with_capacity(authenticator_data.len() + client_data_hash.len());
    data.extend_from_slice(authenticator_data);
    data.extend_from_slice(&client_data_hash);
    data
}

/// The output of a `navigator.credentials.get()` ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthnAssertion {
    /// DER-encoded ECDSA P-256 signature.
    pub signature: Vec<u8>,
    /// Raw authenticator data.
    pub authenticator_data: Vec<u8>,
    /// Raw `clientDataJSON` bytes, exactly as the authenticator hashed them.
    pub client_data_json: Vec<u8>,
}

impl WebAuthnAssertion {
    pub fn new(signature: Vec<u8>, authenticator_data: Vec<u8>, client_data_json: Vec<u8>) -> Self {
        Self {
            signature,
            authenticator_data,
            client_data_json,
        }
    }

    /// See [`verification_data`].
    pub fn verification_data(&self) -> Vec<u8> {
        verification_data(&self.authenticator_data, &self.client_data_json)
    }

    /// The signature as a Low-S normalized `r || s` pair, ready for the
    /// secp256r1 verifier.
    pub fn normalized_signature(&self) -> Result<RawSignature, FormatError> {
        Ok(normalize_low_s(&der_to_raw(&self.signature)?))
    }

    /// Parse the `clientDataJSON` payload.
    pub fn client_data(&self) -> Result<ClientData, WebAuthnVerifyError> {
        serde_json::from_slice(&self.client_data_json)
            .map_err(|error| WebAuthnVerifyError::InvalidClientData(error.to_string()))
    }
}

/// The fields of `clientDataJSON` this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    /// `webauthn.get` for assertions, `webauthn.create` for registrations.
    #[serde(rename = "type")]
    pub kind: String,
    /// base64url challenge, unpadded.
    pub challenge: String,
    pub origin: String,
    #[serde(default)]
    pub cross_origin: bool,
}

impl ClientData {
    /// The decoded challenge bytes.
    pub fn challenge_bytes(&self) -> Result<Vec<u8>, WebAuthnVerifyError> {
        URL_SAFE_NO_PAD
            .decode(self.challenge.trim_end_matches('='))
            .map_err(|error| WebAuthnVerifyError::InvalidClientData(error.to_string()))
    }

    /// Check that the ceremony was run over `expected`.
    pub fn ensure_challenge(&self, expected: &[u8]) -> Result<(), WebAuthnVerifyError> {
        if self.challenge_bytes()? != expected {
            return Err(WebAuthnVerifyError::ChallengeMismatch);
        }
        Ok(())
    }
}

/// The output of a `navigator.credentials.create()` ceremony, once its
/// public key has been recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCredential {
    pub credential_id: Vec<u8>,
    pub public_key: PublicKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn authenticator_data() -> Vec<u8> {
        let mut data = Sha256::digest(b"moon.wallet").to_vec();
        data.push(0x05);
        data.extend_from_slice(&[0, 0, 0, 1]);
        data
    }

    #[test]
    fn it_appends_the_client_data_hash() {
        let client_data_json = br#"{"type":"webauthn.get","challenge":"AAAA","origin":"https://moon.wallet"}"#;
        let data = verification_data(&authenticator_data(), client_data_json);

        assert_eq!(data.len(), 69);
        assert_eq!(&data[..37], &authenticator_data()[..]);
        assert_eq!(&data[37..], &Sha256::digest(client_data_json)[..]);
    }

    #[test]
    fn it_parses_client_data() {
        let assertion = WebAuthnAssertion::new(
            vec![],
            authenticator_data(),
            serde_json::to_vec(&serde_json::json!({
                "type": "webauthn.get",
                "challenge": URL_SAFE_NO_PAD.encode(b"approve:proposal_1"),
                "origin": "https://moon.wallet",
                "crossOrigin": false
            }))
            .unwrap(),
        );

        let client_data = assertion.client_data().unwrap();
        assert_eq!(client_data.kind, "webauthn.get");
        assert_eq!(client_data.challenge_bytes().unwrap(), b"approve:proposal_1");
        client_data.ensure_challenge(b"approve:proposal_1").unwrap();
        assert_eq!(
            client_data.ensure_challenge(b"approve:proposal_2"),
            Err(WebAuthnVerifyError::ChallengeMismatch)
        );
    }

    #[test]
    fn it_rejects_client_data_that_is_not_json() {
        let assertion = WebAuthnAssertion::new(vec![], authenticator_data(), b"nope".to_vec());
        assert!(matches!(
            assertion.client_data(),
            Err(WebAuthnVerifyError::InvalidClientData(_))
        ));
    }

    proptest! {
        #[test]
        fn verification_data_length_ignores_client_data_length(
            client_data_json in proptest::collection::vec(any::<u8>(), 0..4096)
        ) {
            let data = verification_data(&authenticator_data(), &client_data_json);
            prop_assert_eq!(data.len(), 37 + 32);
        }
    }
}
