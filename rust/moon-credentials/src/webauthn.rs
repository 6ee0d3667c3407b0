//! WebAuthn P-256 assertions and registrations.
//!
//! The assertion is what a guardian's passkey produces when asked to approve
//! something. Its signature covers `authenticatorData || SHA-256(clientDataJSON)`,
//! never the human-readable challenge text directly; that text only travels
//! inside `clientDataJSON.challenge`.

mod assertion;
mod attestation;
mod error;
mod verifier;

pub use assertion::{ClientData, RegisteredCredential, WebAuthnAssertion, verification_data};
pub use attestation::{
    AttestedCredential, extract_credential_from_auth_data, extract_public_key_from_auth_data,
    extract_public_key_from_spki,
};
pub use error::WebAuthnVerifyError;
pub use verifier::WebAuthnVerifier;
