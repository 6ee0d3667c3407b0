//! P-256 signature and key codecs for WebAuthn passkey guardians.
//!
//! A passkey produces an ECDSA P-256 signature in ASN.1 DER form over
//! `authenticatorData || SHA-256(clientDataJSON)`. On-chain secp256r1
//! verifiers want something else: a fixed 64-byte `r || s` with a low `s`,
//! and a 33-byte compressed public key. This crate holds the conversions
//! between the two worlds:
//!
//! - [`signature`]: DER to raw conversion and Low-S normalization
//! - [`key`]: public-key compression and SPKI wrapping
//! - [`webauthn`]: assertions, registration key extraction and a native
//!   verification oracle
//!
//! Every function here is pure and safe to call from any thread.

mod error;
pub use error::*;

pub mod key;
pub mod signature;
pub mod webauthn;
