#![warn(missing_docs)]

//! Assembles passkey-authorized transactions for the Moon multisig wallet.
//!
//! A guardian's WebAuthn assertion is turned into two instructions that must
//! travel together, in this order, in one transaction:
//!
//! ```text
//! ┌────────────────────────────┐   ┌──────────────────────────────┐
//! │ secp256r1 verifier         │   │ wallet program instruction   │
//! │  pubkey ‖ sig ‖ message    │ → │  discriminator ‖ fields      │
//! └────────────────────────────┘   └──────────────────────────────┘
//!          index i                          index i + 1
//! ```
//!
//! The wallet program inspects the instructions sysvar to find the verifier
//! instruction ahead of it. Everything here prepares or transports bytes; the
//! semantic checks (does the signed message match the proposal, is the
//! guardian registered) happen on chain and come back as program error codes.
//!
//! The [`Ledger`](ledger::Ledger) and [`DocumentStore`](store::DocumentStore)
//! capabilities are traits so that the production JSON-RPC client and a
//! caller's document database can be swapped for in-memory doubles.

mod error;
pub use error::*;

pub mod accounts;
pub mod config;
pub mod ledger;
pub mod message;
pub mod pipeline;
pub mod proposal;
pub mod rpc;
pub mod secp256r1;
pub mod store;
pub mod transaction;

pub use moon_credentials as credentials;
pub use moon_encoding as encoding;
pub use moon_encoding::Pubkey;
