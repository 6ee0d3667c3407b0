use crate::ledger::TransactionFailure;
use moon_credentials::FormatError;
use moon_encoding::{DecodeError, EncodeError, Pubkey};
use solana_signer::SignerError;
use thiserror::Error;

/// Errors raised while building, submitting or reading back wallet
/// transactions.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A signature or key was not in the expected encoding.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Account data could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Instruction arguments could not be serialized.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The signed message is too long for the verifier's 16-bit offset table.
    #[error("message of {length} bytes exceeds the verifier limit of {max}")]
    MessageTooLong {
        /// Length of the message that was supplied.
        length: usize,
        /// Longest message the verifier instruction can describe.
        max: usize,
    },

    /// No off-curve address exists for the given seeds.
    #[error("could not derive a {kind} address")]
    AddressDerivation {
        /// Which account was being derived.
        kind: &'static str,
    },

    /// A transaction references more accounts than a message can index.
    #[error("transaction references {count} accounts, at most {max} are allowed")]
    TooManyAccounts {
        /// Distinct accounts referenced.
        count: usize,
        /// Most accounts a message can index.
        max: usize,
    },

    /// A required signer has no key among those supplied.
    #[error("no signing key supplied for {0}")]
    MissingSigner(Pubkey),

    /// A supplied key failed to sign the transaction message.
    #[error("failed to sign transaction: {0}")]
    Signing(#[from] SignerError),

    /// A ledger request failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A document store write failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from talking to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The request never produced a response.
    #[error("ledger request {method} failed: {reason}")]
    Transport {
        /// JSON-RPC method being called.
        method: &'static str,
        /// Transport level failure.
        reason: String,
    },

    /// The node answered with a JSON-RPC error object.
    #[error("ledger rejected {method} ({code}): {message}")]
    Rpc {
        /// JSON-RPC method being called.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// Error message reported by the node.
        message: String,
    },

    /// The node answered with something that is not the expected shape.
    #[error("unexpected {method} response: {reason}")]
    InvalidResponse {
        /// JSON-RPC method being called.
        method: &'static str,
        /// What did not parse.
        reason: String,
    },

    /// The node refused the transaction after simulating it.
    #[error("transaction failed preflight: {0}")]
    Preflight(TransactionFailure),

    /// The requested account does not exist.
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),
}

/// Errors from the document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A document could not be written.
    #[error("failed to write {collection}/{id}: {reason}")]
    WriteFailed {
        /// Collection the document belongs to.
        collection: &'static str,
        /// Document identifier.
        id: String,
        /// Why the write failed.
        reason: String,
    },

    /// A guardian's onboarding status would move backwards.
    #[error("guardian status cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: &'static str,
        /// Requested status.
        to: &'static str,
    },

    /// A cached document holds a value the read model does not know.
    #[error("cached {field} has unknown value {value:?}")]
    UnknownValue {
        /// Field holding the value.
        field: &'static str,
        /// The value that was found.
        value: String,
    },
}
