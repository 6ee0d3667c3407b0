//! Challenge messages a guardian's passkey signs.
//!
//! The program rebuilds the same text from the instruction arguments and
//! compares it with the message inside the verifier instruction, so every
//! byte here is part of the contract. Each message ends with the 12-hex
//! short hash of the signing key, binding it to one guardian.

use moon_credentials::key::CompressedPublicKey;
use moon_encoding::Pubkey;
use moon_encoding::instruction::{GuardianId, ProposalId};
use std::fmt;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// What a guardian is being asked to authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Challenge {
    /// Open a transfer proposal.
    CreateTransfer {
        /// Amount in lamports.
        lamports: u64,
        /// Recipient.
        destination: Pubkey,
        /// Unix seconds.
        timestamp: i64,
    },
    /// Approve a proposal.
    Approve {
        /// Proposal being approved.
        proposal_id: ProposalId,
        /// Approving guardian.
        guardian_id: GuardianId,
        /// Unix seconds.
        timestamp: i64,
    },
    /// Reject a proposal.
    Reject {
        /// Proposal being rejected.
        proposal_id: ProposalId,
        /// Rejecting guardian.
        guardian_id: GuardianId,
        /// Unix seconds.
        timestamp: i64,
    },
    /// Transfer directly from the wallet.
    Transfer {
        /// Amount in lamports.
        lamports: u64,
        /// Recipient.
        destination: Pubkey,
        /// Must exceed the wallet's last used nonce.
        nonce: u64,
        /// Unix seconds.
        timestamp: i64,
    },
}

impl Challenge {
    /// The text `public_key` signs for this challenge.
    pub fn render(&self, public_key: &CompressedPublicKey) -> String {
        let key_hash = public_key.short_hash_hex();
        match self {
            Challenge::CreateTransfer {
                lamports,
                destination,
                timestamp,
            } => format!(
                "create:proposal_transfer_{}_SOL_to_{destination},timestamp:{timestamp},pubkey:{key_hash}",
                Sol(*lamports)
            ),
            Challenge::Approve {
                proposal_id,
                guardian_id,
                timestamp,
            } => format!(
                "approve:proposal_{proposal_id},guardian_{guardian_id},timestamp:{timestamp},pubkey:{key_hash}"
            ),
            Challenge::Reject {
                proposal_id,
                guardian_id,
                timestamp,
            } => format!(
                "reject:proposal_{proposal_id},guardian_{guardian_id},timestamp:{timestamp},pubkey:{key_hash}"
            ),
            Challenge::Transfer {
                lamports,
                destination,
                nonce,
                timestamp,
            } => format!(
                "transfer:{}_SOL_to_{destination},nonce:{nonce},timestamp:{timestamp},pubkey:{key_hash}",
                Sol(*lamports)
            ),
        }
    }
}

/// A lamport amount printed in SOL with no trailing fractional zeros.
///
/// `500_000_000` prints as `0.5`, `10_000_000_000` as `10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sol(pub u64);

impl fmt::Display for Sol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / LAMPORTS_PER_SOL;
        let fraction = self.0 % LAMPORTS_PER_SOL;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{fraction:09}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}
