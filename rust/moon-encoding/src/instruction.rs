//! Wallet program instruction payloads.
//!
//! Every payload is an 8-byte discriminator followed by the instruction's
//! arguments, Borsh-serialized in declaration order:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────────┐
//! │ Type             │ Bytes                                                │
//! ├──────────────────┼──────────────────────────────────────────────────────┤
//! │ u8 / bool        │ 1                                                    │
//! │ u64 / i64        │ 8, little-endian                                     │
//! │ [u8; N] / Pubkey │ N / 32, raw                                          │
//! │ String / Vec<u8> │ u32 LE length ‖ bytes                                │
//! │ Option<T>        │ 0x00  or  0x01 ‖ T                                   │
//! └──────────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! The field order below is the program's schema; reordering a field or
//! changing its width produces bytes the program will reject or misread.

use crate::discriminator;
use crate::{EncodeError, Pubkey};
use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A guardian's index within a multisig.
///
/// Has no `Default`: an unknown guardian is the caller's error, never
/// guardian `1`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize,
)]
#[serde(transparent)]
pub struct GuardianId(pub u64);

/// A proposal's index within a multisig.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, BorshSerialize,
)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl GuardianId {
    /// Little-endian bytes as used in address seeds.
    pub fn to_seed(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl ProposalId {
    pub fn to_seed(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for GuardianId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An instruction of the wallet program.
pub trait ProgramInstruction: BorshSerialize {
    /// Type name, used in error reports.
    const NAME: &'static str;

    /// The program's fixed identifier for this instruction.
    const DISCRIMINATOR: [u8; 8];

    /// The complete instruction data: discriminator, then arguments.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        self.serialize(&mut data)
            .map_err(|error| EncodeError::Serialize {
                instruction: Self::NAME,
                reason: error.to_string(),
            })?;
        Ok(data)
    }
}

macro_rules! program_instruction {
    ($name:ident, $discriminator:expr) => {
        impl ProgramInstruction for $name {
            const NAME: &'static str = stringify!($name);
            const DISCRIMINATOR: [u8; 8] = $discriminator;
        }
    };
}

/// `initialize_multisig`: create a wallet bound to a passkey credential.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct InitializeWallet {
    pub threshold: u8,
    /// SHA-256 of the owner's recovery phrase.
    pub recovery_hash: [u8; 32],
    pub credential_id: Vec<u8>,
}

program_instruction!(InitializeWallet, discriminator::INITIALIZE_MULTISIG);

/// `configure_webauthn`: attach the owner's passkey to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct ConfigureCredential {
    /// Compressed SEC1 P-256 key.
    pub webauthn_pubkey: [u8; 33],
}

program_instruction!(ConfigureCredential, discriminator::CONFIGURE_WEBAUTHN);

/// `add_guardian`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct AddGuardian {
    pub guardian_pubkey: Pubkey,
    pub guardian_name: String,
    pub recovery_hash: [u8; 32],
    pub is_owner: bool,
    pub webauthn_pubkey: Option<[u8; 33]>,
}

program_instruction!(AddGuardian, discriminator::ADD_GUARDIAN);

/// `create_proposal`
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct CreateProposal {
    pub proposal_id: ProposalId,
    pub description: String,
    pub proposer_guardian_id: GuardianId,
    pub action: String,
    pub amount: Option<u64>,
    pub destination: Option<Pubkey>,
    pub token_mint: Option<Pubkey>,
}

program_instruction!(CreateProposal, discriminator::CREATE_PROPOSAL);

/// `approve_proposal`: one guardian's signature on a proposal.
///
/// `message` is the challenge text the guardian's passkey signed; the
/// program checks it against the secp256r1 instruction preceding this one.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct ApproveProposal {
    pub proposal_id: ProposalId,
    pub guardian_id: GuardianId,
    pub timestamp: i64,
    pub message: String,
}

program_instruction!(ApproveProposal, discriminator::APPROVE_PROPOSAL);

/// `execute_proposal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize)]
pub struct ExecuteProposal {
    pub proposal_id: ProposalId,
}

program_instruction!(ExecuteProposal, discriminator::EXECUTE_PROPOSAL);

/// `verify_and_execute`: a transfer authorized directly by the owner's
/// passkey, without a proposal round.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct VerifyAndExecute {
    pub action: String,
    pub amount: Option<u64>,
    pub destination: Option<Pubkey>,
    pub token_mint: Option<Pubkey>,
    /// Must exceed the wallet's last used nonce.
    pub nonce: u64,
    pub timestamp: i64,
    pub message: Vec<u8>,
}

program_instruction!(VerifyAndExecute, discriminator::VERIFY_AND_EXECUTE);
