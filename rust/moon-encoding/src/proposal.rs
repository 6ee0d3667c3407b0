//! On-chain proposal accounts.
//!
//! The program stores proposals as:
//!
//! ```text
//! ┌──────────────────┬───────────────┬──────────────┬─────────────┬─────────┐
//! │ discriminator (8)│ multisig (32) │ proposal_id  │ description │ action  │ ...
//! │                  │               │ u64 LE       │ u32 ‖ utf8  │ u32‖utf8│
//! └──────────────────┴───────────────┴──────────────┴─────────────┴─────────┘
//!     ┌────────┬──────────────────┬─────────────────────┬────────────┬──────────┐
//! ... │ status │ signatures_count │ required_signatures │ created_at │ proposer │
//!     │ u8     │ u8               │ u8                  │ i64 LE     │ (32)     │
//!     └────────┴──────────────────┴─────────────────────┴────────────┴──────────┘
//! ```
//!
//! The discriminator must be [`PROPOSAL_ACCOUNT`]; the program stores other
//! account types with the multisig at the same offset. Bytes after
//! `proposer` (action parameters and bookkeeping the program may append) are
//! ignored.

use crate::discriminator::PROPOSAL_ACCOUNT;
use crate::instruction::ProposalId;
use crate::reader::AccountReader;
use crate::{DecodeError, Pubkey};
use solana_pubkey::PUBKEY_BYTES;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset of the owning multisig address within a proposal account.
pub const MULTISIG_OFFSET: usize = 8;

/// Bytes before the proposal body: discriminator plus multisig address.
pub const PROPOSAL_HEADER_LENGTH: usize = MULTISIG_OFFSET + PUBKEY_BYTES;

/// Where a proposal is in its lifecycle.
///
/// `Executed`, `Rejected` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Executed,
    Rejected,
    Expired,
}

impl ProposalStatus {
    pub fn code(self) -> u8 {
        match self {
            ProposalStatus::Pending => 0,
            ProposalStatus::Executed => 1,
            ProposalStatus::Rejected => 2,
            ProposalStatus::Expired => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Executed => "executed",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Expired => "expired",
        }
    }
}

impl TryFrom<u8> for ProposalStatus {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ProposalStatus::Pending),
            1 => Ok(ProposalStatus::Executed),
            2 => Ok(ProposalStatus::Rejected),
            3 => Ok(ProposalStatus::Expired),
            unknown => Err(DecodeError::UnknownStatus(unknown)),
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The proposal fields decoded from account data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalBody {
    pub proposal_id: ProposalId,
    pub description: String,
    pub action: String,
    pub status: ProposalStatus,
    pub signatures_count: u8,
    pub required_signatures: u8,
    /// Unix seconds.
    pub created_at: i64,
    pub proposer: Pubkey,
}

/// A decoded proposal account with the multisig that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalAccount {
    pub multisig: Pubkey,
    pub body: ProposalBody,
}

/// Decode a full proposal account.
///
/// # Errors
///
/// [`DecodeError::UnexpectedAccountType`] when the account is not a proposal,
/// [`DecodeError::CorruptAccountData`] when the buffer ends before any field,
/// [`DecodeError::UnknownStatus`] for a status outside the known table and
/// [`DecodeError::InvalidUtf8`] for non-UTF-8 strings.
pub fn decode_proposal_account(data: &[u8]) -> Result<ProposalAccount, DecodeError> {
    let mut reader = AccountReader::new(data);
    expect_proposal(&mut reader)?;
    let multisig = reader.read_pubkey("multisig")?;
    let body = read_body(&mut reader)?;
    Ok(ProposalAccount { multisig, body })
}

/// Decode the proposal fields, checking the discriminator and skipping the
/// multisig address without interpreting it.
///
/// Used when the caller already knows the owning multisig, e.g. because it
/// filtered the account query on it.
pub fn decode_proposal_body(data: &[u8]) -> Result<ProposalBody, DecodeError> {
    let mut reader = AccountReader::new(data);
    expect_proposal(&mut reader)?;
    reader.skip(PUBKEY_BYTES, "multisig")?;
    read_body(&mut reader)
}

fn expect_proposal(reader: &mut AccountReader<'_>) -> Result<(), DecodeError> {
    let actual = reader.read_array::<MULTISIG_OFFSET>("discriminator")?;
    if actual != PROPOSAL_ACCOUNT {
        return Err(DecodeError::UnexpectedAccountType {
            kind: "Proposal",
            expected: PROPOSAL_ACCOUNT,
            actual,
        });
    }
    Ok(())
}

fn read_body(reader: &mut AccountReader<'_>) -> Result<ProposalBody, DecodeError> {
    let proposal_id = ProposalId(reader.read_u64("proposal_id")?);
    let description = reader.read_string("description")?;
    let action = reader.read_string("action")?;
    let status = ProposalStatus::try_from(reader.read_u8("status")?)?;
    let signatures_count = reader.read_u8("signatures_count")?;
    let required_signatures = reader.read_u8("required_signatures")?;
    let created_at = reader.read_i64("created_at")?;
    let proposer = reader.read_pubkey("proposer")?;

    Ok(ProposalBody {
        proposal_id,
        description,
        action,
        status,
        signatures_count,
        required_signatures,
        created_at,
        proposer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Lay out a proposal account the way the program writes it.
    fn proposal_account_bytes(status: u8) -> Vec<u8> {
        let mut data = PROPOSAL_ACCOUNT.to_vec();
        data.extend([0x11; 32]);
        data.extend(42u64.to_le_bytes());
        data.extend(12u32.to_le_bytes());
        data.extend(b"Transfer SOL");
        data.extend(8u32.to_le_bytes());
        data.extend(b"transfer");
        data.push(status);
        data.push(1);
        data.push(2);
        data.extend(1_700_000_000i64.to_le_bytes());
        data.extend([0x22; 32]);
        data
    }

    #[test]
    fn it_decodes_a_proposal_account() -> anyhow::Result<()> {
        let account = decode_proposal_account(&proposal_account_bytes(0))?;

        assert_eq!(account.multisig, Pubkey::new_from_array([0x11; 32]));
        assert_eq!(
            account.body,
            ProposalBody {
                proposal_id: ProposalId(42),
                description: "Transfer SOL".into(),
                action: "transfer".into(),
                status: ProposalStatus::Pending,
                signatures_count: 1,
                required_signatures: 2,
                created_at: 1_700_000_000,
                proposer: Pubkey::new_from_array([0x22; 32]),
            }
        );
        Ok(())
    }

    #[test]
    fn it_ignores_trailing_bytes() -> anyhow::Result<()> {
        let mut data = proposal_account_bytes(1);
        data.extend([0u8; 64]);
        let body = decode_proposal_body(&data)?;
        assert_eq!(body.status, ProposalStatus::Executed);
        Ok(())
    }

    #[test]
    fn it_maps_every_known_status() -> anyhow::Result<()> {
        for (code, status) in [
            (0, ProposalStatus::Pending),
            (1, ProposalStatus::Executed),
            (2, ProposalStatus::Rejected),
            (3, ProposalStatus::Expired),
        ] {
            assert_eq!(decode_proposal_body(&proposal_account_bytes(code))?.status, status);
            assert_eq!(status.code(), code);
        }
        Ok(())
    }

    #[test]
    fn it_surfaces_unknown_status_codes() {
        assert_eq!(
            decode_proposal_body(&proposal_account_bytes(4)),
            Err(DecodeError::UnknownStatus(4))
        );
    }

    #[test]
    fn it_fails_on_a_buffer_cut_inside_the_description_length() {
        let data = proposal_account_bytes(0);
        // header (40) + proposal_id (8) + two of the four length bytes
        let truncated = &data[..PROPOSAL_HEADER_LENGTH + 8 + 2];

        assert_eq!(
            decode_proposal_body(truncated),
            Err(DecodeError::CorruptAccountData {
                field: "description",
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn every_truncation_is_corrupt_account_data() {
        let data = proposal_account_bytes(0);
        for length in 0..data.len() {
            assert!(
                matches!(
                    decode_proposal_account(&data[..length]),
                    Err(DecodeError::CorruptAccountData { .. })
                ),
                "length {length} should be reported as corrupt"
            );
        }
    }

    #[test]
    fn it_rejects_accounts_of_another_type() {
        // A guardian record also stores its multisig at offset 8
        let mut data = proposal_account_bytes(0);
        data[..8].copy_from_slice(&[57, 234, 122, 214, 12, 246, 9, 45]);

        assert_eq!(
            decode_proposal_account(&data),
            Err(DecodeError::UnexpectedAccountType {
                kind: "Proposal",
                expected: PROPOSAL_ACCOUNT,
                actual: [57, 234, 122, 214, 12, 246, 9, 45],
            })
        );
        assert!(matches!(
            decode_proposal_body(&data),
            Err(DecodeError::UnexpectedAccountType { .. })
        ));
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(!ProposalStatus::Pending.is_terminal());
        assert!(ProposalStatus::Executed.is_terminal());
        assert!(ProposalStatus::Rejected.is_terminal());
        assert!(ProposalStatus::Expired.is_terminal());
    }
}
