//! One view of a proposal, whether read from the ledger or from the
//! document store's cache.

use crate::accounts::WalletAccounts;
use crate::ledger::{Ledger, MemcmpFilter};
use crate::{BridgeError, StoreError};
use moon_encoding::Pubkey;
use moon_encoding::discriminator::PROPOSAL_ACCOUNT;
use moon_encoding::instruction::ProposalId;
use moon_encoding::proposal::{
    MULTISIG_OFFSET, ProposalAccount, ProposalStatus, decode_proposal_account,
};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

/// A proposal account as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainProposal {
    /// The proposal account's address.
    pub address: Pubkey,
    /// Its decoded contents.
    pub account: ProposalAccount,
}

/// A proposal as the client caches it in the document store.
///
/// Addresses are stored as base58 text.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProposalRecord {
    /// Proposal index within the multisig.
    pub proposal_id: ProposalId,
    /// Owning multisig.
    #[serde_as(as = "DisplayFromStr")]
    pub multisig_address: Pubkey,
    /// Free-form description.
    pub description: String,
    /// Action name, e.g. `transfer`.
    pub action: String,
    /// Lifecycle status as text (`pending`, `executed`, ...).
    pub status: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Who paid for the proposal.
    #[serde_as(as = "DisplayFromStr")]
    pub creator: Pubkey,
    /// Guardians that have signed so far.
    #[serde(default)]
    pub signers: Vec<String>,
    /// Approvals needed before execution.
    pub required_signatures: u8,
    /// Transfer amount in lamports.
    #[serde(default)]
    pub amount: Option<u64>,
    /// Transfer recipient.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub destination: Option<Pubkey>,
    /// Token mint for token transfers.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub token_mint: Option<Pubkey>,
    /// Signature of the transaction that created the proposal.
    #[serde(default)]
    pub transaction_signature: Option<String>,
}

/// Where a proposal was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalSource {
    /// Decoded from the ledger.
    OnChain(OnChainProposal),
    /// Read from the document store.
    Cached(CachedProposalRecord),
}

/// What the rest of the client sees of a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalView {
    /// Proposal index within the multisig.
    pub proposal_id: ProposalId,
    /// Owning multisig.
    pub multisig: Pubkey,
    /// Free-form description.
    pub description: String,
    /// Action name.
    pub action: String,
    /// Lifecycle status.
    pub status: ProposalStatus,
    /// Approvals collected.
    pub signatures_count: usize,
    /// Approvals needed.
    pub required_signatures: u8,
    /// Unix seconds.
    pub created_at: i64,
    /// Proposer (on chain) or creator (cached).
    pub proposer: Pubkey,
    /// Proposal account address, when read from the ledger.
    pub address: Option<Pubkey>,
    /// Transfer amount in lamports, when known.
    pub amount: Option<u64>,
    /// Transfer recipient, when known.
    pub destination: Option<Pubkey>,
    /// Creating transaction, when known.
    pub transaction_signature: Option<String>,
}

impl ProposalView {
    /// Pending and holding enough approvals to execute.
    pub fn is_executable(&self) -> bool {
        self.status == ProposalStatus::Pending
            && self.signatures_count >= usize::from(self.required_signatures)
    }
}

impl From<OnChainProposal> for ProposalView {
    fn from(proposal: OnChainProposal) -> Self {
        let OnChainProposal { address, account } = proposal;
        let body = account.body;
        Self {
            proposal_id: body.proposal_id,
            multisig: account.multisig,
            description: body.description,
            action: body.action,
            status: body.status,
            signatures_count: usize::from(body.signatures_count),
            required_signatures: body.required_signatures,
            created_at: body.created_at,
            proposer: body.proposer,
            address: Some(address),
            amount: None,
            destination: None,
            transaction_signature: None,
        }
    }
}

impl TryFrom<CachedProposalRecord> for ProposalView {
    type Error = StoreError;

    fn try_from(record: CachedProposalRecord) -> Result<Self, Self::Error> {
        let status = parse_status(&record.status)?;
        Ok(Self {
            proposal_id: record.proposal_id,
            multisig: record.multisig_address,
            description: record.description,
            action: record.action,
            status,
            signatures_count: record.signers.len(),
            required_signatures: record.required_signatures,
            created_at: record.created_at,
            proposer: record.creator,
            address: None,
            amount: record.amount,
            destination: record.destination,
            transaction_signature: record.transaction_signature,
        })
    }
}

impl TryFrom<ProposalSource> for ProposalView {
    type Error = StoreError;

    fn try_from(source: ProposalSource) -> Result<Self, Self::Error> {
        match source {
            ProposalSource::OnChain(proposal) => Ok(proposal.into()),
            ProposalSource::Cached(record) => record.try_into(),
        }
    }
}

fn parse_status(value: &str) -> Result<ProposalStatus, StoreError> {
    [
        ProposalStatus::Pending,
        ProposalStatus::Executed,
        ProposalStatus::Rejected,
        ProposalStatus::Expired,
    ]
    .into_iter()
    .find(|status| status.as_str() == value)
    .ok_or_else(|| StoreError::UnknownValue {
        field: "status",
        value: value.to_string(),
    })
}

/// Every proposal of `wallet` on the ledger, ordered by id.
///
/// Only accounts tagged as proposals and naming this multisig are fetched.
/// Accounts that still do not decode are skipped with a warning; one
/// corrupt account does not hide the others.
pub async fn load_proposals(
    ledger: &dyn Ledger,
    wallet: &WalletAccounts,
) -> Result<Vec<OnChainProposal>, BridgeError> {
    let filters = [
        MemcmpFilter::new(0, PROPOSAL_ACCOUNT),
        MemcmpFilter::new(MULTISIG_OFFSET, wallet.multisig().to_bytes()),
    ];
    let accounts = ledger.program_accounts(wallet.program_id(), &filters).await?;

    let mut proposals: Vec<OnChainProposal> = accounts
        .into_iter()
        .filter_map(|keyed| match decode_proposal_account(&keyed.data) {
            Ok(account) => Some(OnChainProposal {
                address: keyed.address,
                account,
            }),
            Err(error) => {
                tracing::warn!(address = %keyed.address, %error, "Skipping undecodable proposal account");
                None
            }
        })
        .collect();
    proposals.sort_by_key(|proposal| proposal.account.body.proposal_id);

    tracing::debug!(count = proposals.len(), multisig = %wallet.multisig(), "Loaded proposals");
    Ok(proposals)
}

/// One proposal of `wallet`, if its account exists.
pub async fn load_proposal(
    ledger: &dyn Ledger,
    wallet: &WalletAccounts,
    proposal_id: ProposalId,
) -> Result<Option<OnChainProposal>, BridgeError> {
    let address = wallet.proposal_address(proposal_id)?;
    let Some(data) = ledger.account_data(&address).await? else {
        return Ok(None);
    };
    Ok(Some(OnChainProposal {
        address,
        account: decode_proposal_account(&data)?,
    }))
}
