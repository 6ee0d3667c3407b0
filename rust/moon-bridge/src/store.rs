//! The document store capability: the client's cache of proposals and the
//! mapping from passkey credentials to wallets.

use crate::StoreError;
use crate::ledger::Submission;
use crate::proposal::CachedProposalRecord;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use moon_credentials::key::PublicKey;
use moon_encoding::Pubkey;
use moon_encoding::instruction::GuardianId;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fmt;

/// Collection holding [`CachedProposalRecord`]s.
pub const PROPOSALS_COLLECTION: &str = "proposals";

/// Collection holding [`CredentialMapping`]s, keyed by hex credential id.
pub const CREDENTIALS_COLLECTION: &str = "webauthn_credentials";

/// Where a guardian is in onboarding.
///
/// Statuses only move forward: `pending` when invited, `ready` once the
/// passkey is registered, `completed` once the guardian is on chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardianStatus {
    /// Invited, no credential yet.
    #[default]
    Pending,
    /// Credential registered, not yet added to the wallet.
    Ready,
    /// Added to the wallet on chain.
    Completed,
}

impl GuardianStatus {
    /// Lowercase name, as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardianStatus::Pending => "pending",
            GuardianStatus::Ready => "ready",
            GuardianStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GuardianStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links a passkey credential to the wallet and guardian it controls.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMapping {
    /// Credential id, lowercase hex. Also the document id.
    pub credential_id: String,
    /// The same credential id, standard base64.
    pub credential_id_base64: String,
    /// Multisig the credential belongs to, as base58 text.
    #[serde_as(as = "DisplayFromStr")]
    pub wallet_address: Pubkey,
    /// The credential's SEC1 public key.
    pub guardian_public_key: Vec<u8>,
    /// Guardian the credential signs for.
    pub guardian_id: GuardianId,
    /// Display name, if the guardian has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_name: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds of the last assertion, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<i64>,
    /// The wallet's approval threshold when the mapping was written.
    pub threshold: u8,
    /// Onboarding status of the guardian.
    #[serde(default)]
    pub status: GuardianStatus,
    /// Unix seconds at which onboarding completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    /// Transaction that added the guardian on chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

impl CredentialMapping {
    /// Build a mapping for `credential_id` created at `now`. A guardian with
    /// a registered credential is [`GuardianStatus::Ready`].
    ///
    /// `threshold` is required; a mapping without one cannot tell the client
    /// how many approvals the wallet needs.
    pub fn new(
        credential_id: &[u8],
        wallet_address: Pubkey,
        public_key: &PublicKey,
        guardian_id: GuardianId,
        threshold: u8,
        now: i64,
    ) -> Self {
        Self {
            credential_id: hex::encode(credential_id),
            credential_id_base64: STANDARD.encode(credential_id),
            wallet_address,
            guardian_public_key: public_key.to_vec(),
            guardian_id,
            guardian_name: None,
            created_at: now,
            last_used: Some(now),
            threshold,
            status: GuardianStatus::Ready,
            completed_at: None,
            tx_signature: None,
        }
    }

    /// Move the guardian to `status`.
    ///
    /// Reaching [`GuardianStatus::Completed`] stamps `now` and, when given,
    /// the transaction that added the guardian. Moving backwards is refused.
    pub fn advance(
        &mut self,
        status: GuardianStatus,
        now: i64,
        tx_signature: Option<String>,
    ) -> Result<(), StoreError> {
        if status < self.status {
            return Err(StoreError::InvalidTransition {
                from: self.status.as_str(),
                to: status.as_str(),
            });
        }
        if status == GuardianStatus::Completed && self.status != GuardianStatus::Completed {
            self.completed_at = Some(now);
            self.tx_signature = tx_signature.or(self.tx_signature.take());
        }
        self.status = status;
        Ok(())
    }

    /// Set the guardian's display name.
    pub fn with_guardian_name(mut self, name: impl Into<String>) -> Self {
        self.guardian_name = Some(name.into());
        self
    }
}

/// Where the client keeps what the ledger does not index for it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or replace a cached proposal.
    async fn save_proposal(&self, record: &CachedProposalRecord) -> Result<(), StoreError>;

    /// Insert or replace a credential mapping.
    async fn save_credential_mapping(&self, mapping: &CredentialMapping)
    -> Result<(), StoreError>;
}

/// What happened to the cache after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// The record was written.
    Saved,
    /// The transaction did not succeed, so nothing was cached.
    Skipped,
    /// The write failed. The transaction's outcome stands regardless.
    Failed(StoreError),
}

/// Cache `record` for a transaction that has already been submitted.
///
/// Only successful transactions are cached, stamped with their signature. A
/// failed write is logged and returned; the ledger result is never undone.
pub async fn persist_after_submission(
    store: &dyn DocumentStore,
    submission: &Submission,
    mut record: CachedProposalRecord,
) -> Persistence {
    if !submission.is_success() {
        tracing::debug!(signature = %submission.signature, "Not caching unsuccessful transaction");
        return Persistence::Skipped;
    }

    record.transaction_signature = Some(submission.signature.to_string());
    match store.save_proposal(&record).await {
        Ok(()) => Persistence::Saved,
        Err(error) => {
            tracing::warn!(
                signature = %submission.signature,
                proposal_id = %record.proposal_id,
                %error,
                "Transaction landed but caching the proposal failed"
            );
            Persistence::Failed(error)
        }
    }
}
