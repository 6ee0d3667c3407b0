//! The ledger capability and transaction confirmation.

use crate::LedgerError;
use crate::config::ClusterConfig;
use crate::transaction::transaction_id;
use async_trait::async_trait;
use moon_encoding::Pubkey;
use solana_hash::Hash;
use solana_instruction::error::InstructionError;
use solana_signature::Signature;
use solana_transaction::Transaction;
use solana_transaction_error::TransactionError;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Matches accounts whose data holds `bytes` at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    /// Byte offset into the account data.
    pub offset: usize,
    /// Bytes that must appear there.
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    /// Match `bytes` at `offset`.
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Whether `data` passes this filter. An end past `usize::MAX` never
    /// matches.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.offset
            .checked_add(self.bytes.len())
            .and_then(|end| data.get(self.offset..end))
            == Some(self.bytes.as_slice())
    }
}

/// An account together with its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedAccount {
    /// The account's address.
    pub address: Pubkey,
    /// Raw account data.
    pub data: Vec<u8>,
}

/// Why a landed transaction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionFailure {
    /// A program returned a custom error code.
    Program {
        /// Position of the failing instruction in the transaction.
        instruction_index: u8,
        /// The program's own error code, unmodified.
        code: u32,
    },
    /// Any other failure, as the ledger reported it.
    Other(String),
}

impl From<TransactionError> for TransactionFailure {
    /// `InstructionError(index, Custom(code))` becomes
    /// [`TransactionFailure::Program`]; anything else keeps the ledger's
    /// description.
    fn from(error: TransactionError) -> Self {
        match error {
            TransactionError::InstructionError(instruction_index, InstructionError::Custom(code)) => {
                TransactionFailure::Program {
                    instruction_index,
                    code,
                }
            }
            other => TransactionFailure::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TransactionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionFailure::Program {
                instruction_index,
                code,
            } => write!(f, "instruction {instruction_index} returned custom error {code}"),
            TransactionFailure::Other(reason) => f.write_str(reason),
        }
    }
}

/// Where a submitted transaction stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Unknown to the ledger or not yet at the requested commitment.
    Pending,
    /// Landed and succeeded.
    Succeeded,
    /// Landed and failed.
    Failed(TransactionFailure),
}

/// Read and write access to the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Data of the account at `address`, if it exists.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Every account owned by `program_id` that passes all of `filters`.
    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<KeyedAccount>, LedgerError>;

    /// A block hash recent enough to build a transaction on.
    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Hand a signed transaction to the ledger.
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;

    /// Current status of a submitted transaction.
    async fn signature_status(&self, signature: &Signature)
    -> Result<TransactionStatus, LedgerError>;
}

/// The outcome of waiting for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The transaction landed and succeeded.
    Success,
    /// A program in the transaction returned a custom error.
    ///
    /// Index 0 is usually the secp256r1 verifier and index 1 the wallet
    /// program; the code is whatever that program returned.
    ProgramError {
        /// Position of the failing instruction.
        instruction_index: u8,
        /// The program's error code.
        code: u32,
    },
    /// The transaction failed for another reason.
    Failed(String),
    /// The transaction was not confirmed in time. It may still land.
    Timeout,
}

impl From<TransactionFailure> for Confirmation {
    fn from(failure: TransactionFailure) -> Self {
        match failure {
            TransactionFailure::Program {
                instruction_index,
                code,
            } => Confirmation::ProgramError {
                instruction_index,
                code,
            },
            TransactionFailure::Other(reason) => Confirmation::Failed(reason),
        }
    }
}

/// A submitted transaction and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The transaction's identifying signature.
    pub signature: Signature,
    /// How it ended.
    pub confirmation: Confirmation,
}

impl Submission {
    /// Whether the transaction landed and succeeded.
    pub fn is_success(&self) -> bool {
        self.confirmation == Confirmation::Success
    }
}

/// How long and how often to poll for confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmPolicy {
    /// Give up after this long.
    pub timeout: Duration,
    /// Wait this long between polls.
    pub poll_interval: Duration,
}

impl From<&ClusterConfig> for ConfirmPolicy {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

/// Send `transaction` and poll until it lands or `policy.timeout` passes.
///
/// Ledger errors while sending are returned as errors, except a preflight
/// rejection, which is reported like a failure that landed. Once sent, the
/// outcome is always a [`Submission`]: a failed status poll is logged and
/// retried until the timeout.
pub async fn submit_and_confirm(
    ledger: &dyn Ledger,
    transaction: &Transaction,
    policy: ConfirmPolicy,
) -> Result<Submission, LedgerError> {
    let signature = match (
        ledger.send_transaction(transaction).await,
        transaction_id(transaction),
    ) {
        (Ok(signature), _) => signature,
        (Err(LedgerError::Preflight(failure)), Some(signature)) => {
            return Ok(settle(signature, failure.into(), policy));
        }
        (Err(error), _) => return Err(error),
    };
    tracing::debug!(%signature, "Transaction sent");

    let deadline = Instant::now() + policy.timeout;
    let confirmation = loop {
        match ledger.signature_status(&signature).await {
            Ok(TransactionStatus::Succeeded) => break Confirmation::Success,
            Ok(TransactionStatus::Failed(failure)) => break Confirmation::from(failure),
            Ok(TransactionStatus::Pending) => {}
            Err(error) => tracing::warn!(%signature, %error, "Status poll failed"),
        }
        if Instant::now() >= deadline {
            break Confirmation::Timeout;
        }
        tokio::time::sleep(policy.poll_interval).await;
    };

    Ok(settle(signature, confirmation, policy))
}

fn settle(
    signature: Signature,
    confirmation: Confirmation,
    policy: ConfirmPolicy,
) -> Submission {
    match &confirmation {
        Confirmation::Success => tracing::debug!(%signature, "Transaction confirmed"),
        Confirmation::ProgramError {
            instruction_index,
            code,
        } => tracing::warn!(%signature, instruction_index, code, "Program rejected transaction"),
        Confirmation::Failed(reason) => {
            tracing::warn!(%signature, reason = %reason, "Transaction failed")
        }
        Confirmation::Timeout => {
            tracing::warn!(%signature, timeout = ?policy.timeout, "Confirmation timed out")
        }
    }

    Submission {
        signature,
        confirmation,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use solana_message::Message;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    /// An in-memory ledger that replays scripted statuses.
    #[derive(Default)]
    pub(crate) struct ScriptedLedger {
        pub(crate) accounts: BTreeMap<Pubkey, Vec<u8>>,
        pub(crate) statuses: Mutex<VecDeque<Result<TransactionStatus, LedgerError>>>,
        pub(crate) sent: Mutex<Vec<Transaction>>,
    }

    impl ScriptedLedger {
        pub(crate) fn with_statuses(
            statuses: impl IntoIterator<Item = Result<TransactionStatus, LedgerError>>,
        ) -> Self {
            Self {
                statuses: Mutex::new(statuses.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Ledger for ScriptedLedger {
        async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
            Ok(self.accounts.get(address).cloned())
        }

        async fn program_accounts(
            &self,
            _program_id: &Pubkey,
            filters: &[MemcmpFilter],
        ) -> Result<Vec<KeyedAccount>, LedgerError> {
            Ok(self
                .accounts
                .iter()
                .filter(|(_, data)| filters.iter().all(|filter| filter.matches(data)))
                .map(|(address, data)| KeyedAccount {
                    address: *address,
                    data: data.clone(),
                })
                .collect())
        }

        async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
            Ok(Hash::new_from_array([0x42; 32]))
        }

        async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
            self.sent.lock().unwrap().push(transaction.clone());
            Ok(transaction_id(transaction).unwrap_or_default())
        }

        async fn signature_status(
            &self,
            _signature: &Signature,
        ) -> Result<TransactionStatus, LedgerError> {
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(TransactionStatus::Pending))
        }
    }

    fn policy() -> ConfirmPolicy {
        ConfirmPolicy {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
        }
    }

    fn signature() -> Signature {
        Signature::from([7; 64])
    }

    fn transaction() -> Transaction {
        Transaction {
            signatures: vec![signature()],
            message: Message::new(&[], Some(&Pubkey::new_from_array([1; 32]))),
        }
    }

    #[test]
    fn it_reads_custom_program_errors() {
        assert_eq!(
            TransactionFailure::from(TransactionError::InstructionError(
                1,
                InstructionError::Custom(6002)
            )),
            TransactionFailure::Program {
                instruction_index: 1,
                code: 6002
            }
        );
        assert!(matches!(
            TransactionFailure::from(TransactionError::InstructionError(
                0,
                InstructionError::InvalidArgument
            )),
            TransactionFailure::Other(_)
        ));
        assert_eq!(
            TransactionFailure::from(TransactionError::BlockhashNotFound),
            TransactionFailure::Other(TransactionError::BlockhashNotFound.to_string())
        );
    }

    #[test]
    fn memcmp_filters_never_read_past_the_data() {
        let filter = MemcmpFilter::new(8, [1, 2]);
        assert!(filter.matches(&[0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3]));
        assert!(!filter.matches(&[0, 0, 0, 0, 0, 0, 0, 0, 1]));
        assert!(!filter.matches(&[]));
    }

    #[test]
    fn memcmp_filters_with_an_overflowing_end_never_match() {
        let filter = MemcmpFilter::new(usize::MAX, [1]);
        assert!(!filter.matches(&[1, 1, 1]));
        assert!(!MemcmpFilter::new(usize::MAX - 1, [1, 2, 3]).matches(&[]));
    }

    #[tokio::test]
    async fn it_waits_until_the_transaction_lands() -> anyhow::Result<()> {
        let ledger = ScriptedLedger::with_statuses([
            Ok(TransactionStatus::Pending),
            Err(LedgerError::Transport {
                method: "getSignatureStatuses",
                reason: "reset".into(),
            }),
            Ok(TransactionStatus::Succeeded),
        ]);

        let submission = submit_and_confirm(&ledger, &transaction(), policy()).await?;
        assert!(submission.is_success());
        assert_eq!(submission.signature, signature());
        assert_eq!(ledger.sent.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn it_passes_program_error_codes_through() -> anyhow::Result<()> {
        let ledger = ScriptedLedger::with_statuses([Ok(TransactionStatus::Failed(
            TransactionFailure::Program {
                instruction_index: 1,
                code: 6005,
            },
        ))]);

        let submission = submit_and_confirm(&ledger, &transaction(), policy()).await?;
        assert_eq!(
            submission.confirmation,
            Confirmation::ProgramError {
                instruction_index: 1,
                code: 6005
            }
        );
        Ok(())
    }

    struct PreflightRejection;

    #[async_trait]
    impl Ledger for PreflightRejection {
        async fn account_data(&self, _: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
            Ok(None)
        }

        async fn program_accounts(
            &self,
            _: &Pubkey,
            _: &[MemcmpFilter],
        ) -> Result<Vec<KeyedAccount>, LedgerError> {
            Ok(Vec::new())
        }

        async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
            Ok(Hash::default())
        }

        async fn send_transaction(&self, _: &Transaction) -> Result<Signature, LedgerError> {
            Err(LedgerError::Preflight(TransactionFailure::Program {
                instruction_index: 0,
                code: 2,
            }))
        }

        async fn signature_status(
            &self,
            _: &Signature,
        ) -> Result<TransactionStatus, LedgerError> {
            unreachable!("a rejected transaction is never polled")
        }
    }

    #[tokio::test]
    async fn preflight_rejections_are_reported_as_outcomes() -> anyhow::Result<()> {
        let submission = submit_and_confirm(&PreflightRejection, &transaction(), policy()).await?;
        assert_eq!(submission.signature, signature());
        assert_eq!(
            submission.confirmation,
            Confirmation::ProgramError {
                instruction_index: 0,
                code: 2
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_times_out_when_nothing_lands() -> anyhow::Result<()> {
        let ledger = ScriptedLedger::default();
        let submission = submit_and_confirm(&ledger, &transaction(), policy()).await?;
        assert_eq!(submission.confirmation, Confirmation::Timeout);
        Ok(())
    }
}
