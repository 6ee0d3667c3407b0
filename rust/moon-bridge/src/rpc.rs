//! [`Ledger`] over the Solana JSON-RPC client.

use crate::LedgerError;
use crate::config::ClusterConfig;
use crate::ledger::{KeyedAccount, Ledger, MemcmpFilter, TransactionFailure, TransactionStatus};
use async_trait::async_trait;
use moon_encoding::Pubkey;
use solana_account_decoder_client_types::UiAccountEncoding;
use solana_commitment_config::CommitmentConfig;
use solana_hash::Hash;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::client_error::{Error as ClientError, ErrorKind as ClientErrorKind};
use solana_rpc_client_api::config::{
    RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig,
};
use solana_rpc_client_api::filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType};
use solana_rpc_client_api::request::RpcError;
use solana_signature::Signature;
use solana_transaction::Transaction;
use solana_transaction_error::TransactionError;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The production ledger client.
///
/// # Examples
///
/// ```no_run
/// use moon_bridge::config::ClusterConfig;
/// use moon_bridge::ledger::Ledger;
/// use moon_bridge::rpc::RpcLedger;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = RpcLedger::new(&ClusterConfig::from_env())?;
/// let blockhash = ledger.latest_blockhash().await?;
/// println!("building on {blockhash}");
/// # Ok(())
/// # }
/// ```
pub struct RpcLedger {
    endpoint: Url,
    commitment: CommitmentConfig,
    client: RpcClient,
}

impl std::fmt::Debug for RpcLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcLedger")
            .field("endpoint", &self.endpoint.as_str())
            .field("commitment", &self.commitment.commitment)
            .finish_non_exhaustive()
    }
}

impl RpcLedger {
    /// Connect to `config.rpc_endpoint` at `config.commitment`.
    pub fn new(config: &ClusterConfig) -> Result<Self, LedgerError> {
        let endpoint =
            Url::parse(&config.rpc_endpoint).map_err(|error| LedgerError::Transport {
                method: "connect",
                reason: format!("invalid endpoint {:?}: {error}", config.rpc_endpoint),
            })?;
        let commitment =
            CommitmentConfig::from_str(&config.commitment).map_err(|error| {
                LedgerError::Transport {
                    method: "connect",
                    reason: format!("invalid commitment {:?}: {error}", config.commitment),
                }
            })?;
        let client = RpcClient::new_with_timeout_and_commitment(
            endpoint.to_string(),
            REQUEST_TIMEOUT,
            commitment,
        );

        Ok(Self {
            endpoint,
            commitment,
            client,
        })
    }

    /// The endpoint requests go to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Sort a client failure into the ledger's error kinds.
///
/// A transaction error carried by the failure (a rejected preflight
/// simulation) wins over how it was transported.
fn ledger_error(method: &'static str, error: ClientError) -> LedgerError {
    if let Some(failure) = error.get_transaction_error() {
        return LedgerError::Preflight(failure.into());
    }
    match error.kind {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
            LedgerError::Rpc {
                method,
                code,
                message,
            }
        }
        ClientErrorKind::Io(error) => LedgerError::Transport {
            method,
            reason: error.to_string(),
        },
        ClientErrorKind::Reqwest(error) => LedgerError::Transport {
            method,
            reason: format!("HTTP request failed: {error}"),
        },
        other => LedgerError::InvalidResponse {
            method,
            reason: other.to_string(),
        },
    }
}

fn status_of(err: Option<TransactionError>, reached_commitment: bool) -> TransactionStatus {
    match err {
        Some(err) => TransactionStatus::Failed(TransactionFailure::from(err)),
        None if reached_commitment => TransactionStatus::Succeeded,
        None => TransactionStatus::Pending,
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|error| ledger_error("getAccountInfo", error))?;
        Ok(response.value.map(|account| account.data))
    }

    async fn program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<KeyedAccount>, LedgerError> {
        let filters = filters
            .iter()
            .map(|filter| {
                RpcFilterType::Memcmp(Memcmp::new(
                    filter.offset,
                    MemcmpEncodedBytes::Bytes(filter.bytes.clone()),
                ))
            })
            .collect();

        let accounts = self
            .client
            .get_program_accounts_with_config(
                program_id,
                RpcProgramAccountsConfig {
                    filters: Some(filters),
                    account_config: RpcAccountInfoConfig {
                        encoding: Some(UiAccountEncoding::Base64),
                        commitment: Some(self.commitment),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            )
            .await
            .map_err(|error| ledger_error("getProgramAccounts", error))?;

        Ok(accounts
            .into_iter()
            .map(|(address, account)| KeyedAccount {
                address,
                data: account.data,
            })
            .collect())
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|error| ledger_error("getLatestBlockhash", error))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        tracing::debug!(
            signatures = transaction.signatures.len(),
            instructions = transaction.message.instructions.len(),
            "Sending transaction"
        );
        self.client
            .send_transaction_with_config(
                transaction,
                RpcSendTransactionConfig {
                    skip_preflight: false,
                    preflight_commitment: Some(self.commitment.commitment),
                    ..Default::default()
                },
            )
            .await
            .map_err(|error| ledger_error("sendTransaction", error))
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<TransactionStatus, LedgerError> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|error| ledger_error("getSignatureStatuses", error))?;

        Ok(match response.value.into_iter().next().flatten() {
            Some(status) => {
                let reached = status.satisfies_commitment(self.commitment);
                status_of(status.err, reached)
            }
            None => TransactionStatus::Pending,
        })
    }
}
