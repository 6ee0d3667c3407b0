//! Cluster connection settings.

use moon_encoding::Pubkey;
use moon_encoding::pubkey::MOON_WALLET_PROGRAM_ID;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use std::time::Duration;

/// Environment variable overriding [`ClusterConfig::rpc_endpoint`].
pub const RPC_ENDPOINT_VAR: &str = "MOON_RPC_ENDPOINT";
/// Environment variable overriding [`ClusterConfig::program_id`].
pub const PROGRAM_ID_VAR: &str = "MOON_PROGRAM_ID";
/// Environment variable overriding [`ClusterConfig::commitment`].
pub const COMMITMENT_VAR: &str = "MOON_COMMITMENT";
/// Environment variable overriding [`ClusterConfig::confirm_timeout_ms`].
pub const CONFIRM_TIMEOUT_VAR: &str = "MOON_CONFIRM_TIMEOUT_MS";

const DEFAULT_RPC_ENDPOINT: &str = "https://rpc.lazorkit.xyz/";

/// Which ledger to talk to and how patiently.
///
/// Protocol constants (discriminators, verifier layout, sysvar ids) are not
/// configurable; only where the wallet lives and how submission behaves.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// JSON-RPC endpoint (default: `https://rpc.lazorkit.xyz/`).
    pub rpc_endpoint: String,

    /// Deployed wallet program, as base58 text.
    #[serde_as(as = "DisplayFromStr")]
    pub program_id: Pubkey,

    /// Commitment level used for reads and confirmation (default: `confirmed`).
    pub commitment: String,

    /// How long to wait for a submitted transaction to confirm (default: 60s).
    pub confirm_timeout_ms: u64,

    /// Delay between confirmation polls (default: 500ms).
    pub poll_interval_ms: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            program_id: MOON_WALLET_PROGRAM_ID,
            commitment: "confirmed".to_string(),
            confirm_timeout_ms: 60_000,
            poll_interval_ms: 500,
        }
    }
}

impl ClusterConfig {
    /// Create a configuration for the given endpoint
    pub fn new(rpc_endpoint: impl Into<String>) -> Self {
        Self {
            rpc_endpoint: rpc_endpoint.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with whichever `MOON_*` variables are set.
    ///
    /// Variables that are set but do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(RPC_ENDPOINT_VAR) {
            self.rpc_endpoint = value;
        }
        if let Some(value) = lookup(PROGRAM_ID_VAR) {
            match value.parse() {
                Ok(program_id) => self.program_id = program_id,
                Err(error) => tracing::warn!(%error, "Ignoring {PROGRAM_ID_VAR}"),
            }
        }
        if let Some(value) = lookup(COMMITMENT_VAR) {
            self.commitment = value;
        }
        if let Some(value) = lookup(CONFIRM_TIMEOUT_VAR) {
            match value.parse() {
                Ok(timeout) => self.confirm_timeout_ms = timeout,
                Err(error) => tracing::warn!(%error, "Ignoring {CONFIRM_TIMEOUT_VAR}"),
            }
        }
        self
    }

    /// Set the wallet program
    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    /// Set the commitment level
    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    /// Set the confirmation timeout
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the delay between confirmation polls
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// [`Self::confirm_timeout_ms`] as a duration.
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    /// [`Self::poll_interval_ms`] as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
