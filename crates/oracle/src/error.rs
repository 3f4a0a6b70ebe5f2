//! Oracle error taxonomy.

use crate::config::ConfigError;
use alloy_primitives::B256;
use eralink_client::ClientError;
use eralink_types::EraId;
use thiserror::Error;

/// Errors produced by the reporting core.
///
/// Policy: local recovery only for transport (reconnect + blacklist
/// cooldown); data-shape errors abort the current stash and let the FSM
/// move on; skew guards and configuration errors terminate the process.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Fatal at startup: bad environment, key or ABI.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chain client failure; transport flavors feed recovery mode.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Relay-chain payload did not decode into the expected shape. The
    /// affected stash is skipped for the era, never retried within it.
    #[error("relay data error: {0}")]
    RelayData(String),

    /// RPC-level error talking to the parachain.
    #[error("parachain error: {0}")]
    Para(String),

    /// Report transaction mined with status 0. Not retriable this era.
    #[error("report transaction {tx_hash} reverted in era {era}")]
    TxRevert {
        /// Era the revert happened in.
        era: EraId,
        /// Hash of the reverted transaction.
        tx_hash: B256,
    },

    /// Era skew or stagnation guard fired; the daemon shuts down after
    /// the configured grace period.
    #[error("era skew fatal: {0}")]
    SkewFatal(String),
}

impl OracleError {
    /// Errors that terminate the daemon.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OracleError::SkewFatal(_) | OracleError::Config(_))
    }

    /// Map a relay-side client error: decode failures become
    /// [`OracleError::RelayData`], everything else stays a client error.
    pub(crate) fn from_relay(err: ClientError) -> Self {
        match err {
            ClientError::Decode(msg) => OracleError::RelayData(msg),
            other => OracleError::Client(other),
        }
    }

    /// Map a para-side client error: RPC and decode failures become
    /// [`OracleError::Para`], transport flavors stay client errors so the
    /// caller can tell recovery-worthy failures apart.
    pub(crate) fn from_para(err: ClientError) -> Self {
        match err {
            ClientError::Rpc(msg) | ClientError::Decode(msg) => OracleError::Para(msg),
            other => OracleError::Client(other),
        }
    }
}
