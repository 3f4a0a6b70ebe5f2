//! Typed chain-access seams.
//!
//! The oracle core codes against these traits; the production
//! implementations live in [`crate::relay`], [`crate::para`] and
//! [`crate::contract`], and tests substitute mocks.

use crate::error::ClientError;
use crate::relay::types::{ActiveEraInfo, SlashingSpans, StakingLedger};
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use eralink_types::{AccountId32, BlockHash, EraAnchor, EraId};
use serde::Deserialize;

/// Minimal transaction receipt as returned by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: B256,
    /// Post-EIP-658 status field, `0x1` on success.
    pub status: Option<String>,
    /// Block the transaction was mined in.
    pub block_number: Option<String>,
    /// Gas consumed by the transaction.
    pub gas_used: Option<String>,
}

impl TxReceipt {
    /// True when the transaction was mined with status 1.
    pub fn succeeded(&self) -> bool {
        self.status
            .as_deref()
            .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            == Some(1)
    }
}

/// Typed read access to the relay chain at era boundaries.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Hash of the block at the given height, if the chain has one.
    async fn block_hash_at(&self, height: u64) -> Result<Option<BlockHash>, ClientError>;

    /// Hash of the latest finalized block. Doubles as the recovery probe.
    async fn finalized_head(&self) -> Result<BlockHash, ClientError>;

    /// Currently active staking era.
    async fn active_era(&self) -> Result<ActiveEraInfo, ClientError>;

    /// Controller bonded to the stash, if any, at the snapshot block.
    async fn bonded(
        &self,
        stash: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<AccountId32>, ClientError>;

    /// Staking ledger of the controller at the snapshot block.
    async fn ledger(
        &self,
        controller: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<StakingLedger>, ClientError>;

    /// Free balance of the account at the snapshot block.
    async fn free_balance(
        &self,
        who: &AccountId32,
        at: &BlockHash,
    ) -> Result<u128, ClientError>;

    /// Slashing spans recorded for the stash at the snapshot block.
    async fn slashing_spans(
        &self,
        stash: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<SlashingSpans>, ClientError>;

    /// Whether the stash has nominations at the snapshot block.
    async fn nominates(&self, stash: &AccountId32, at: &BlockHash) -> Result<bool, ClientError>;

    /// Whether the stash has validator preferences at the snapshot block.
    async fn validates(&self, stash: &AccountId32, at: &BlockHash) -> Result<bool, ClientError>;

    /// Drop the connection; the next call redials.
    async fn force_reconnect(&self);

    /// URL the client is currently connected to.
    async fn connected_url(&self) -> String;
}

/// eth JSON-RPC subset the submitter needs on the parachain.
#[async_trait]
pub trait ParaApi: Send + Sync {
    /// EVM chain id, for transaction signing.
    async fn chain_id(&self) -> Result<u64, ClientError>;

    /// Pending-state nonce of the account.
    async fn transaction_count(&self, addr: Address) -> Result<u64, ClientError>;

    /// Base fee of the latest block; zero on pre-1559 chains.
    async fn latest_base_fee(&self) -> Result<u128, ClientError>;

    /// Balance of the account in wei.
    async fn balance(&self, addr: Address) -> Result<U256, ClientError>;

    /// Deployed code at the address; empty for EOAs.
    async fn code_at(&self, addr: Address) -> Result<Bytes, ClientError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError>;

    /// Broadcast a signed raw transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError>;

    /// Receipt of a transaction, once mined.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ClientError>;
}

/// OracleMaster contract reads.
#[async_trait]
pub trait OracleApi: Send + Sync {
    /// Era the contract is currently accepting reports for.
    async fn current_era_id(&self) -> Result<EraId, ClientError>;

    /// Era the contract has last committed (quorum reached).
    async fn committed_era_id(&self) -> Result<EraId, ClientError>;

    /// Anchor triple pinning wall time to era indices.
    async fn anchor(&self) -> Result<EraAnchor, ClientError>;

    /// Authoritative stash set, in contract order.
    async fn stash_accounts(&self) -> Result<Vec<AccountId32>, ClientError>;

    /// Whether `member` already reported `stash`, and for which era.
    async fn is_reported_last_era(
        &self,
        member: Address,
        stash: &AccountId32,
    ) -> Result<(EraId, bool), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_status_parsing() {
        let make = |status: Option<&str>| TxReceipt {
            transaction_hash: B256::ZERO,
            status: status.map(str::to_string),
            block_number: None,
            gas_used: None,
        };
        assert!(make(Some("0x1")).succeeded());
        assert!(make(Some("0x01")).succeeded());
        assert!(!make(Some("0x0")).succeeded());
        assert!(!make(None).succeeded());
    }
}
