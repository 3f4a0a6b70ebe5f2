//! Relay-chain client: typed staking queries over the WebSocket session.

pub mod keys;
pub mod types;

use crate::api::RelayApi;
use crate::endpoint::{ChainTag, FailureArbiter};
use crate::error::ClientError;
use crate::ws::WsSession;
use async_trait::async_trait;
use eralink_types::{AccountId32, BlockHash};
use jsonrpsee::rpc_params;
use parity_scale_codec::Decode;
use self::types::{ActiveEraInfo, SlashingSpans, StakingLedger};

/// Relay-chain RPC client.
///
/// All staking reads for one era are pinned to the era-boundary block
/// hash, so a report is always a consistent snapshot.
pub struct RelayClient {
    session: WsSession,
}

impl RelayClient {
    /// Build a client over the configured relay endpoints.
    pub fn new(urls: &[String], arbiter: &FailureArbiter) -> Self {
        Self {
            session: WsSession::new(ChainTag::Relay, urls, arbiter),
        }
    }

    /// Raw storage read at an optional block hash.
    async fn storage(
        &self,
        key: Vec<u8>,
        at: Option<&BlockHash>,
    ) -> Result<Option<Vec<u8>>, ClientError> {
        let key_hex = format!("0x{}", hex::encode(key));
        let raw: Option<String> = match at {
            Some(hash) => {
                self.session
                    .request("state_getStorage", rpc_params![key_hex, hash.to_string()])
                    .await?
            }
            None => {
                self.session
                    .request("state_getStorage", rpc_params![key_hex])
                    .await?
            }
        };
        raw.map(|value| {
            hex::decode(value.trim_start_matches("0x"))
                .map_err(|e| ClientError::Decode(format!("storage value is not hex: {e}")))
        })
        .transpose()
    }

    /// Storage read decoded into a SCALE type; `None` when absent.
    async fn storage_decoded<T: Decode>(
        &self,
        key: Vec<u8>,
        at: Option<&BlockHash>,
    ) -> Result<Option<T>, ClientError> {
        match self.storage(key, at).await? {
            Some(bytes) => T::decode(&mut bytes.as_slice())
                .map(Some)
                .map_err(|e| ClientError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    /// Whether a storage entry exists at the given block.
    async fn storage_exists(
        &self,
        key: Vec<u8>,
        at: &BlockHash,
    ) -> Result<bool, ClientError> {
        Ok(self.storage(key, Some(at)).await?.is_some())
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn block_hash_at(&self, height: u64) -> Result<Option<BlockHash>, ClientError> {
        let hash: Option<String> = self
            .session
            .request("chain_getBlockHash", rpc_params![height])
            .await?;
        hash.map(|h| {
            h.parse()
                .map_err(|_| ClientError::Decode(format!("malformed block hash: {h}")))
        })
        .transpose()
    }

    async fn finalized_head(&self) -> Result<BlockHash, ClientError> {
        let hash: String = self
            .session
            .request("chain_getFinalizedHead", rpc_params![])
            .await?;
        hash.parse()
            .map_err(|_| ClientError::Decode(format!("malformed block hash: {hash}")))
    }

    async fn active_era(&self) -> Result<ActiveEraInfo, ClientError> {
        self.storage_decoded(keys::active_era(), None)
            .await?
            .ok_or_else(|| ClientError::Decode("Staking.ActiveEra is empty".into()))
    }

    async fn bonded(
        &self,
        stash: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<AccountId32>, ClientError> {
        self.storage_decoded(keys::bonded(stash), Some(at)).await
    }

    async fn ledger(
        &self,
        controller: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<StakingLedger>, ClientError> {
        self.storage_decoded(keys::ledger(controller), Some(at))
            .await
    }

    async fn free_balance(
        &self,
        who: &AccountId32,
        at: &BlockHash,
    ) -> Result<u128, ClientError> {
        let info: Option<types::AccountInfo> = self
            .storage_decoded(keys::system_account(who), Some(at))
            .await?;
        Ok(info.map(|i| i.data.free).unwrap_or(0))
    }

    async fn slashing_spans(
        &self,
        stash: &AccountId32,
        at: &BlockHash,
    ) -> Result<Option<SlashingSpans>, ClientError> {
        self.storage_decoded(keys::slashing_spans(stash), Some(at))
            .await
    }

    async fn nominates(&self, stash: &AccountId32, at: &BlockHash) -> Result<bool, ClientError> {
        self.storage_exists(keys::nominators(stash), at).await
    }

    async fn validates(&self, stash: &AccountId32, at: &BlockHash) -> Result<bool, ClientError> {
        self.storage_exists(keys::validators(stash), at).await
    }

    async fn force_reconnect(&self) {
        self.session.force_reconnect().await;
    }

    async fn connected_url(&self) -> String {
        self.session.current_url().await
    }
}
