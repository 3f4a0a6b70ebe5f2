//! Parachain client: the eth JSON-RPC subset the submitter needs.

use crate::api::{ParaApi, TxReceipt};
use crate::endpoint::{ChainTag, FailureArbiter};
use crate::error::ClientError;
use crate::ws::WsSession;
use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use jsonrpsee::rpc_params;

/// Parachain RPC client.
pub struct ParaClient {
    session: WsSession,
}

impl ParaClient {
    /// Build a client over the configured parachain endpoints.
    pub fn new(urls: &[String], arbiter: &FailureArbiter) -> Self {
        Self {
            session: WsSession::new(ChainTag::Para, urls, arbiter),
        }
    }
}

fn parse_quantity_u64(raw: &str) -> Result<u64, ClientError> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|_| ClientError::Decode(format!("malformed quantity: {raw}")))
}

fn parse_quantity_u128(raw: &str) -> Result<u128, ClientError> {
    u128::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|_| ClientError::Decode(format!("malformed quantity: {raw}")))
}

fn parse_bytes(raw: &str) -> Result<Bytes, ClientError> {
    hex::decode(raw.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| ClientError::Decode(format!("malformed bytes: {e}")))
}

#[async_trait]
impl ParaApi for ParaClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        let raw: String = self.session.request("eth_chainId", rpc_params![]).await?;
        parse_quantity_u64(&raw)
    }

    async fn transaction_count(&self, addr: Address) -> Result<u64, ClientError> {
        let raw: String = self
            .session
            .request(
                "eth_getTransactionCount",
                rpc_params![addr.to_string(), "pending"],
            )
            .await?;
        parse_quantity_u64(&raw)
    }

    async fn latest_base_fee(&self) -> Result<u128, ClientError> {
        let block: serde_json::Value = self
            .session
            .request("eth_getBlockByNumber", rpc_params!["latest", false])
            .await?;
        match block.get("baseFeePerGas").and_then(|v| v.as_str()) {
            Some(raw) => parse_quantity_u128(raw),
            None => Ok(0),
        }
    }

    async fn balance(&self, addr: Address) -> Result<U256, ClientError> {
        let raw: String = self
            .session
            .request("eth_getBalance", rpc_params![addr.to_string(), "latest"])
            .await?;
        U256::from_str_radix(raw.trim_start_matches("0x"), 16)
            .map_err(|_| ClientError::Decode(format!("malformed balance: {raw}")))
    }

    async fn code_at(&self, addr: Address) -> Result<Bytes, ClientError> {
        let raw: String = self
            .session
            .request("eth_getCode", rpc_params![addr.to_string(), "latest"])
            .await?;
        parse_bytes(&raw)
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ClientError> {
        let request = serde_json::json!({
            "to": to.to_string(),
            "data": format!("0x{}", hex::encode(&data)),
        });
        let raw: String = self
            .session
            .request("eth_call", rpc_params![request, "latest"])
            .await?;
        parse_bytes(&raw)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError> {
        let hash: String = self
            .session
            .request(
                "eth_sendRawTransaction",
                rpc_params![format!("0x{}", hex::encode(&raw))],
            )
            .await?;
        hash.parse()
            .map_err(|_| ClientError::Decode(format!("malformed tx hash: {hash}")))
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ClientError> {
        self.session
            .request("eth_getTransactionReceipt", rpc_params![hash.to_string()])
            .await
    }
}
