//! Shared mock chains for reporter and submitter tests.

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use eralink_client::relay::types::{ActiveEraInfo, SlashingSpans, StakingLedger};
use eralink_client::{ClientError, OracleApi, ParaApi, RelayApi, TxReceipt};
use eralink_oracle::{OracleConfig, Reporter, Submitter};
use eralink_types::{AccountId32, BlockHash, EraAnchor, EraId, ReporterStatus};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Well-known test key, do not use in production.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn stash(byte: u8) -> AccountId32 {
    AccountId32::from_bytes([byte; 32])
}

fn hash_for_height(height: u64) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_le_bytes());
    BlockHash::from_bytes(bytes)
}

#[derive(Default)]
pub struct MockRelay {
    pub active_era: Mutex<u32>,
    pub missing_boundary: Mutex<bool>,
    pub bonded: Mutex<HashMap<AccountId32, AccountId32>>,
    pub ledgers: Mutex<HashMap<AccountId32, StakingLedger>>,
    pub balances: Mutex<HashMap<AccountId32, u128>>,
    pub nominators: Mutex<HashSet<AccountId32>>,
    pub validators: Mutex<HashSet<AccountId32>>,
    pub reconnects: AtomicU32,
}

impl MockRelay {
    pub fn with_era(era: u32) -> Arc<Self> {
        let relay = Self::default();
        *relay.active_era.lock() = era;
        Arc::new(relay)
    }
}

#[async_trait]
impl RelayApi for MockRelay {
    async fn block_hash_at(&self, height: u64) -> Result<Option<BlockHash>, ClientError> {
        if *self.missing_boundary.lock() {
            return Ok(None);
        }
        Ok(Some(hash_for_height(height)))
    }

    async fn finalized_head(&self) -> Result<BlockHash, ClientError> {
        Ok(hash_for_height(0))
    }

    async fn active_era(&self) -> Result<ActiveEraInfo, ClientError> {
        Ok(ActiveEraInfo {
            index: *self.active_era.lock(),
            start: Some(0),
        })
    }

    async fn bonded(
        &self,
        stash: &AccountId32,
        _at: &BlockHash,
    ) -> Result<Option<AccountId32>, ClientError> {
        Ok(self.bonded.lock().get(stash).copied())
    }

    async fn ledger(
        &self,
        controller: &AccountId32,
        _at: &BlockHash,
    ) -> Result<Option<StakingLedger>, ClientError> {
        Ok(self.ledgers.lock().get(controller).cloned())
    }

    async fn free_balance(
        &self,
        who: &AccountId32,
        _at: &BlockHash,
    ) -> Result<u128, ClientError> {
        Ok(self.balances.lock().get(who).copied().unwrap_or(0))
    }

    async fn slashing_spans(
        &self,
        _stash: &AccountId32,
        _at: &BlockHash,
    ) -> Result<Option<SlashingSpans>, ClientError> {
        Ok(None)
    }

    async fn nominates(&self, stash: &AccountId32, _at: &BlockHash) -> Result<bool, ClientError> {
        Ok(self.nominators.lock().contains(stash))
    }

    async fn validates(&self, stash: &AccountId32, _at: &BlockHash) -> Result<bool, ClientError> {
        Ok(self.validators.lock().contains(stash))
    }

    async fn force_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn connected_url(&self) -> String {
        "ws://mock-relay:9944".into()
    }
}

pub struct MockPara {
    pub chain_id: u64,
    pub remote_nonce: Mutex<u64>,
    pub base_fee: u128,
    /// Raw transactions accepted by `eth_sendRawTransaction`, in order.
    pub sent: Mutex<Vec<Bytes>>,
    /// Receipt status (true = success) per submission index; missing
    /// entries default to success.
    pub receipt_script: Mutex<Vec<bool>>,
    receipts: Mutex<HashMap<B256, bool>>,
}

impl Default for MockPara {
    fn default() -> Self {
        Self {
            chain_id: 336,
            remote_nonce: Mutex::new(0),
            base_fee: 1_000_000_000,
            sent: Mutex::new(Vec::new()),
            receipt_script: Mutex::new(Vec::new()),
            receipts: Mutex::new(HashMap::new()),
        }
    }
}

impl MockPara {
    pub fn with_receipt_script(script: Vec<bool>) -> Arc<Self> {
        let para = Self::default();
        *para.receipt_script.lock() = script;
        Arc::new(para)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl ParaApi for MockPara {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, _addr: Address) -> Result<u64, ClientError> {
        Ok(*self.remote_nonce.lock())
    }

    async fn latest_base_fee(&self) -> Result<u128, ClientError> {
        Ok(self.base_fee)
    }

    async fn balance(&self, _addr: Address) -> Result<U256, ClientError> {
        Ok(U256::from(1_000_000_000_000_000_000u128))
    }

    async fn code_at(&self, _addr: Address) -> Result<Bytes, ClientError> {
        Ok(Bytes::from(vec![0x60, 0x80]))
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ClientError> {
        Err(ClientError::Rpc("eth_call not scripted".into()))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ClientError> {
        let mut sent = self.sent.lock();
        let index = sent.len();
        let status = self.receipt_script.lock().get(index).copied().unwrap_or(true);
        let mut hash_bytes = [0u8; 32];
        hash_bytes[..8].copy_from_slice(&(index as u64).to_le_bytes());
        let hash = B256::from(hash_bytes);
        sent.push(raw);
        self.receipts.lock().insert(hash, status);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ClientError> {
        Ok(self.receipts.lock().get(&hash).map(|ok| TxReceipt {
            transaction_hash: hash,
            status: Some(if *ok { "0x1" } else { "0x0" }.to_string()),
            block_number: Some("0x10".into()),
            gas_used: Some("0x5208".into()),
        }))
    }
}

pub struct MockOracle {
    pub current_era: Mutex<EraId>,
    pub committed_era: Mutex<EraId>,
    pub anchor: EraAnchor,
    pub stashes: Mutex<Vec<AccountId32>>,
    pub reported: Mutex<HashMap<(Address, AccountId32), (EraId, bool)>>,
}

impl MockOracle {
    pub fn for_era(era: EraId) -> Arc<Self> {
        Arc::new(Self {
            current_era: Mutex::new(era),
            committed_era: Mutex::new(era),
            anchor: EraAnchor {
                anchor_era_id: 0,
                anchor_timestamp: 0,
                seconds_per_era: 180,
            },
            stashes: Mutex::new(Vec::new()),
            reported: Mutex::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl OracleApi for MockOracle {
    async fn current_era_id(&self) -> Result<EraId, ClientError> {
        Ok(*self.current_era.lock())
    }

    async fn committed_era_id(&self) -> Result<EraId, ClientError> {
        Ok(*self.committed_era.lock())
    }

    async fn anchor(&self) -> Result<EraAnchor, ClientError> {
        Ok(self.anchor)
    }

    async fn stash_accounts(&self) -> Result<Vec<AccountId32>, ClientError> {
        Ok(self.stashes.lock().clone())
    }

    async fn is_reported_last_era(
        &self,
        member: Address,
        stash: &AccountId32,
    ) -> Result<(EraId, bool), ClientError> {
        Ok(self
            .reported
            .lock()
            .get(&(member, *stash))
            .copied()
            .unwrap_or((0, false)))
    }
}

pub fn test_config(debug_mode: bool) -> OracleConfig {
    OracleConfig {
        ws_urls_relay: vec!["ws://mock-relay:9944".into()],
        ws_urls_para: vec!["ws://mock-para:9933".into()],
        contract_address: Address::repeat_byte(0xaa),
        signer: TEST_PRIVATE_KEY.parse().expect("test key"),
        abi_path: PathBuf::from("assets/oracle.json"),
        gas_limit: 10_000_000,
        max_priority_fee_per_gas: 0,
        frequency_of_requests: Duration::from_secs(180),
        max_failure_requests: 10,
        blacklist_timeout: Duration::from_secs(60),
        era_duration_seconds: 180,
        era_duration_blocks: 30,
        initial_block_number: 1,
        ss58_format: 2,
        type_registry_preset: "kusama".into(),
        para_id: 999,
        health_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
        log_level: "INFO".into(),
        debug_mode,
        watchdog_delay: 5,
        era_update_delay: Duration::from_secs(360),
        era_delay_time: Duration::from_secs(600),
        shutdown_grace: Duration::from_secs(0),
    }
}

pub fn make_submitter(
    para: Arc<MockPara>,
    oracle: Arc<MockOracle>,
    debug_mode: bool,
) -> Submitter {
    let config = test_config(debug_mode);
    let mut submitter = Submitter::new(
        para,
        oracle,
        config.contract_address,
        config.signer,
        config.gas_limit,
        config.max_priority_fee_per_gas,
        debug_mode,
    );
    submitter.set_chain_id(336);
    submitter
}

#[allow(clippy::type_complexity)]
pub fn make_reporter(
    relay: Arc<MockRelay>,
    para: Arc<MockPara>,
    oracle: Arc<MockOracle>,
    debug_mode: bool,
) -> (Reporter, watch::Receiver<ReporterStatus>) {
    let config = test_config(debug_mode);
    let submitter = make_submitter(para.clone(), oracle.clone(), debug_mode);
    let arbiter = Arc::new(eralink_client::FailureArbiter::new(
        config.max_failure_requests,
        config.blacklist_timeout,
    ));
    let (status_tx, status_rx) = watch::channel(ReporterStatus::NotWorking);
    let reporter = Reporter::new(
        &config,
        relay,
        para,
        oracle,
        submitter,
        arbiter,
        status_tx,
    );
    (reporter, status_rx)
}
