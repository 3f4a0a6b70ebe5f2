//! Report transaction submission.
//!
//! Composes, signs and broadcasts `reportRelay` transactions, one at a
//! time. Nonces are strictly increasing within a process lifetime, and
//! the `isReportedLastEra` pre-check keeps submission at-most-once per
//! (era, stash) even across restarts.

use crate::error::OracleError;
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use eralink_client::contract::report_relay_calldata;
use eralink_client::{OracleApi, ParaApi};
use eralink_metrics::oracle as metrics;
use eralink_types::{EraId, ReportTuple};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// How often the receipt of an in-flight transaction is polled.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How long to wait for a receipt before giving up on the transaction.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of one successful submission attempt. A mined-but-reverted
/// transaction surfaces as [`OracleError::TxRevert`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Transaction mined with status 1.
    Submitted {
        /// Hash of the mined transaction.
        tx_hash: B256,
    },
    /// The contract already holds this member's report for the era.
    AlreadyReported,
    /// Debug mode: the report was built and logged, nothing signed.
    DryRun,
}

/// Signs and broadcasts report transactions to the parachain.
pub struct Submitter {
    para: Arc<dyn ParaApi>,
    oracle: Arc<dyn OracleApi>,
    contract_address: Address,
    signer: PrivateKeySigner,
    chain_id: u64,
    gas_limit: u64,
    max_priority_fee_per_gas: u128,
    last_nonce: Option<u64>,
    debug_mode: bool,
}

impl Submitter {
    /// Create a submitter. The chain id is learned from the parachain at
    /// startup via [`Self::set_chain_id`].
    pub fn new(
        para: Arc<dyn ParaApi>,
        oracle: Arc<dyn OracleApi>,
        contract_address: Address,
        signer: PrivateKeySigner,
        gas_limit: u64,
        max_priority_fee_per_gas: u128,
        debug_mode: bool,
    ) -> Self {
        Self {
            para,
            oracle,
            contract_address,
            signer,
            chain_id: 0,
            gas_limit,
            max_priority_fee_per_gas,
            last_nonce: None,
            debug_mode,
        }
    }

    /// The oracle's parachain address, derived from the signing key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The OracleMaster address reports are sent to.
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// Pin the EVM chain id used for signing.
    pub fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
    }

    /// Submit the report for `(era, stash)`, idempotently.
    pub async fn submit(
        &mut self,
        era: EraId,
        report: &ReportTuple,
    ) -> Result<SubmitOutcome, OracleError> {
        let (last_era, is_reported) = self
            .oracle
            .is_reported_last_era(self.address(), &report.stash)
            .await
            .map_err(OracleError::from_para)?;
        if is_reported && last_era == era {
            info!(era, stash = %report.stash, "already reported, skipping");
            return Ok(SubmitOutcome::AlreadyReported);
        }

        if self.debug_mode {
            info!(era, stash = %report.stash, ?report, "debug mode: report built, not submitted");
            return Ok(SubmitOutcome::DryRun);
        }

        let remote_nonce = self
            .para
            .transaction_count(self.address())
            .await
            .map_err(OracleError::from_para)?;
        let nonce = match self.last_nonce {
            Some(last) => remote_nonce.max(last + 1),
            None => remote_nonce,
        };

        let base_fee = self
            .para
            .latest_base_fee()
            .await
            .map_err(OracleError::from_para)?;
        let max_fee_per_gas = base_fee
            .saturating_mul(2)
            .saturating_add(self.max_priority_fee_per_gas);

        let tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: TxKind::Call(self.contract_address),
            value: U256::ZERO,
            access_list: Default::default(),
            input: report_relay_calldata(era, report),
        };

        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| OracleError::Para(format!("signing failed: {e}")))?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        let raw = envelope.encoded_2718();

        let tx_hash = self
            .para
            .send_raw_transaction(raw.into())
            .await
            .map_err(OracleError::from_para)?;
        self.last_nonce = Some(nonce);
        info!(era, stash = %report.stash, %tx_hash, nonce, "report transaction broadcast");

        let receipt = self.wait_receipt(tx_hash).await?;
        if receipt.succeeded() {
            metrics::TX_SUCCESS.observe(1.0);
            Ok(SubmitOutcome::Submitted { tx_hash })
        } else {
            metrics::TX_REVERT.observe(1.0);
            metrics::LAST_FAILED_ERA.set(era as f64);
            warn!(era, stash = %report.stash, %tx_hash, "report transaction reverted");
            Err(OracleError::TxRevert { era, tx_hash })
        }
    }

    async fn wait_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<eralink_client::TxReceipt, OracleError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self
                .para
                .transaction_receipt(tx_hash)
                .await
                .map_err(OracleError::from_para)?
            {
                return Ok(receipt);
            }
            if started.elapsed() > RECEIPT_TIMEOUT {
                return Err(OracleError::Para(format!(
                    "timed out waiting for receipt of {tx_hash}"
                )));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
