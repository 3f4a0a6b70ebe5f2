//! Per-stash report assembly.

use crate::error::OracleError;
use eralink_client::RelayApi;
use eralink_types::{AccountId32, BlockHash, ReportTuple, StakeStatus, UnlockChunk};
use std::sync::Arc;
use tracing::debug;

/// Builds one [`ReportTuple`] per stash, with every relay read pinned to
/// the era-boundary block hash so the report is a consistent snapshot.
pub struct ReportBuilder {
    relay: Arc<dyn RelayApi>,
}

impl ReportBuilder {
    /// Build over the given relay client.
    pub fn new(relay: Arc<dyn RelayApi>) -> Self {
        Self { relay }
    }

    /// Assemble the report for `stash` at the snapshot block `at`.
    ///
    /// Decode failures surface as [`OracleError::RelayData`] and skip the
    /// stash for the era; the era itself keeps processing.
    pub async fn build(
        &self,
        stash: &AccountId32,
        at: &BlockHash,
    ) -> Result<ReportTuple, OracleError> {
        debug!(%stash, snapshot = %at, "reading staking parameters");

        let stash_balance = self
            .relay
            .free_balance(stash, at)
            .await
            .map_err(OracleError::from_relay)?;

        let Some(controller) = self
            .relay
            .bonded(stash, at)
            .await
            .map_err(OracleError::from_relay)?
        else {
            return Ok(ReportTuple::unbonded(*stash, stash_balance));
        };

        let ledger = self
            .relay
            .ledger(&controller, at)
            .await
            .map_err(OracleError::from_relay)?
            .ok_or_else(|| {
                OracleError::RelayData(format!(
                    "stash {stash} is bonded to {controller} but the ledger is missing"
                ))
            })?;

        let slashing_spans = self
            .relay
            .slashing_spans(stash, at)
            .await
            .map_err(OracleError::from_relay)?
            .map(|spans| spans.span_index)
            .unwrap_or(0);

        let status = if self
            .relay
            .nominates(stash, at)
            .await
            .map_err(OracleError::from_relay)?
        {
            StakeStatus::Nominator
        } else if self
            .relay
            .validates(stash, at)
            .await
            .map_err(OracleError::from_relay)?
        {
            StakeStatus::Validator
        } else {
            StakeStatus::Chill
        };

        Ok(ReportTuple {
            stash: *stash,
            controller,
            status,
            active_balance: ledger.active,
            total_balance: ledger.total,
            unlocking: ledger
                .unlocking
                .iter()
                .map(|chunk| UnlockChunk {
                    balance: chunk.value,
                    era: chunk.era as u64,
                })
                .collect(),
            claimed_rewards: ledger.claimed_rewards,
            stash_balance,
            slashing_spans,
        })
    }
}
