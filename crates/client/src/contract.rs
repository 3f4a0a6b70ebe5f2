//! Statically-typed OracleMaster bindings.
//!
//! The ABI path stays configurable so deployments can pin the artifact
//! they ship, but decoding happens through these static bindings; the
//! JSON is only cross-checked at startup so shape drift fails fast.

use crate::api::{OracleApi, ParaApi};
use crate::error::ClientError;
use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eralink_types::{AccountId32, EraAnchor, EraId, ReportTuple};
use std::path::Path;
use std::sync::Arc;

sol! {
    /// One unbonding chunk inside a staking report.
    struct Unlocking {
        uint128 balance;
        uint64 era;
    }

    /// Per-stash staking report, as consumed by `reportRelay`.
    struct OracleData {
        bytes32 stashAccount;
        bytes32 controllerAccount;
        uint8 stakeStatus;
        uint128 activeBalance;
        uint128 totalBalance;
        Unlocking[] unlocking;
        uint32[] claimedRewards;
        uint128 stashBalance;
        uint32 slashingSpans;
    }

    /// OracleMaster subset consumed by the daemon.
    interface IOracleMaster {
        function getCurrentEraId() external view returns (uint64 eraId);
        function eraId() external view returns (uint64 eraId);
        function getStashAccounts() external view returns (bytes32[] memory stashes);
        function isReportedLastEra(address oracleMember, bytes32 stash)
            external
            view
            returns (uint64 lastEra, bool isReported);
        function ANCHOR_ERA_ID() external view returns (uint64 eraId);
        function ANCHOR_TIMESTAMP() external view returns (uint64 timestamp);
        function SECONDS_PER_ERA() external view returns (uint64 secondsPerEra);
        function reportRelay(uint64 eraId, OracleData calldata report) external;
    }
}

/// Contract functions the ABI artifact must declare.
const REQUIRED_FUNCTIONS: &[&str] = &[
    "getCurrentEraId",
    "eraId",
    "getStashAccounts",
    "isReportedLastEra",
    "ANCHOR_ERA_ID",
    "ANCHOR_TIMESTAMP",
    "SECONDS_PER_ERA",
    "reportRelay",
];

impl From<&ReportTuple> for OracleData {
    fn from(report: &ReportTuple) -> Self {
        OracleData {
            stashAccount: B256::from(*report.stash.as_bytes()),
            controllerAccount: B256::from(*report.controller.as_bytes()),
            stakeStatus: report.status.as_u8(),
            activeBalance: report.active_balance,
            totalBalance: report.total_balance,
            unlocking: report
                .unlocking
                .iter()
                .map(|chunk| Unlocking {
                    balance: chunk.balance,
                    era: chunk.era,
                })
                .collect(),
            claimedRewards: report.claimed_rewards.clone(),
            stashBalance: report.stash_balance,
            slashingSpans: report.slashing_spans,
        }
    }
}

/// Calldata for `reportRelay(era, report)`.
pub fn report_relay_calldata(era: EraId, report: &ReportTuple) -> Bytes {
    IOracleMaster::reportRelayCall {
        eraId: era,
        report: OracleData::from(report),
    }
    .abi_encode()
    .into()
}

/// Cross-check the ABI artifact against the static bindings.
///
/// The artifact is either a bare ABI array or a compiler output object
/// with an `abi` field. Every function in [`REQUIRED_FUNCTIONS`] must be
/// present by name.
pub fn verify_abi_file(path: &Path) -> Result<(), String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read ABI file {}: {e}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| format!("ABI file is not valid JSON: {e}"))?;

    let entries = match &json {
        serde_json::Value::Array(entries) => entries.as_slice(),
        serde_json::Value::Object(object) => object
            .get("abi")
            .and_then(|v| v.as_array())
            .map(|v| v.as_slice())
            .ok_or_else(|| "ABI object has no 'abi' array".to_string())?,
        _ => return Err("ABI file must be an array or an object with an 'abi' array".into()),
    };

    let declared: Vec<&str> = entries
        .iter()
        .filter(|e| e.get("type").and_then(|t| t.as_str()) == Some("function"))
        .filter_map(|e| e.get("name").and_then(|n| n.as_str()))
        .collect();

    for required in REQUIRED_FUNCTIONS {
        if !declared.contains(required) {
            return Err(format!("ABI does not declare the '{required}' function"));
        }
    }
    Ok(())
}

/// OracleMaster read interface over the parachain client.
pub struct OracleMaster {
    para: Arc<dyn ParaApi>,
    address: Address,
}

impl OracleMaster {
    /// Bind the contract at `address`.
    pub fn new(para: Arc<dyn ParaApi>, address: Address) -> Self {
        Self { para, address }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    async fn call<C: SolCall>(&self, call: C) -> Result<C::Return, ClientError> {
        let data = self.para.call(self.address, call.abi_encode().into()).await?;
        C::abi_decode_returns(&data, true)
            .map_err(|e| ClientError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }
}

#[async_trait]
impl OracleApi for OracleMaster {
    async fn current_era_id(&self) -> Result<EraId, ClientError> {
        Ok(self.call(IOracleMaster::getCurrentEraIdCall {}).await?.eraId)
    }

    async fn committed_era_id(&self) -> Result<EraId, ClientError> {
        Ok(self.call(IOracleMaster::eraIdCall {}).await?.eraId)
    }

    async fn anchor(&self) -> Result<EraAnchor, ClientError> {
        let anchor_era_id = self.call(IOracleMaster::ANCHOR_ERA_IDCall {}).await?.eraId;
        let anchor_timestamp = self
            .call(IOracleMaster::ANCHOR_TIMESTAMPCall {})
            .await?
            .timestamp;
        let seconds_per_era = self
            .call(IOracleMaster::SECONDS_PER_ERACall {})
            .await?
            .secondsPerEra;
        Ok(EraAnchor {
            anchor_era_id,
            anchor_timestamp,
            seconds_per_era,
        })
    }

    async fn stash_accounts(&self) -> Result<Vec<AccountId32>, ClientError> {
        let stashes = self.call(IOracleMaster::getStashAccountsCall {}).await?.stashes;
        Ok(stashes
            .into_iter()
            .map(|stash| AccountId32::from_bytes(stash.0))
            .collect())
    }

    async fn is_reported_last_era(
        &self,
        member: Address,
        stash: &AccountId32,
    ) -> Result<(EraId, bool), ClientError> {
        let result = self
            .call(IOracleMaster::isReportedLastEraCall {
                oracleMember: member,
                stash: B256::from(*stash.as_bytes()),
            })
            .await?;
        Ok((result.lastEra, result.isReported))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eralink_types::{StakeStatus, UnlockChunk};
    use std::io::Write;

    fn sample_report() -> ReportTuple {
        ReportTuple {
            stash: AccountId32::from_bytes([1; 32]),
            controller: AccountId32::from_bytes([2; 32]),
            status: StakeStatus::Nominator,
            active_balance: 900,
            total_balance: 1_000,
            unlocking: vec![UnlockChunk {
                balance: 100,
                era: 43,
            }],
            claimed_rewards: vec![40, 41],
            stash_balance: 1_200,
            slashing_spans: 2,
        }
    }

    #[test]
    fn report_relay_calldata_carries_the_selector() {
        let data = report_relay_calldata(42, &sample_report());
        assert_eq!(&data[..4], &IOracleMaster::reportRelayCall::SELECTOR[..]);
        // Era id is the first static argument.
        let decoded =
            IOracleMaster::reportRelayCall::abi_decode(&data, true).expect("roundtrips");
        assert_eq!(decoded.eraId, 42);
        assert_eq!(decoded.report.stakeStatus, 1);
        assert_eq!(decoded.report.unlocking.len(), 1);
        assert_eq!(decoded.report.unlocking[0].era, 43);
    }

    #[test]
    fn abi_check_accepts_complete_artifact() {
        let entries: Vec<serde_json::Value> = REQUIRED_FUNCTIONS
            .iter()
            .map(|name| serde_json::json!({"type": "function", "name": name}))
            .collect();
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{}", serde_json::Value::Array(entries)).expect("write");
        assert!(verify_abi_file(file.path()).is_ok());
    }

    #[test]
    fn abi_check_rejects_missing_report_relay() {
        let entries = serde_json::json!([
            {"type": "function", "name": "getStashAccounts"},
        ]);
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "{entries}").expect("write");
        let err = verify_abi_file(file.path()).expect_err("incomplete ABI");
        assert!(err.contains("getCurrentEraId") || err.contains("reportRelay"));
    }
}
