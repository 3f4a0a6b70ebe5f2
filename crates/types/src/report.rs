//! Per-stash staking report assembled at an era boundary.

use crate::account::AccountId32;
use crate::era::EraId;
use serde::{Deserialize, Serialize};

/// Staking role of a stash at the snapshot block.
///
/// The discriminants are part of the contract ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StakeStatus {
    /// Bonded but neither nominating nor validating.
    Chill = 0,
    /// Nominating at the snapshot block.
    Nominator = 1,
    /// In the active validator set at the snapshot block.
    Validator = 2,
    /// Not bonded at all.
    None = 3,
}

impl StakeStatus {
    /// ABI discriminant.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One chunk of currently-unbonding funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockChunk {
    /// Amount being unbonded.
    pub balance: u128,
    /// Era at which the chunk becomes withdrawable.
    pub era: EraId,
}

/// The report submitted to `OracleMaster.reportRelay` for one stash at
/// one era boundary.
///
/// All balance fields are observed values; the daemon does not enforce
/// `active <= total <= stash_balance`, the contract validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTuple {
    /// Stash account the report describes.
    pub stash: AccountId32,
    /// Controller bonded to the stash; zero when not bonded.
    pub controller: AccountId32,
    /// Staking role at the snapshot block.
    pub status: StakeStatus,
    /// Actively staked balance from the ledger.
    pub active_balance: u128,
    /// Total bonded balance from the ledger.
    pub total_balance: u128,
    /// Unbonding chunks from the ledger.
    pub unlocking: Vec<UnlockChunk>,
    /// Eras for which rewards were already claimed.
    pub claimed_rewards: Vec<u32>,
    /// Free balance of the stash account itself.
    pub stash_balance: u128,
    /// Number of slashing spans recorded for the stash.
    pub slashing_spans: u32,
}

impl ReportTuple {
    /// Report for a stash that is not bonded: zero controller, `None`
    /// status, empty ledger fields. The stash free balance is still
    /// observed and carried.
    pub fn unbonded(stash: AccountId32, stash_balance: u128) -> Self {
        Self {
            stash,
            controller: AccountId32::ZERO,
            status: StakeStatus::None,
            active_balance: 0,
            total_balance: 0,
            unlocking: Vec::new(),
            claimed_rewards: Vec::new(),
            stash_balance,
            slashing_spans: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_status_discriminants_match_abi() {
        assert_eq!(StakeStatus::Chill.as_u8(), 0);
        assert_eq!(StakeStatus::Nominator.as_u8(), 1);
        assert_eq!(StakeStatus::Validator.as_u8(), 2);
        assert_eq!(StakeStatus::None.as_u8(), 3);
    }

    #[test]
    fn unbonded_report_is_zeroed_except_stash_balance() {
        let stash = AccountId32::from_bytes([7; 32]);
        let report = ReportTuple::unbonded(stash, 42);
        assert_eq!(report.controller, AccountId32::ZERO);
        assert_eq!(report.status, StakeStatus::None);
        assert_eq!(report.active_balance, 0);
        assert_eq!(report.total_balance, 0);
        assert!(report.unlocking.is_empty());
        assert!(report.claimed_rewards.is_empty());
        assert_eq!(report.stash_balance, 42);
        assert_eq!(report.slashing_spans, 0);
    }
}
