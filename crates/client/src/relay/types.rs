//! SCALE-decodable shapes of the relay-chain storage items we read.
//!
//! Field layouts follow the Kusama-family staking pallet. Balances are
//! compact-encoded on chain.

use eralink_types::AccountId32;
use parity_scale_codec::Decode;

/// `Staking.ActiveEra` storage value.
#[derive(Debug, Clone, Decode)]
pub struct ActiveEraInfo {
    /// Active era index.
    pub index: u32,
    /// Era start, unix milliseconds. Unset while the era is queued.
    pub start: Option<u64>,
}

/// One unbonding chunk inside the staking ledger.
#[derive(Debug, Clone, Decode)]
pub struct UnlockChunk {
    /// Amount scheduled to unlock.
    #[codec(compact)]
    pub value: u128,
    /// Era at which the chunk unlocks.
    #[codec(compact)]
    pub era: u32,
}

/// `Staking.Ledger` storage value, keyed by controller.
#[derive(Debug, Clone, Decode)]
pub struct StakingLedger {
    /// Stash this ledger belongs to.
    pub stash: AccountId32,
    /// Total bonded balance, including unlocking chunks.
    #[codec(compact)]
    pub total: u128,
    /// Actively staked balance.
    #[codec(compact)]
    pub active: u128,
    /// Chunks scheduled for unlock.
    pub unlocking: Vec<UnlockChunk>,
    /// Eras for which rewards were already claimed.
    pub claimed_rewards: Vec<u32>,
}

/// `System.Account` storage value.
#[derive(Debug, Clone, Decode)]
pub struct AccountInfo {
    /// Transaction nonce.
    pub nonce: u32,
    /// Module references preventing reaping.
    pub consumers: u32,
    /// Module references allowing existence.
    pub providers: u32,
    /// Self-sufficient reference count.
    pub sufficients: u32,
    /// Balance data.
    pub data: AccountData,
}

/// Balance portion of `System.Account`.
#[derive(Debug, Clone, Decode)]
pub struct AccountData {
    /// Free balance.
    pub free: u128,
    /// Reserved balance.
    pub reserved: u128,
    /// Frozen for miscellaneous reasons.
    pub misc_frozen: u128,
    /// Frozen for fee payment.
    pub fee_frozen: u128,
}

/// `Staking.SlashingSpans` storage value.
#[derive(Debug, Clone, Decode)]
pub struct SlashingSpans {
    /// Index of the current span.
    pub span_index: u32,
    /// Era the last span started in.
    pub last_start: u32,
    /// Era of the most recent non-zero slash.
    pub last_nonzero_slash: u32,
    /// Lengths of prior spans, most recent first.
    pub prior: Vec<u32>,
}
