//! Substrate storage key construction.
//!
//! Keys are `twox128(pallet) ++ twox128(item) ++ hasher(encoded_key)`,
//! with the hasher fixed per storage item by the staking and system
//! pallets: `Twox64Concat` for the staking maps, `Blake2_128Concat` for
//! `Staking.Ledger` and `System.Account`.

use eralink_types::AccountId32;
use sp_core::hashing::{blake2_128, twox_128, twox_64};

fn prefix(pallet: &str, item: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(&twox_128(pallet.as_bytes()));
    key.extend_from_slice(&twox_128(item.as_bytes()));
    key
}

fn twox_64_concat(key: &mut Vec<u8>, encoded: &[u8]) {
    key.extend_from_slice(&twox_64(encoded));
    key.extend_from_slice(encoded);
}

fn blake2_128_concat(key: &mut Vec<u8>, encoded: &[u8]) {
    key.extend_from_slice(&blake2_128(encoded));
    key.extend_from_slice(encoded);
}

/// `Staking.ActiveEra` plain storage key.
pub fn active_era() -> Vec<u8> {
    prefix("Staking", "ActiveEra")
}

/// `Staking.Bonded` map key for a stash.
pub fn bonded(stash: &AccountId32) -> Vec<u8> {
    let mut key = prefix("Staking", "Bonded");
    twox_64_concat(&mut key, stash.as_bytes());
    key
}

/// `Staking.Ledger` map key for a controller.
pub fn ledger(controller: &AccountId32) -> Vec<u8> {
    let mut key = prefix("Staking", "Ledger");
    blake2_128_concat(&mut key, controller.as_bytes());
    key
}

/// `Staking.Nominators` map key for a stash.
pub fn nominators(stash: &AccountId32) -> Vec<u8> {
    let mut key = prefix("Staking", "Nominators");
    twox_64_concat(&mut key, stash.as_bytes());
    key
}

/// `Staking.Validators` map key for a stash.
pub fn validators(stash: &AccountId32) -> Vec<u8> {
    let mut key = prefix("Staking", "Validators");
    twox_64_concat(&mut key, stash.as_bytes());
    key
}

/// `Staking.SlashingSpans` map key for a stash.
pub fn slashing_spans(stash: &AccountId32) -> Vec<u8> {
    let mut key = prefix("Staking", "SlashingSpans");
    twox_64_concat(&mut key, stash.as_bytes());
    key
}

/// `System.Account` map key for an account.
pub fn system_account(who: &AccountId32) -> Vec<u8> {
    let mut key = prefix("System", "Account");
    blake2_128_concat(&mut key, who.as_bytes());
    key
}
