//! Era identifiers and era-boundary arithmetic.

use serde::{Deserialize, Serialize};

/// Monotonically increasing staking era index.
///
/// The relay chain stores the active era as a `u32`; the contract and the
/// daemon work in `u64` and widen at the decode boundary.
pub type EraId = u64;

/// Era anchor published by the OracleMaster contract.
///
/// The triple pins wall-clock time to era indices: era `anchor_era_id`
/// started at unix second `anchor_timestamp` and every era lasts
/// `seconds_per_era`. The contract value is authoritative; the locally
/// configured era duration is only used as the watchdog period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraAnchor {
    /// Era index the anchor timestamp refers to.
    pub anchor_era_id: EraId,
    /// Unix timestamp (seconds) of the anchor era's start.
    pub anchor_timestamp: u64,
    /// Era length in seconds.
    pub seconds_per_era: u64,
}

impl EraAnchor {
    /// Era expected to be active at the given unix second.
    ///
    /// Saturates at the anchor era for timestamps before the anchor.
    pub fn era_at(&self, unix_now: u64) -> EraId {
        if self.seconds_per_era == 0 || unix_now <= self.anchor_timestamp {
            return self.anchor_era_id;
        }
        self.anchor_era_id + (unix_now - self.anchor_timestamp) / self.seconds_per_era
    }

    /// Unix second at which the given era starts.
    ///
    /// Eras before the anchor are clamped to the anchor timestamp.
    pub fn era_start(&self, era: EraId) -> u64 {
        let delta = era.saturating_sub(self.anchor_era_id);
        self.anchor_timestamp + delta * self.seconds_per_era
    }

    /// Wall-clock skew, in seconds, between two era indices.
    ///
    /// Used by the skew guard: how far (in time) the contract's committed
    /// era trails the relay's observed era.
    pub fn skew_seconds(&self, ahead: EraId, behind: EraId) -> u64 {
        ahead.saturating_sub(behind) * self.seconds_per_era
    }
}

/// Block number at which the given era begins.
///
/// Era boundaries are a pure function of the era index:
/// `era_id * era_duration_in_blocks + initial_block_number`. The block
/// hash read at this height is the snapshot point for all relay reads
/// composing the era's reports.
pub fn era_boundary_block(era: EraId, era_duration_in_blocks: u64, initial_block_number: u64) -> u64 {
    era * era_duration_in_blocks + initial_block_number
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHOR: EraAnchor = EraAnchor {
        anchor_era_id: 100,
        anchor_timestamp: 1_000_000,
        seconds_per_era: 180,
    };

    #[test]
    fn era_at_advances_with_wall_time() {
        assert_eq!(ANCHOR.era_at(1_000_000), 100);
        assert_eq!(ANCHOR.era_at(1_000_179), 100);
        assert_eq!(ANCHOR.era_at(1_000_180), 101);
        assert_eq!(ANCHOR.era_at(1_001_800), 110);
    }

    #[test]
    fn era_at_clamps_before_anchor() {
        assert_eq!(ANCHOR.era_at(0), 100);
        assert_eq!(ANCHOR.era_at(999_999), 100);
    }

    #[test]
    fn era_start_inverts_era_at() {
        for era in [100u64, 101, 150] {
            let start = ANCHOR.era_start(era);
            assert_eq!(ANCHOR.era_at(start), era);
            assert_eq!(ANCHOR.era_at(start + ANCHOR.seconds_per_era - 1), era);
        }
    }

    #[test]
    fn skew_is_era_gap_in_seconds() {
        assert_eq!(ANCHOR.skew_seconds(105, 101), 4 * 180);
        assert_eq!(ANCHOR.skew_seconds(101, 105), 0);
    }

    #[test]
    fn boundary_block_formula() {
        assert_eq!(era_boundary_block(42, 30, 1), 42 * 30 + 1);
        assert_eq!(era_boundary_block(0, 30, 7), 7);
    }
}
