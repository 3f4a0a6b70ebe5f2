//! Era advance detection and boundary arithmetic.

use eralink_types::{era::era_boundary_block, EraAnchor, EraId};
use std::time::{Duration, Instant};

/// Tracks the relay chain's active era across monitoring ticks.
///
/// The tracker only moves forward: a repeated or lower observation is
/// not an advance. The era-boundary block is a pure function of the era
/// index, so the snapshot point for an era is computable the moment the
/// advance is observed.
pub struct EraTracker {
    anchor: EraAnchor,
    era_duration_blocks: u64,
    initial_block_number: u64,
    last_seen: Option<EraId>,
    last_advance_at: Instant,
}

impl EraTracker {
    /// Create a tracker from the contract anchor and the local block
    /// arithmetic parameters.
    pub fn new(anchor: EraAnchor, era_duration_blocks: u64, initial_block_number: u64) -> Self {
        Self {
            anchor,
            era_duration_blocks,
            initial_block_number,
            last_seen: None,
            last_advance_at: Instant::now(),
        }
    }

    /// The contract anchor driving era/wall-time arithmetic.
    pub fn anchor(&self) -> &EraAnchor {
        &self.anchor
    }

    /// Last era observed on the relay chain, if any.
    pub fn last_seen(&self) -> Option<EraId> {
        self.last_seen
    }

    /// Feed an observation. Returns `Some(era)` when the era advanced
    /// past the previous observation (the first observation counts).
    pub fn observe(&mut self, era: EraId) -> Option<EraId> {
        match self.last_seen {
            Some(previous) if era <= previous => None,
            _ => {
                self.last_seen = Some(era);
                self.last_advance_at = Instant::now();
                Some(era)
            }
        }
    }

    /// Time since the last observed era advance.
    pub fn stagnant_for(&self) -> Duration {
        self.last_advance_at.elapsed()
    }

    /// Block number of the given era's boundary.
    pub fn boundary_block(&self, era: EraId) -> u64 {
        era_boundary_block(era, self.era_duration_blocks, self.initial_block_number)
    }

    #[cfg(test)]
    fn backdate_last_advance(&mut self, by: Duration) {
        self.last_advance_at -= by;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> EraTracker {
        EraTracker::new(
            EraAnchor {
                anchor_era_id: 0,
                anchor_timestamp: 0,
                seconds_per_era: 180,
            },
            30,
            1,
        )
    }

    #[test]
    fn first_observation_is_an_advance() {
        let mut tracker = tracker();
        assert_eq!(tracker.observe(42), Some(42));
        assert_eq!(tracker.last_seen(), Some(42));
    }

    #[test]
    fn repeated_or_lower_observations_are_not_advances() {
        let mut tracker = tracker();
        tracker.observe(42);
        assert_eq!(tracker.observe(42), None);
        assert_eq!(tracker.observe(41), None);
        assert_eq!(tracker.observe(43), Some(43));
    }

    #[test]
    fn boundary_block_uses_local_arithmetic() {
        let tracker = tracker();
        assert_eq!(tracker.boundary_block(42), 42 * 30 + 1);
    }

    #[test]
    fn advance_resets_stagnation() {
        let mut tracker = tracker();
        tracker.observe(1);
        tracker.backdate_last_advance(Duration::from_secs(400));
        assert!(tracker.stagnant_for() >= Duration::from_secs(400));
        tracker.observe(2);
        assert!(tracker.stagnant_for() < Duration::from_secs(1));
    }
}
