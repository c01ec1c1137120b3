//! Vote tallying arithmetic.
//!
//! All comparisons are scaled: both sides are multiplied out in `u128` before
//! comparing, so no division ever truncates. Changing the order of operations
//! changes pass/fail outcomes at the threshold boundaries.

use crate::params::Thresholds;
use serde::{Deserialize, Serialize};

/// Running counts for one vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: u64,
    pub cast: u64,
}

impl Tally {
    pub fn new(yes: u64, cast: u64) -> Self {
        Self { yes, cast }
    }

    /// `cast * 100 >= quorum_pct * member_count`
    pub fn quorum_met(&self, quorum_pct: u64, member_count: u64) -> bool {
        self.cast as u128 * 100 >= quorum_pct as u128 * member_count as u128
    }

    /// `yes * 100 >= approval_pct * cast`, false when nothing was cast.
    pub fn approval_met(&self, approval_pct: u64) -> bool {
        if self.cast == 0 {
            return false;
        }
        self.yes as u128 * 100 >= approval_pct as u128 * self.cast as u128
    }

    /// Whether a vote with this tally passes under `thresholds`.
    pub fn passes(&self, thresholds: &Thresholds, member_count: u64) -> bool {
        self.quorum_met(thresholds.quorum_pct(), member_count)
            && self.approval_met(thresholds.approval_pct())
    }
}
