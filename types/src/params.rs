//! Governance parameters.
//!
//! Both thresholds are themselves governable: the vote engine exposes
//! operations that replace them once a proposal passes.

use crate::error::GovernanceError;
use serde::{Deserialize, Serialize};

/// Upper bound for every percentage threshold.
pub const MAX_THRESHOLD_PCT: u64 = 100;

/// Approval and quorum thresholds, as whole percentages.
///
/// Both values are always within `0..=MAX_THRESHOLD_PCT`, including after
/// deserialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholds")]
pub struct Thresholds {
    approval_pct: u64,
    quorum_pct: u64,
}

#[derive(Deserialize)]
struct RawThresholds {
    approval_pct: u64,
    quorum_pct: u64,
}

impl TryFrom<RawThresholds> for Thresholds {
    type Error = GovernanceError;

    fn try_from(raw: RawThresholds) -> Result<Self, Self::Error> {
        Self::new(raw.approval_pct, raw.quorum_pct)
    }
}

impl Thresholds {
    pub fn new(approval_pct: u64, quorum_pct: u64) -> Result<Self, GovernanceError> {
        Ok(Self {
            approval_pct: Self::check(approval_pct)?,
            quorum_pct: Self::check(quorum_pct)?,
        })
    }

    /// Minimum share of cast votes that must be Yes.
    pub fn approval_pct(&self) -> u64 {
        self.approval_pct
    }

    /// Minimum share of current members that must cast a vote.
    pub fn quorum_pct(&self) -> u64 {
        self.quorum_pct
    }

    pub fn set_approval_pct(&mut self, pct: u64) -> Result<(), GovernanceError> {
        self.approval_pct = Self::check(pct)?;
        Ok(())
    }

    pub fn set_quorum_pct(&mut self, pct: u64) -> Result<(), GovernanceError> {
        self.quorum_pct = Self::check(pct)?;
        Ok(())
    }

    /// Reject percentages above [`MAX_THRESHOLD_PCT`].
    pub fn check(pct: u64) -> Result<u64, GovernanceError> {
        if pct > MAX_THRESHOLD_PCT {
            return Err(GovernanceError::InvalidThreshold(pct));
        }
        Ok(pct)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            approval_pct: 50,
            quorum_pct: 50,
        }
    }
}

/// Who may trigger a step that the protocol leaves open to policy
/// (finishing a vote, executing a passed proposal).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerPolicy {
    /// Only the current election commissioner.
    Commissioner,
    /// Any current member.
    Member,
    /// Any caller at all.
    Anyone,
}
