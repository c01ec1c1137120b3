//! Governance configuration with TOML file support.

use agora_types::{CallerPolicy, GovernanceError, Thresholds};
use agora_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Genesis parameters for a governance deployment.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Display name of member 0, the first election commissioner.
    #[serde(default = "default_genesis_member")]
    pub genesis_member: String,

    /// Share of cast votes that must be Yes, in percent.
    #[serde(default = "default_threshold")]
    pub approval_threshold_pct: u64,

    /// Share of members that must vote, in percent.
    #[serde(default = "default_threshold")]
    pub quorum_threshold_pct: u64,

    /// Who may close a vote.
    #[serde(default = "default_finish_vote_by")]
    pub finish_vote_by: CallerPolicy,

    /// Who may execute a passed proposal.
    #[serde(default = "default_execute_proposal_by")]
    pub execute_proposal_by: CallerPolicy,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_genesis_member() -> String {
    "Shin".to_string()
}

fn default_threshold() -> u64 {
    50
}

fn default_finish_vote_by() -> CallerPolicy {
    CallerPolicy::Commissioner
}

fn default_execute_proposal_by() -> CallerPolicy {
    CallerPolicy::Member
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl GovernanceConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GovernanceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GovernanceError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.genesis_member.trim().is_empty() {
            return Err(GovernanceError::Config(
                "genesis_member must not be empty".to_string(),
            ));
        }
        self.thresholds().map(|_| ())
    }

    /// The vote thresholds, checked against the 0..=100 range.
    pub fn thresholds(&self) -> Result<Thresholds, GovernanceError> {
        Thresholds::new(self.approval_threshold_pct, self.quorum_threshold_pct)
    }

    /// Install the global tracing subscriber with this config's format and level.
    pub fn init_logging(&self) -> Result<(), GovernanceError> {
        agora_utils::init_logging(self.log_format, &self.log_level)
            .map_err(|e| GovernanceError::Config(format!("logging: {e}")))
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            genesis_member: default_genesis_member(),
            approval_threshold_pct: default_threshold(),
            quorum_threshold_pct: default_threshold(),
            finish_vote_by: default_finish_vote_by(),
            execute_proposal_by: default_execute_proposal_by(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
