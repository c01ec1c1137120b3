//! Fundamental types for the Agora governance workspace.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, sequential ids, the governance error taxonomy, vote thresholds and
//! the payload codec used by the generic dispatch protocol.

pub mod address;
pub mod error;
pub mod id;
pub mod params;
pub mod payload;
pub mod tally;

pub use address::Address;
pub use error::{ErrorKind, GovernanceError, Role};
pub use id::{ApplicationId, MemberId, ProposalId};
pub use params::{CallerPolicy, Thresholds, MAX_THRESHOLD_PCT};
pub use tally::Tally;
