//! Member-governed module registry.
//!
//! Four components, each a module deployed into an [`agora_runtime::Host`]:
//! - [`MemberRegistry`] keeps the members and the election commissioner.
//! - [`ProposalEngine`] stores proposals and executes the passed ones.
//! - [`VoteEngine`] runs one quorum/approval vote per proposal.
//! - [`ModuleRegistry`] is the catalog of modules proposals may target.
//!
//! Every mutation of governed state goes through a proposal: a member
//! submits it, the commissioner opens the vote, members vote, the vote is
//! finished, and an authorized caller executes it. Execution dispatches the
//! proposal's operation to its target by name.

pub mod config;
pub mod genesis;
pub mod members;
pub mod modules;
pub mod proposals;
pub mod votes;

pub use config::GovernanceConfig;
pub use genesis::Governance;
pub use members::{Member, MemberOperation, MemberRegistry, MEMBER_REGISTRY};
pub use modules::{
    CoreOperation, ModuleEntry, ModuleRegistry, MEMBER_REGISTRY_SLOT, MODULE_REGISTRY,
    PREINSTALLED_VERSION, PROPOSAL_ENGINE_SLOT, VOTE_ENGINE_SLOT,
};
pub use proposals::{Proposal, ProposalDraft, ProposalEngine, PROPOSAL_ENGINE};
pub use votes::{Choice, VoteEngine, VoteOperation, VoteOutcome, VoteRecord, VoteState, VOTE_ENGINE};
