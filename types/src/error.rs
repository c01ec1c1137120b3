//! Governance error taxonomy shared by every component.
//!
//! Every rejected precondition has its own variant so callers can branch on
//! cause; [`GovernanceError::kind`] groups them into the coarse categories.

use crate::address::Address;
use crate::id::{ApplicationId, MemberId, ProposalId};
use std::fmt;
use thiserror::Error;

/// The role a caller was required to hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The principal that deployed the component.
    Owner,
    /// The single member holding the commissioner flag.
    Commissioner,
    /// Any current member.
    Member,
    /// The proposal engine bound to the callee.
    ProposalEngine,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Owner => "owner",
            Self::Commissioner => "election commissioner",
            Self::Member => "member",
            Self::ProposalEngine => "proposal engine",
        };
        f.write_str(name)
    }
}

/// Coarse grouping of [`GovernanceError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotAuthorized,
    NotFound,
    InvalidState,
    PolicyViolation,
    Interface,
    Environment,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("caller {caller} is not the {role}")]
    NotAuthorized { caller: Address, role: Role },

    #[error("caller {0} is not a member")]
    NotAMember(Address),

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: u64 },

    #[error("vote on proposal {0} has already started")]
    AlreadyStarted(ProposalId),

    #[error("vote on proposal {0} is not in progress")]
    NotInProgress(ProposalId),

    #[error("vote on proposal {0} is not finished")]
    NotFinished(ProposalId),

    #[error("member {member} has already voted on proposal {proposal}")]
    AlreadyVoted {
        proposal: ProposalId,
        member: MemberId,
    },

    #[error("proposal {0} has already been executed")]
    AlreadyExecuted(ProposalId),

    #[error("{0} is already set")]
    AlreadySet(&'static str),

    #[error("{0} is not set")]
    NotWired(&'static str),

    #[error("module {0} is already executing")]
    Reentrant(Address),

    #[error("member {0} is the election commissioner and cannot be deleted")]
    CannotDeleteCommissioner(MemberId),

    #[error("module {0} is preinstalled and cannot be removed")]
    CannotRemovePreinstalled(ApplicationId),

    #[error("vote on proposal {0} is not approved")]
    VoteNotApproved(ProposalId),

    #[error("target module {0} is not installed")]
    TargetNotInstalled(Address),

    #[error("identity {0} is already a member")]
    DuplicateIdentity(Address),

    #[error("module {0} is already installed")]
    AlreadyInstalled(Address),

    #[error("threshold {0}% is outside 0..=100")]
    InvalidThreshold(u64),

    #[error("module {0} does not implement the required interface")]
    IncompatibleModule(Address),

    #[error("{module}: operation {operation:?} not found")]
    OperationNotFound {
        module: &'static str,
        operation: String,
    },

    #[error("invalid payload for {operation:?}: {reason}")]
    InvalidPayload { operation: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("state codec error: {0}")]
    Codec(String),
}

impl GovernanceError {
    pub fn not_found(what: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthorized { .. } | Self::NotAMember(_) => ErrorKind::NotAuthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyStarted(_)
            | Self::NotInProgress(_)
            | Self::NotFinished(_)
            | Self::AlreadyVoted { .. }
            | Self::AlreadyExecuted(_)
            | Self::AlreadySet(_)
            | Self::NotWired(_)
            | Self::Reentrant(_) => ErrorKind::InvalidState,
            Self::CannotDeleteCommissioner(_)
            | Self::CannotRemovePreinstalled(_)
            | Self::VoteNotApproved(_)
            | Self::TargetNotInstalled(_)
            | Self::DuplicateIdentity(_)
            | Self::AlreadyInstalled(_)
            | Self::InvalidThreshold(_) => ErrorKind::PolicyViolation,
            Self::IncompatibleModule(_)
            | Self::OperationNotFound { .. }
            | Self::InvalidPayload { .. } => ErrorKind::Interface,
            Self::Config(_) | Self::Codec(_) => ErrorKind::Environment,
        }
    }
}

impl From<bincode::Error> for GovernanceError {
    fn from(e: bincode::Error) -> Self {
        Self::Codec(e.to_string())
    }
}
