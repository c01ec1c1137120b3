//! Proposal engine: stores proposals and executes the passed ones.
//!
//! A proposal names a target module, an operation and an opaque payload.
//! Execution marks the proposal executed before dispatching, so a dispatch
//! that tries to come back into this engine can never observe it as still
//! pending. A failed dispatch clears the mark again.

use crate::members::authorize;
use crate::modules::ModuleRegistry;
use crate::votes::VoteEngine;
use agora_runtime::{decode_state, encode_state, Binding, Context, Module, Operation};
use agora_types::{Address, CallerPolicy, GovernanceError, ProposalId, Role};
use serde::{Deserialize, Serialize};

pub const PROPOSAL_ENGINE: &str = "ProposalEngine";
const WIRING: &str = "proposal engine managers";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub proposer: Address,
    pub target: Address,
    pub operation: String,
    pub payload: Vec<u8>,
    pub executed: bool,
}

/// What a member submits. The engine assigns the id and proposer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title: String,
    pub description: String,
    pub target: Address,
    pub operation: String,
    pub payload: Vec<u8>,
}

impl ProposalDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        target: Address,
        operation: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            target,
            operation: operation.into(),
            payload,
        }
    }

    /// A draft invoking a typed operation on `target`.
    pub fn call<O: Operation>(
        title: impl Into<String>,
        description: impl Into<String>,
        target: Address,
        operation: &O,
    ) -> Result<Self, GovernanceError> {
        let payload = operation.payload()?;
        Ok(Self::new(title, description, target, operation.name(), payload))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Wiring {
    core: Address,
    members: Address,
    votes: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalEngine {
    owner: Address,
    wiring: Binding<Wiring>,
    proposals: Vec<Proposal>,
    execute_policy: CallerPolicy,
}

impl ProposalEngine {
    pub fn new(owner: Address, execute_policy: CallerPolicy) -> Self {
        Self {
            owner,
            wiring: Binding::default(),
            proposals: Vec::new(),
            execute_policy,
        }
    }

    /// Bind the module registry, member registry and vote engine. Owner only, once.
    pub fn set_managers_and_core(
        &mut self,
        ctx: &Context<'_>,
        core: Address,
        members: Address,
        votes: Address,
    ) -> Result<(), GovernanceError> {
        if *ctx.caller() != self.owner {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::Owner,
            });
        }
        self.wiring.bind(
            Wiring {
                core,
                members,
                votes,
            },
            WIRING,
        )?;
        tracing::info!(%core, %members, %votes, "proposal engine wired");
        Ok(())
    }

    /// Record a new proposal from the calling member.
    pub fn add_proposal(
        &mut self,
        ctx: &Context<'_>,
        draft: ProposalDraft,
    ) -> Result<ProposalId, GovernanceError> {
        let wiring = *self.wiring.get(WIRING)?;
        authorize(ctx, &wiring.members, CallerPolicy::Member)?;
        if !Self::is_valid_target(ctx, &wiring, &draft.target)? {
            return Err(GovernanceError::TargetNotInstalled(draft.target));
        }
        let id = ProposalId::new(self.proposals.len() as u64);
        tracing::info!(
            proposal = %id,
            proposer = %ctx.caller(),
            target = %draft.target,
            operation = %draft.operation,
            "proposal added"
        );
        self.proposals.push(Proposal {
            id,
            title: draft.title,
            description: draft.description,
            proposer: *ctx.caller(),
            target: draft.target,
            operation: draft.operation,
            payload: draft.payload,
            executed: false,
        });
        Ok(id)
    }

    fn is_valid_target(
        ctx: &Context<'_>,
        wiring: &Wiring,
        target: &Address,
    ) -> Result<bool, GovernanceError> {
        if *target == wiring.core || *target == wiring.members || *target == wiring.votes {
            return Ok(true);
        }
        ctx.read(&wiring.core, |core: &ModuleRegistry| core.is_installed(target))
    }

    /// Execute a passed proposal by dispatching its operation to the target.
    pub fn execute_proposal(
        &mut self,
        ctx: &Context<'_>,
        id: ProposalId,
    ) -> Result<(), GovernanceError> {
        let wiring = *self.wiring.get(WIRING)?;
        authorize(ctx, &wiring.members, self.execute_policy)?;
        let index = self
            .proposals
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GovernanceError::not_found("proposal", id))?;
        if !ctx.read(&wiring.votes, |v: &VoteEngine| v.is_passed(id))?? {
            return Err(GovernanceError::VoteNotApproved(id));
        }
        let proposal = &mut self.proposals[index];
        if proposal.executed {
            return Err(GovernanceError::AlreadyExecuted(id));
        }
        proposal.executed = true;
        let target = proposal.target;
        let operation = proposal.operation.clone();
        let payload = proposal.payload.clone();

        if let Err(err) = ctx.dispatch(&target, &operation, &payload) {
            self.proposals[index].executed = false;
            return Err(err);
        }
        tracing::info!(proposal = %id, %target, operation = %operation, "proposal executed");
        Ok(())
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    pub fn exists(&self, id: ProposalId) -> bool {
        self.proposal(id).is_some()
    }

    pub fn execute_policy(&self) -> CallerPolicy {
        self.execute_policy
    }
}

impl Module for ProposalEngine {
    fn kind(&self) -> &'static str {
        PROPOSAL_ENGINE
    }

    fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        encode_state(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
        *self = decode_state(data)?;
        Ok(())
    }
}
