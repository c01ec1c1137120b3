//! Member registry: the member list and the single election commissioner.
//!
//! Every mutation arrives through generic dispatch from the bound proposal
//! engine. Member ids are never reused: deleting a member removes its entry
//! and keeps the order of the rest.

use crate::proposals::PROPOSAL_ENGINE;
use agora_runtime::{
    decode_state, encode_state, operation_not_found, Binding, Context, Module, Operation,
};
use agora_types::{payload, Address, CallerPolicy, GovernanceError, MemberId, Role};
use serde::{Deserialize, Serialize};

pub const MEMBER_REGISTRY: &str = "MemberRegistry";

/// A governance member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// The principal this member acts as.
    pub identity: Address,
}

/// Operations the member registry accepts through dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberOperation {
    AddMember { name: String, identity: Address },
    DeleteMember { id: MemberId },
    ResetElectionCommissioner { id: MemberId },
}

impl MemberOperation {
    pub const ADD_MEMBER: &'static str = "addMember";
    pub const DELETE_MEMBER: &'static str = "deleteMember";
    pub const RESET_ELECTION_COMMISSIONER: &'static str = "resetElectionCommissioner";
}

impl Operation for MemberOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::AddMember { .. } => Self::ADD_MEMBER,
            Self::DeleteMember { .. } => Self::DELETE_MEMBER,
            Self::ResetElectionCommissioner { .. } => Self::RESET_ELECTION_COMMISSIONER,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, GovernanceError> {
        match self {
            Self::AddMember { name, identity } => payload::encode(&(name, identity)),
            Self::DeleteMember { id } | Self::ResetElectionCommissioner { id } => {
                payload::encode(id)
            }
        }
    }

    fn decode(operation: &str, data: &[u8]) -> Result<Self, GovernanceError> {
        match operation {
            Self::ADD_MEMBER => {
                let (name, identity) = payload::decode(operation, data)?;
                Ok(Self::AddMember { name, identity })
            }
            Self::DELETE_MEMBER => Ok(Self::DeleteMember {
                id: payload::decode(operation, data)?,
            }),
            Self::RESET_ELECTION_COMMISSIONER => Ok(Self::ResetElectionCommissioner {
                id: payload::decode(operation, data)?,
            }),
            _ => Err(operation_not_found(MEMBER_REGISTRY, operation)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemberRegistry {
    owner: Address,
    proposal_engine: Binding<Address>,
    members: Vec<Member>,
    commissioner: MemberId,
    next_id: MemberId,
}

impl MemberRegistry {
    /// Genesis: `owner` becomes member 0 and the election commissioner.
    pub fn new(owner: Address, genesis_name: impl Into<String>) -> Self {
        let genesis = Member {
            id: MemberId::new(0),
            name: genesis_name.into(),
            identity: owner,
        };
        Self {
            owner,
            proposal_engine: Binding::default(),
            members: vec![genesis],
            commissioner: MemberId::new(0),
            next_id: MemberId::new(1),
        }
    }

    /// Bind the proposal engine allowed to dispatch into this registry.
    pub fn set_proposal_engine(
        &mut self,
        ctx: &Context<'_>,
        engine: Address,
    ) -> Result<(), GovernanceError> {
        if *ctx.caller() != self.owner {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::Owner,
            });
        }
        self.proposal_engine.bind(engine, PROPOSAL_ENGINE)?;
        tracing::info!(%engine, "member registry wired to proposal engine");
        Ok(())
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn member_id(&self, identity: &Address) -> Option<MemberId> {
        self.members
            .iter()
            .find(|m| m.identity == *identity)
            .map(|m| m.id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_member(&self, identity: &Address) -> bool {
        self.member_id(identity).is_some()
    }

    pub fn is_election_commissioner(&self, identity: &Address) -> bool {
        self.member_id(identity) == Some(self.commissioner)
    }

    pub fn commissioner_id(&self) -> MemberId {
        self.commissioner
    }

    pub fn commissioner(&self) -> Option<&Member> {
        self.member(self.commissioner)
    }

    pub fn proposal_engine(&self) -> Option<&Address> {
        self.proposal_engine.get(PROPOSAL_ENGINE).ok()
    }

    /// Whether `caller` satisfies `policy`.
    pub fn permits(&self, policy: CallerPolicy, caller: &Address) -> bool {
        match policy {
            CallerPolicy::Commissioner => self.is_election_commissioner(caller),
            CallerPolicy::Member => self.is_member(caller),
            CallerPolicy::Anyone => true,
        }
    }

    fn add_member(&mut self, name: String, identity: Address) -> Result<MemberId, GovernanceError> {
        if self.is_member(&identity) {
            return Err(GovernanceError::DuplicateIdentity(identity));
        }
        let id = self.next_id;
        self.next_id = id.next();
        tracing::info!(member = %id, %identity, name = %name, "member added");
        self.members.push(Member { id, name, identity });
        Ok(id)
    }

    fn delete_member(&mut self, id: MemberId) -> Result<Member, GovernanceError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| GovernanceError::not_found("member", id))?;
        if id == self.commissioner {
            return Err(GovernanceError::CannotDeleteCommissioner(id));
        }
        let removed = self.members.remove(index);
        tracing::info!(member = %id, identity = %removed.identity, "member deleted");
        Ok(removed)
    }

    fn reset_election_commissioner(&mut self, id: MemberId) -> Result<(), GovernanceError> {
        if self.member(id).is_none() {
            return Err(GovernanceError::not_found("member", id));
        }
        tracing::info!(
            previous = %self.commissioner,
            commissioner = %id,
            "election commissioner reset"
        );
        self.commissioner = id;
        Ok(())
    }
}

/// Check `ctx.caller()` against `policy` using the registry at `registry`.
pub(crate) fn authorize(
    ctx: &Context<'_>,
    registry: &Address,
    policy: CallerPolicy,
) -> Result<(), GovernanceError> {
    let caller = *ctx.caller();
    if ctx.read(registry, |m: &MemberRegistry| m.permits(policy, &caller))? {
        return Ok(());
    }
    Err(match policy {
        CallerPolicy::Commissioner => GovernanceError::NotAuthorized {
            caller,
            role: Role::Commissioner,
        },
        _ => GovernanceError::NotAMember(caller),
    })
}

impl Module for MemberRegistry {
    fn kind(&self) -> &'static str {
        MEMBER_REGISTRY
    }

    fn is_executable(&self) -> bool {
        true
    }

    fn execute(
        &mut self,
        ctx: &Context<'_>,
        operation: &str,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        let engine = self.proposal_engine.get(PROPOSAL_ENGINE)?;
        if ctx.caller() != engine {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::ProposalEngine,
            });
        }
        match MemberOperation::decode(operation, payload)? {
            MemberOperation::AddMember { name, identity } => {
                self.add_member(name, identity)?;
            }
            MemberOperation::DeleteMember { id } => {
                self.delete_member(id)?;
            }
            MemberOperation::ResetElectionCommissioner { id } => {
                self.reset_election_commissioner(id)?;
            }
        }
        Ok(())
    }

    fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        encode_state(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
        *self = decode_state(data)?;
        Ok(())
    }
}
