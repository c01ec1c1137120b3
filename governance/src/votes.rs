//! Vote engine: one vote per proposal, opened by the election commissioner,
//! closed under the configured finish policy, tallied with scaled integer
//! arithmetic.

use crate::members::{authorize, MemberRegistry};
use crate::proposals::ProposalEngine;
use agora_runtime::{
    decode_state, encode_state, operation_not_found, Binding, Context, Module, Operation,
};
use agora_types::{
    payload, Address, CallerPolicy, GovernanceError, MemberId, ProposalId, Role, Tally,
    Thresholds,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const VOTE_ENGINE: &str = "VoteEngine";
const MANAGERS: &str = "vote engine managers";

/// A ballot. Encoded on the wire as `0` for Yes and `1` for No.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Yes,
    No,
}

impl TryFrom<u8> for Choice {
    type Error = GovernanceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Yes),
            1 => Ok(Self::No),
            other => Err(GovernanceError::InvalidPayload {
                operation: "vote".to_string(),
                reason: format!("unknown choice {other}"),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteState {
    NotStarted,
    InProgress,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOutcome {
    Unknown,
    Passed,
    Failed,
}

/// The single vote held on one proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub state: VoteState,
    pub tally: Tally,
    /// Members that have cast a ballot. Its size always equals `tally.cast`.
    pub voted: BTreeSet<MemberId>,
    /// Thresholds in force when the vote was created.
    pub thresholds: Thresholds,
    pub result: VoteOutcome,
}

/// Operations the vote engine accepts through dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOperation {
    SetApprovalThreshold(u64),
    SetQuorumThreshold(u64),
}

impl VoteOperation {
    pub const SET_APPROVAL_THRESHOLD: &'static str = "setApprovalThreshold";
    pub const SET_QUORUM_THRESHOLD: &'static str = "setQuorumThreshold";
}

impl Operation for VoteOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::SetApprovalThreshold(_) => Self::SET_APPROVAL_THRESHOLD,
            Self::SetQuorumThreshold(_) => Self::SET_QUORUM_THRESHOLD,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, GovernanceError> {
        match self {
            Self::SetApprovalThreshold(pct) | Self::SetQuorumThreshold(pct) => {
                payload::encode(pct)
            }
        }
    }

    fn decode(operation: &str, data: &[u8]) -> Result<Self, GovernanceError> {
        match operation {
            Self::SET_APPROVAL_THRESHOLD => Ok(Self::SetApprovalThreshold(payload::decode(
                operation, data,
            )?)),
            Self::SET_QUORUM_THRESHOLD => {
                Ok(Self::SetQuorumThreshold(payload::decode(operation, data)?))
            }
            _ => Err(operation_not_found(VOTE_ENGINE, operation)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Managers {
    members: Address,
    proposals: Address,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteEngine {
    owner: Address,
    managers: Binding<Managers>,
    thresholds: Thresholds,
    finish_policy: CallerPolicy,
    records: BTreeMap<ProposalId, VoteRecord>,
}

impl VoteEngine {
    pub fn new(owner: Address, thresholds: Thresholds, finish_policy: CallerPolicy) -> Self {
        Self {
            owner,
            managers: Binding::default(),
            thresholds,
            finish_policy,
            records: BTreeMap::new(),
        }
    }

    /// Bind the member registry and proposal engine. Owner only, once.
    pub fn set_managers(
        &mut self,
        ctx: &Context<'_>,
        members: Address,
        proposals: Address,
    ) -> Result<(), GovernanceError> {
        if *ctx.caller() != self.owner {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::Owner,
            });
        }
        self.managers.bind(Managers { members, proposals }, MANAGERS)?;
        tracing::info!(%members, %proposals, "vote engine wired");
        Ok(())
    }

    /// Open the vote on `proposal_id`. Election commissioner only.
    pub fn create_and_start_vote(
        &mut self,
        ctx: &Context<'_>,
        proposal_id: ProposalId,
    ) -> Result<(), GovernanceError> {
        let managers = *self.managers.get(MANAGERS)?;
        authorize(ctx, &managers.members, CallerPolicy::Commissioner)?;
        if !ctx.read(&managers.proposals, |p: &ProposalEngine| p.exists(proposal_id))? {
            return Err(GovernanceError::not_found("proposal", proposal_id));
        }
        if self.records.contains_key(&proposal_id) {
            return Err(GovernanceError::AlreadyStarted(proposal_id));
        }
        self.records.insert(
            proposal_id,
            VoteRecord {
                proposal_id,
                state: VoteState::InProgress,
                tally: Tally::default(),
                voted: BTreeSet::new(),
                thresholds: self.thresholds,
                result: VoteOutcome::Unknown,
            },
        );
        tracing::info!(proposal = %proposal_id, "vote started");
        Ok(())
    }

    /// Cast the caller's ballot on `proposal_id`.
    pub fn vote(
        &mut self,
        ctx: &Context<'_>,
        proposal_id: ProposalId,
        choice: Choice,
    ) -> Result<(), GovernanceError> {
        let managers = *self.managers.get(MANAGERS)?;
        let record = self
            .records
            .get_mut(&proposal_id)
            .filter(|r| r.state == VoteState::InProgress)
            .ok_or(GovernanceError::NotInProgress(proposal_id))?;
        let caller = *ctx.caller();
        let member = ctx
            .read(&managers.members, |m: &MemberRegistry| m.member_id(&caller))?
            .ok_or(GovernanceError::NotAMember(caller))?;
        if !record.voted.insert(member) {
            return Err(GovernanceError::AlreadyVoted {
                proposal: proposal_id,
                member,
            });
        }
        if choice == Choice::Yes {
            record.tally.yes += 1;
        }
        record.tally.cast += 1;
        tracing::info!(proposal = %proposal_id, %member, ?choice, "vote cast");
        Ok(())
    }

    /// Close the vote on `proposal_id` and record the outcome.
    ///
    /// Quorum is measured against the member count at the moment of
    /// finishing, not at creation.
    pub fn finish_vote(
        &mut self,
        ctx: &Context<'_>,
        proposal_id: ProposalId,
    ) -> Result<VoteOutcome, GovernanceError> {
        let managers = *self.managers.get(MANAGERS)?;
        authorize(ctx, &managers.members, self.finish_policy)?;
        let record = self
            .records
            .get_mut(&proposal_id)
            .filter(|r| r.state == VoteState::InProgress)
            .ok_or(GovernanceError::NotInProgress(proposal_id))?;
        let member_count =
            ctx.read(&managers.members, |m: &MemberRegistry| m.member_count())? as u64;
        record.result = if record.tally.passes(&record.thresholds, member_count) {
            VoteOutcome::Passed
        } else {
            VoteOutcome::Failed
        };
        record.state = VoteState::Finished;
        tracing::info!(
            proposal = %proposal_id,
            yes = record.tally.yes,
            cast = record.tally.cast,
            members = member_count,
            result = ?record.result,
            "vote finished"
        );
        Ok(record.result)
    }

    /// Whether the finished vote on `proposal_id` passed.
    pub fn is_passed(&self, proposal_id: ProposalId) -> Result<bool, GovernanceError> {
        match self.records.get(&proposal_id) {
            Some(record) if record.state == VoteState::Finished => {
                Ok(record.result == VoteOutcome::Passed)
            }
            _ => Err(GovernanceError::NotFinished(proposal_id)),
        }
    }

    pub fn record(&self, proposal_id: ProposalId) -> Option<&VoteRecord> {
        self.records.get(&proposal_id)
    }

    pub fn state(&self, proposal_id: ProposalId) -> VoteState {
        self.records
            .get(&proposal_id)
            .map_or(VoteState::NotStarted, |r| r.state)
    }

    pub fn outcome(&self, proposal_id: ProposalId) -> VoteOutcome {
        self.records
            .get(&proposal_id)
            .map_or(VoteOutcome::Unknown, |r| r.result)
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn finish_policy(&self) -> CallerPolicy {
        self.finish_policy
    }
}

impl Module for VoteEngine {
    fn kind(&self) -> &'static str {
        VOTE_ENGINE
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
        let managers = self.managers.get(MANAGERS)?;
        if *ctx.caller() != managers.proposals {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::ProposalEngine,
            });
        }
        match VoteOperation::decode(operation, payload)? {
            VoteOperation::SetApprovalThreshold(pct) => {
                self.thresholds.set_approval_pct(pct)?;
                tracing::info!(approval_pct = pct, "approval threshold updated");
            }
            VoteOperation::SetQuorumThreshold(pct) => {
                self.thresholds.set_quorum_pct(pct)?;
                tracing::info!(quorum_pct = pct, "quorum threshold updated");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposals::ProposalDraft;
    use agora_runtime::Host;

    fn shin() -> Address {
        Address::new([1; 20])
    }

    fn saki() -> Address {
        Address::new([2; 20])
    }

    /// A member registry, proposal engine and vote engine wired together,
    /// with one proposal (id 0) on file. No core is deployed; the proposal
    /// targets the member registry, which is always a valid target.
    struct Fixture {
        host: Host,
        members: Address,
        proposals: Address,
        votes: Address,
    }

    fn fixture(thresholds: Thresholds, finish_policy: CallerPolicy) -> Fixture {
        let mut host = Host::new();
        let members = host.deploy(&shin(), MemberRegistry::new(shin(), "Shin"));
        let proposals = host.deploy(&shin(), ProposalEngine::new(shin(), CallerPolicy::Member));
        let votes = host.deploy(&shin(), VoteEngine::new(shin(), thresholds, finish_policy));
        let core = Address::new([0xc0; 20]);
        host.transact(&shin(), &votes, |v: &mut VoteEngine, ctx| {
            v.set_managers(ctx, members, proposals)
        })
        .unwrap();
        host.transact(&shin(), &proposals, |p: &mut ProposalEngine, ctx| {
            p.set_managers_and_core(ctx, core, members, votes)
        })
        .unwrap();
        let draft = ProposalDraft::new("title", "description", members, "deleteMember", vec![]);
        host.transact(&shin(), &proposals, |p: &mut ProposalEngine, ctx| {
            p.add_proposal(ctx, draft)
        })
        .unwrap();
        Fixture {
            host,
            members,
            proposals,
            votes,
        }
    }

    fn start(f: &Fixture, who: Address, id: u64) -> Result<(), GovernanceError> {
        f.host.transact(&who, &f.votes, |v: &mut VoteEngine, ctx| {
            v.create_and_start_vote(ctx, ProposalId::new(id))
        })
    }

    fn cast(f: &Fixture, who: Address, id: u64, choice: Choice) -> Result<(), GovernanceError> {
        f.host.transact(&who, &f.votes, |v: &mut VoteEngine, ctx| {
            v.vote(ctx, ProposalId::new(id), choice)
        })
    }

    fn finish(f: &Fixture, who: Address, id: u64) -> Result<VoteOutcome, GovernanceError> {
        f.host.transact(&who, &f.votes, |v: &mut VoteEngine, ctx| {
            v.finish_vote(ctx, ProposalId::new(id))
        })
    }

    #[test]
    fn choice_decodes_from_wire_values() {
        assert_eq!(Choice::try_from(0), Ok(Choice::Yes));
        assert_eq!(Choice::try_from(1), Ok(Choice::No));
        assert!(matches!(
            Choice::try_from(2),
            Err(GovernanceError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn single_yes_passes_and_no_votes_fail() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        start(&f, shin(), 0).unwrap();
        cast(&f, shin(), 0, Choice::Yes).unwrap();
        assert_eq!(finish(&f, shin(), 0), Ok(VoteOutcome::Passed));
        let passed = f
            .host
            .query(&f.votes, |v: &VoteEngine| v.is_passed(ProposalId::new(0)))
            .unwrap();
        assert_eq!(passed, Ok(true));

        let draft = ProposalDraft::new("t", "d", f.members, "deleteMember", vec![]);
        f.host
            .transact(&shin(), &f.proposals, |p: &mut ProposalEngine, ctx| {
                p.add_proposal(ctx, draft)
            })
            .unwrap();
        start(&f, shin(), 1).unwrap();
        assert_eq!(finish(&f, shin(), 1), Ok(VoteOutcome::Failed));

        let outcomes = f
            .host
            .query(&f.votes, |v: &VoteEngine| {
                [0, 1, 2].map(|id| v.outcome(ProposalId::new(id)))
            })
            .unwrap();
        assert_eq!(
            outcomes,
            [VoteOutcome::Passed, VoteOutcome::Failed, VoteOutcome::Unknown]
        );
    }

    #[test]
    fn only_the_commissioner_opens_votes() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        let err = start(&f, saki(), 0).unwrap_err();
        assert_eq!(
            err,
            GovernanceError::NotAuthorized {
                caller: saki(),
                role: Role::Commissioner
            }
        );
        start(&f, shin(), 0).unwrap();
        assert_eq!(start(&f, shin(), 0), Err(GovernanceError::AlreadyStarted(ProposalId::new(0))));
        assert_eq!(
            start(&f, shin(), 7),
            Err(GovernanceError::not_found("proposal", ProposalId::new(7)))
        );
    }

    #[test]
    fn ballots_are_checked() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        assert_eq!(
            cast(&f, shin(), 0, Choice::Yes),
            Err(GovernanceError::NotInProgress(ProposalId::new(0)))
        );
        start(&f, shin(), 0).unwrap();
        assert_eq!(cast(&f, saki(), 0, Choice::Yes), Err(GovernanceError::NotAMember(saki())));
        cast(&f, shin(), 0, Choice::No).unwrap();
        assert_eq!(
            cast(&f, shin(), 0, Choice::Yes),
            Err(GovernanceError::AlreadyVoted {
                proposal: ProposalId::new(0),
                member: MemberId::new(0)
            })
        );
        let record = f
            .host
            .query(&f.votes, |v: &VoteEngine| v.record(ProposalId::new(0)).cloned())
            .unwrap()
            .unwrap();
        assert_eq!(record.tally, Tally::new(0, 1));
        assert_eq!(record.voted.len() as u64, record.tally.cast);
    }

    #[test]
    fn finish_follows_policy_and_state() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        assert_eq!(finish(&f, shin(), 0), Err(GovernanceError::NotInProgress(ProposalId::new(0))));
        start(&f, shin(), 0).unwrap();
        assert_eq!(
            finish(&f, saki(), 0),
            Err(GovernanceError::NotAuthorized {
                caller: saki(),
                role: Role::Commissioner
            })
        );
        finish(&f, shin(), 0).unwrap();
        assert_eq!(finish(&f, shin(), 0), Err(GovernanceError::NotInProgress(ProposalId::new(0))));
        assert_eq!(
            f.host.query(&f.votes, |v: &VoteEngine| v.state(ProposalId::new(0))).unwrap(),
            VoteState::Finished
        );

        let open = fixture(Thresholds::default(), CallerPolicy::Anyone);
        start(&open, shin(), 0).unwrap();
        assert_eq!(finish(&open, saki(), 0), Ok(VoteOutcome::Failed));
    }

    #[test]
    fn is_passed_requires_finished_vote() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        let query = |f: &Fixture| {
            f.host
                .query(&f.votes, |v: &VoteEngine| v.is_passed(ProposalId::new(0)))
                .unwrap()
        };
        assert_eq!(query(&f), Err(GovernanceError::NotFinished(ProposalId::new(0))));
        start(&f, shin(), 0).unwrap();
        assert_eq!(query(&f), Err(GovernanceError::NotFinished(ProposalId::new(0))));
    }

    #[test]
    fn unwired_engine_rejects_everything() {
        let mut host = Host::new();
        let votes = host.deploy(
            &shin(),
            VoteEngine::new(shin(), Thresholds::default(), CallerPolicy::Commissioner),
        );
        let err = host
            .transact(&shin(), &votes, |v: &mut VoteEngine, ctx| {
                v.create_and_start_vote(ctx, ProposalId::new(0))
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::NotWired(MANAGERS));
        let err = host
            .transact(&shin(), &votes, |v: &mut VoteEngine, ctx| {
                v.vote(ctx, ProposalId::new(0), Choice::Yes)
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::NotWired(MANAGERS));
    }

    #[test]
    fn thresholds_change_only_through_the_proposal_engine() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        let op = VoteOperation::SetApprovalThreshold(80);
        let err = f
            .host
            .transact(&shin(), &f.votes, |v: &mut VoteEngine, ctx| {
                v.execute(ctx, op.name(), &op.payload().unwrap())
            })
            .unwrap_err();
        assert_eq!(
            err,
            GovernanceError::NotAuthorized {
                caller: shin(),
                role: Role::ProposalEngine
            }
        );

        f.host
            .transact(&f.proposals, &f.votes, |v: &mut VoteEngine, ctx| {
                v.execute(ctx, op.name(), &op.payload().unwrap())
            })
            .unwrap();
        let bad = VoteOperation::SetQuorumThreshold(101);
        let err = f
            .host
            .transact(&f.proposals, &f.votes, |v: &mut VoteEngine, ctx| {
                v.execute(ctx, bad.name(), &bad.payload().unwrap())
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::InvalidThreshold(101));
        assert_eq!(
            f.host.query(&f.votes, |v: &VoteEngine| v.thresholds()).unwrap(),
            Thresholds::new(80, 50).unwrap()
        );
    }

    #[test]
    fn thresholds_stay_within_percent_range() {
        assert_eq!(
            Thresholds::new(250, 0),
            Err(GovernanceError::InvalidThreshold(250))
        );

        let f = fixture(Thresholds::new(100, 0).unwrap(), CallerPolicy::Commissioner);
        let op = VoteOperation::SetApprovalThreshold(250);
        let err = f
            .host
            .transact(&f.proposals, &f.votes, |v: &mut VoteEngine, ctx| {
                v.execute(ctx, op.name(), &op.payload().unwrap())
            })
            .unwrap_err();
        assert_eq!(err, GovernanceError::InvalidThreshold(250));

        // The strictest valid threshold still lets a unanimous vote pass.
        start(&f, shin(), 0).unwrap();
        cast(&f, shin(), 0, Choice::Yes).unwrap();
        assert_eq!(finish(&f, shin(), 0), Ok(VoteOutcome::Passed));
    }

    #[test]
    fn open_votes_keep_their_thresholds() {
        let f = fixture(Thresholds::default(), CallerPolicy::Commissioner);
        start(&f, shin(), 0).unwrap();
        let op = VoteOperation::SetApprovalThreshold(100);
        f.host
            .transact(&f.proposals, &f.votes, |v: &mut VoteEngine, ctx| {
                v.execute(ctx, op.name(), &op.payload().unwrap())
            })
            .unwrap();
        let record = f
            .host
            .query(&f.votes, |v: &VoteEngine| v.record(ProposalId::new(0)).cloned())
            .unwrap()
            .unwrap();
        assert_eq!(record.thresholds, Thresholds::default());
    }
}
