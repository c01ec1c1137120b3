//! Genesis deployment and a thin driver over the four components.

use crate::config::GovernanceConfig;
use crate::members::{Member, MemberRegistry};
use crate::modules::{ModuleEntry, ModuleRegistry};
use crate::proposals::{Proposal, ProposalDraft, ProposalEngine};
use crate::votes::{Choice, VoteEngine, VoteOutcome, VoteRecord};
use agora_runtime::{Host, Module};
use agora_types::{Address, GovernanceError, ProposalId, Thresholds};

/// A wired governance deployment inside a [`Host`].
///
/// The addresses are those deployed at genesis. Re-pointing a catalog slot
/// by proposal does not change where this driver sends its calls.
pub struct Governance {
    host: Host,
    member_registry: Address,
    proposal_engine: Address,
    vote_engine: Address,
    core: Address,
}

impl Governance {
    /// Deploy and wire the four components on behalf of `deployer`.
    ///
    /// `deployer` becomes the owner of every component and member 0, the
    /// first election commissioner.
    pub fn genesis(
        mut host: Host,
        deployer: Address,
        config: &GovernanceConfig,
    ) -> Result<Self, GovernanceError> {
        config.validate()?;
        let thresholds = config.thresholds()?;

        let member_registry = host.deploy(
            &deployer,
            MemberRegistry::new(deployer, config.genesis_member.clone()),
        );
        let proposal_engine = host.deploy(
            &deployer,
            ProposalEngine::new(deployer, config.execute_proposal_by),
        );
        let vote_engine = host.deploy(
            &deployer,
            VoteEngine::new(deployer, thresholds, config.finish_vote_by),
        );
        let core = host.deploy(
            &deployer,
            ModuleRegistry::new(member_registry, proposal_engine, vote_engine),
        );

        host.transact(&deployer, &member_registry, |m: &mut MemberRegistry, ctx| {
            m.set_proposal_engine(ctx, proposal_engine)
        })?;
        host.transact(&deployer, &vote_engine, |v: &mut VoteEngine, ctx| {
            v.set_managers(ctx, member_registry, proposal_engine)
        })?;
        host.transact(&deployer, &proposal_engine, |p: &mut ProposalEngine, ctx| {
            p.set_managers_and_core(ctx, core, member_registry, vote_engine)
        })?;

        tracing::info!(
            %deployer,
            %member_registry,
            %proposal_engine,
            %vote_engine,
            %core,
            approval_pct = thresholds.approval_pct(),
            quorum_pct = thresholds.quorum_pct(),
            "governance genesis complete"
        );
        Ok(Self {
            host,
            member_registry,
            proposal_engine,
            vote_engine,
            core,
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Deploy an additional module, e.g. one to be installed by proposal.
    pub fn deploy<M: Module + 'static>(&mut self, deployer: &Address, module: M) -> Address {
        self.host.deploy(deployer, module)
    }

    pub fn member_registry(&self) -> Address {
        self.member_registry
    }

    pub fn proposal_engine(&self) -> Address {
        self.proposal_engine
    }

    pub fn vote_engine(&self) -> Address {
        self.vote_engine
    }

    pub fn core(&self) -> Address {
        self.core
    }

    // ── Proposals ──────────────────────────────────────────────────────

    pub fn add_proposal(
        &self,
        caller: &Address,
        draft: ProposalDraft,
    ) -> Result<ProposalId, GovernanceError> {
        self.host
            .transact(caller, &self.proposal_engine, |p: &mut ProposalEngine, ctx| {
                p.add_proposal(ctx, draft)
            })
    }

    pub fn execute_proposal(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> Result<(), GovernanceError> {
        self.host
            .transact(caller, &self.proposal_engine, |p: &mut ProposalEngine, ctx| {
                p.execute_proposal(ctx, id)
            })
    }

    pub fn proposals(&self) -> Result<Vec<Proposal>, GovernanceError> {
        self.host
            .query(&self.proposal_engine, |p: &ProposalEngine| p.proposals().to_vec())
    }

    pub fn proposal(&self, id: ProposalId) -> Result<Option<Proposal>, GovernanceError> {
        self.host
            .query(&self.proposal_engine, |p: &ProposalEngine| p.proposal(id).cloned())
    }

    // ── Votes ──────────────────────────────────────────────────────────

    pub fn create_and_start_vote(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> Result<(), GovernanceError> {
        self.host
            .transact(caller, &self.vote_engine, |v: &mut VoteEngine, ctx| {
                v.create_and_start_vote(ctx, id)
            })
    }

    pub fn vote(
        &self,
        caller: &Address,
        id: ProposalId,
        choice: Choice,
    ) -> Result<(), GovernanceError> {
        self.host
            .transact(caller, &self.vote_engine, |v: &mut VoteEngine, ctx| {
                v.vote(ctx, id, choice)
            })
    }

    pub fn finish_vote(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> Result<VoteOutcome, GovernanceError> {
        self.host
            .transact(caller, &self.vote_engine, |v: &mut VoteEngine, ctx| {
                v.finish_vote(ctx, id)
            })
    }

    pub fn is_passed(&self, id: ProposalId) -> Result<bool, GovernanceError> {
        self.host
            .query(&self.vote_engine, |v: &VoteEngine| v.is_passed(id))?
    }

    pub fn vote_record(&self, id: ProposalId) -> Result<Option<VoteRecord>, GovernanceError> {
        self.host
            .query(&self.vote_engine, |v: &VoteEngine| v.record(id).cloned())
    }

    pub fn thresholds(&self) -> Result<Thresholds, GovernanceError> {
        self.host.query(&self.vote_engine, |v: &VoteEngine| v.thresholds())
    }

    // ── Members and modules ────────────────────────────────────────────

    pub fn members(&self) -> Result<Vec<Member>, GovernanceError> {
        self.host
            .query(&self.member_registry, |m: &MemberRegistry| m.members().to_vec())
    }

    pub fn is_member(&self, identity: &Address) -> Result<bool, GovernanceError> {
        self.host
            .query(&self.member_registry, |m: &MemberRegistry| m.is_member(identity))
    }

    pub fn is_election_commissioner(&self, identity: &Address) -> Result<bool, GovernanceError> {
        self.host.query(&self.member_registry, |m: &MemberRegistry| {
            m.is_election_commissioner(identity)
        })
    }

    pub fn modules(&self) -> Result<Vec<ModuleEntry>, GovernanceError> {
        self.host
            .query(&self.core, |c: &ModuleRegistry| c.modules().to_vec())
    }

    pub fn is_installed(&self, module: &Address) -> Result<bool, GovernanceError> {
        self.host
            .query(&self.core, |c: &ModuleRegistry| c.is_installed(module))
    }
}
