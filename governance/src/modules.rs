//! Module registry: the catalog of governed modules.
//!
//! Slots 0, 1 and 2 always hold the member registry, proposal engine and
//! vote engine. They can be re-pointed but never removed. Everything else is
//! installed and uninstalled by proposal.

use agora_runtime::{
    decode_state, encode_state, operation_not_found, Context, Module, Operation,
};
use agora_types::{payload, Address, ApplicationId, GovernanceError, Role};
use serde::{Deserialize, Serialize};

pub const MODULE_REGISTRY: &str = "ModuleRegistry";

/// Version recorded for every catalog entry.
pub const PREINSTALLED_VERSION: &str = "0.01";

pub const MEMBER_REGISTRY_SLOT: ApplicationId = ApplicationId::new(0);
pub const PROPOSAL_ENGINE_SLOT: ApplicationId = ApplicationId::new(1);
pub const VOTE_ENGINE_SLOT: ApplicationId = ApplicationId::new(2);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub application_id: ApplicationId,
    pub name: String,
    pub module: Address,
    pub version: String,
    pub is_preinstalled: bool,
}

/// Operations the module registry accepts through dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoreOperation {
    InstallModule { name: String, module: Address },
    UninstallModule { id: ApplicationId },
    UpdateMemberRegistry(Address),
    UpdateProposalEngine(Address),
    UpdateVoteEngine(Address),
}

impl CoreOperation {
    pub const INSTALL_MODULE: &'static str = "installModule";
    pub const UNINSTALL_MODULE: &'static str = "uninstallModule";
    pub const UPDATE_MEMBER_REGISTRY: &'static str = "updateMemberRegistry";
    pub const UPDATE_PROPOSAL_ENGINE: &'static str = "updateProposalEngine";
    pub const UPDATE_VOTE_ENGINE: &'static str = "updateVoteEngine";
}

impl Operation for CoreOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::InstallModule { .. } => Self::INSTALL_MODULE,
            Self::UninstallModule { .. } => Self::UNINSTALL_MODULE,
            Self::UpdateMemberRegistry(_) => Self::UPDATE_MEMBER_REGISTRY,
            Self::UpdateProposalEngine(_) => Self::UPDATE_PROPOSAL_ENGINE,
            Self::UpdateVoteEngine(_) => Self::UPDATE_VOTE_ENGINE,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, GovernanceError> {
        match self {
            Self::InstallModule { name, module } => payload::encode(&(name, module)),
            Self::UninstallModule { id } => payload::encode(id),
            Self::UpdateMemberRegistry(module)
            | Self::UpdateProposalEngine(module)
            | Self::UpdateVoteEngine(module) => payload::encode(module),
        }
    }

    fn decode(operation: &str, data: &[u8]) -> Result<Self, GovernanceError> {
        Ok(match operation {
            Self::INSTALL_MODULE => {
                let (name, module) = payload::decode(operation, data)?;
                Self::InstallModule { name, module }
            }
            Self::UNINSTALL_MODULE => Self::UninstallModule {
                id: payload::decode(operation, data)?,
            },
            Self::UPDATE_MEMBER_REGISTRY => {
                Self::UpdateMemberRegistry(payload::decode(operation, data)?)
            }
            Self::UPDATE_PROPOSAL_ENGINE => {
                Self::UpdateProposalEngine(payload::decode(operation, data)?)
            }
            Self::UPDATE_VOTE_ENGINE => Self::UpdateVoteEngine(payload::decode(operation, data)?),
            _ => return Err(operation_not_found(MODULE_REGISTRY, operation)),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
    next_id: ApplicationId,
}

impl ModuleRegistry {
    pub fn new(member_registry: Address, proposal_engine: Address, vote_engine: Address) -> Self {
        let preinstalled = |id: ApplicationId, name: &str, module: Address| ModuleEntry {
            application_id: id,
            name: name.to_string(),
            module,
            version: PREINSTALLED_VERSION.to_string(),
            is_preinstalled: true,
        };
        Self {
            entries: vec![
                preinstalled(MEMBER_REGISTRY_SLOT, "MemberRegistry", member_registry),
                preinstalled(PROPOSAL_ENGINE_SLOT, "ProposalEngine", proposal_engine),
                preinstalled(VOTE_ENGINE_SLOT, "VoteEngine", vote_engine),
            ],
            next_id: VOTE_ENGINE_SLOT.next(),
        }
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.entries
    }

    pub fn module(&self, id: ApplicationId) -> Option<&ModuleEntry> {
        self.entries.iter().find(|e| e.application_id == id)
    }

    pub fn is_installed(&self, module: &Address) -> bool {
        self.entries.iter().any(|e| e.module == *module)
    }

    pub fn member_registry(&self) -> Option<&Address> {
        self.module(MEMBER_REGISTRY_SLOT).map(|e| &e.module)
    }

    pub fn proposal_engine(&self) -> Option<&Address> {
        self.module(PROPOSAL_ENGINE_SLOT).map(|e| &e.module)
    }

    pub fn vote_engine(&self) -> Option<&Address> {
        self.module(VOTE_ENGINE_SLOT).map(|e| &e.module)
    }

    fn install_module(
        &mut self,
        ctx: &Context<'_>,
        name: String,
        module: Address,
    ) -> Result<ApplicationId, GovernanceError> {
        if self.is_installed(&module) {
            return Err(GovernanceError::AlreadyInstalled(module));
        }
        if !ctx.is_executable(&module) {
            return Err(GovernanceError::IncompatibleModule(module));
        }
        let id = self.next_id;
        self.next_id = id.next();
        tracing::info!(application = %id, %module, name = %name, "module installed");
        self.entries.push(ModuleEntry {
            application_id: id,
            name,
            module,
            version: PREINSTALLED_VERSION.to_string(),
            is_preinstalled: false,
        });
        Ok(id)
    }

    fn uninstall_module(&mut self, id: ApplicationId) -> Result<(), GovernanceError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.application_id == id)
            .ok_or_else(|| GovernanceError::not_found("module", id))?;
        if self.entries[index].is_preinstalled {
            return Err(GovernanceError::CannotRemovePreinstalled(id));
        }
        let removed = self.entries.remove(index);
        tracing::info!(application = %id, module = %removed.module, "module uninstalled");
        Ok(())
    }

    fn repoint(&mut self, slot: ApplicationId, module: Address) -> Result<(), GovernanceError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.application_id == slot)
            .ok_or_else(|| GovernanceError::not_found("module", slot))?;
        tracing::info!(
            application = %slot,
            previous = %entry.module,
            %module,
            "preinstalled module updated"
        );
        entry.module = module;
        Ok(())
    }
}

impl Module for ModuleRegistry {
    fn kind(&self) -> &'static str {
        MODULE_REGISTRY
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
        if self.proposal_engine() != Some(ctx.caller()) {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::ProposalEngine,
            });
        }
        match CoreOperation::decode(operation, payload)? {
            CoreOperation::InstallModule { name, module } => {
                self.install_module(ctx, name, module)?;
            }
            CoreOperation::UninstallModule { id } => self.uninstall_module(id)?,
            CoreOperation::UpdateMemberRegistry(module) => {
                self.repoint(MEMBER_REGISTRY_SLOT, module)?
            }
            CoreOperation::UpdateProposalEngine(module) => {
                self.repoint(PROPOSAL_ENGINE_SLOT, module)?
            }
            CoreOperation::UpdateVoteEngine(module) => self.repoint(VOTE_ENGINE_SLOT, module)?,
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
