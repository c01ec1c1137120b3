//! Nullable storage: a governed module holding one number.

use agora_runtime::{
    decode_state, encode_state, operation_not_found, Context, Module, Operation,
};
use agora_types::{payload, Address, GovernanceError, Role};
use serde::{Deserialize, Serialize};

pub const NULL_STORAGE: &str = "NullStorage";

/// Operations [`NullStorage`] accepts through dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageOperation {
    Store(u64),
}

impl StorageOperation {
    pub const STORE: &'static str = "store";
}

impl Operation for StorageOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::Store(_) => Self::STORE,
        }
    }

    fn payload(&self) -> Result<Vec<u8>, GovernanceError> {
        match self {
            Self::Store(value) => payload::encode(value),
        }
    }

    fn decode(operation: &str, data: &[u8]) -> Result<Self, GovernanceError> {
        match operation {
            Self::STORE => Ok(Self::Store(payload::decode(operation, data)?)),
            _ => Err(operation_not_found(NULL_STORAGE, operation)),
        }
    }
}

/// A deterministic storage module for testing governed dispatch.
///
/// Only the proposal engine it was created with may change the value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NullStorage {
    proposal_engine: Address,
    value: u64,
}

impl NullStorage {
    pub fn new(proposal_engine: Address, initial: u64) -> Self {
        Self {
            proposal_engine,
            value: initial,
        }
    }

    pub fn retrieve(&self) -> u64 {
        self.value
    }
}

impl Module for NullStorage {
    fn kind(&self) -> &'static str {
        NULL_STORAGE
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
        if *ctx.caller() != self.proposal_engine {
            return Err(GovernanceError::NotAuthorized {
                caller: *ctx.caller(),
                role: Role::ProposalEngine,
            });
        }
        match StorageOperation::decode(operation, payload)? {
            StorageOperation::Store(value) => self.value = value,
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
