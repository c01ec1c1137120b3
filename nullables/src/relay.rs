//! Nullable relay: forwards every dispatched operation to a fixed target.
//!
//! Used to build call chains that loop back into a module already on the
//! stack.

use agora_runtime::{decode_state, encode_state, Context, Module};
use agora_types::{Address, GovernanceError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NullRelay {
    target: Address,
    forwarded: u64,
}

impl NullRelay {
    pub fn new(target: Address) -> Self {
        Self {
            target,
            forwarded: 0,
        }
    }

    /// How many operations were forwarded successfully.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }
}

impl Module for NullRelay {
    fn kind(&self) -> &'static str {
        "NullRelay"
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
        self.forwarded += 1;
        ctx.dispatch(&self.target, operation, payload)
    }

    fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        encode_state(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
        *self = decode_state(data)?;
        Ok(())
    }
}
