//! Nullable inert module: deployable, but without a dispatch entry point.

use agora_runtime::{decode_state, encode_state, Module};
use agora_types::GovernanceError;
use serde::{Deserialize, Serialize};

/// A module that only has direct methods. Governance cannot install it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NullInert {
    value: u64,
}

impl NullInert {
    pub fn store(&mut self, value: u64) {
        self.value = value;
    }

    pub fn retrieve(&self) -> u64 {
        self.value
    }
}

impl Module for NullInert {
    fn kind(&self) -> &'static str {
        "NullInert"
    }

    fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        encode_state(self)
    }

    fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError> {
        *self = decode_state(data)?;
        Ok(())
    }
}
