//! The module capability contract.

use crate::host::Context;
use agora_types::GovernanceError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::Any;

/// Upcast to [`Any`] so the host can hand out concretely typed borrows.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A unit of functionality deployed into a [`Host`](crate::Host).
pub trait Module: AsAny {
    /// Short human-readable kind, used in logs and error messages.
    fn kind(&self) -> &'static str;

    /// Whether this module exposes the generic dispatch entry point.
    fn is_executable(&self) -> bool {
        false
    }

    /// Generic dispatch entry point.
    ///
    /// Implementations check `ctx.caller()` against their bound proposal
    /// engine, then route `operation` to a typed handler. Unknown operations
    /// fail with [`GovernanceError::OperationNotFound`].
    fn execute(
        &mut self,
        ctx: &Context<'_>,
        operation: &str,
        payload: &[u8],
    ) -> Result<(), GovernanceError> {
        let _ = (operation, payload);
        Err(GovernanceError::IncompatibleModule(*ctx.this()))
    }

    /// Serialize the full module state for transaction rollback.
    fn save_state(&self) -> Result<Vec<u8>, GovernanceError>;

    /// Replace the module state with a previously saved snapshot.
    fn load_state(&mut self, data: &[u8]) -> Result<(), GovernanceError>;
}

/// A typed operation a module accepts through generic dispatch.
///
/// Each governed module defines one enum of these: the variant picks the
/// handler, its fields are the decoded payload.
pub trait Operation: Sized {
    /// The operation name carried by proposals.
    fn name(&self) -> &'static str;

    /// The encoded argument payload.
    fn payload(&self) -> Result<Vec<u8>, GovernanceError>;

    /// Decode `operation` and its payload. Unknown names fail with
    /// `OperationNotFound`, malformed payloads with `InvalidPayload`.
    fn decode(operation: &str, payload: &[u8]) -> Result<Self, GovernanceError>;
}

/// The error for an operation name a module does not recognize.
pub fn operation_not_found(module: &'static str, operation: &str) -> GovernanceError {
    GovernanceError::OperationNotFound {
        module,
        operation: operation.to_string(),
    }
}

/// Encode a module's state with bincode.
pub fn encode_state<T: Serialize>(state: &T) -> Result<Vec<u8>, GovernanceError> {
    Ok(bincode::serialize(state)?)
}

/// Decode a module's state with bincode.
pub fn decode_state<T: DeserializeOwned>(data: &[u8]) -> Result<T, GovernanceError> {
    Ok(bincode::deserialize(data)?)
}
