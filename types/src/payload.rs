//! Dispatch payload codec.
//!
//! Payloads are opaque to the proposal engine. Modules that understand them
//! encode and decode with bincode.

use crate::error::GovernanceError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a payload value.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GovernanceError> {
    Ok(bincode::serialize(value)?)
}

/// Decode the payload of `operation`.
pub fn decode<T: DeserializeOwned>(
    operation: &str,
    payload: &[u8],
) -> Result<T, GovernanceError> {
    bincode::deserialize(payload).map_err(|e| GovernanceError::InvalidPayload {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}
