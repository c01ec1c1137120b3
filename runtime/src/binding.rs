//! One-time wiring cells.
//!
//! The four governance components reference each other but are deployed
//! independently. Each reference starts `Unwired` and is set exactly once.

use agora_types::GovernanceError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding<T> {
    Unwired,
    Wired(T),
}

impl<T> Binding<T> {
    /// Wire the binding. Fails with `AlreadySet(what)` on a second call.
    pub fn bind(&mut self, value: T, what: &'static str) -> Result<(), GovernanceError> {
        if self.is_wired() {
            return Err(GovernanceError::AlreadySet(what));
        }
        *self = Self::Wired(value);
        Ok(())
    }

    /// The wired value, or `NotWired(what)`.
    pub fn get(&self, what: &'static str) -> Result<&T, GovernanceError> {
        match self {
            Self::Wired(value) => Ok(value),
            Self::Unwired => Err(GovernanceError::NotWired(what)),
        }
    }

    pub fn is_wired(&self) -> bool {
        matches!(self, Self::Wired(_))
    }
}

impl<T> Default for Binding<T> {
    fn default() -> Self {
        Self::Unwired
    }
}
