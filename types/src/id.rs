//! Sequential identifiers.
//!
//! Ids are handed out from a monotonically increasing counter and are never
//! reused, even after the entity they named is removed.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! sequential_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// The id following this one.
            pub const fn next(&self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

sequential_id!(
    /// Identifier of a member in the member registry.
    MemberId
);

sequential_id!(
    /// Identifier of a proposal, starting at 0.
    ProposalId
);

sequential_id!(
    /// Identifier of an entry in the module catalog. 0, 1 and 2 are the
    /// preinstalled governance components.
    ApplicationId
);
