//! Principal addresses.
//!
//! Members and modules share one address space: a module calling another
//! module is identified by its own address, exactly like an external caller.

use blake2::digest::consts::U20;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b160 = Blake2b<U20>;

/// A 20-byte principal address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive the address of the `nonce`-th module deployed by `deployer`.
    ///
    /// Blake2b-160 over the deployer bytes followed by the little-endian nonce.
    pub fn derive(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = Blake2b160::new();
        hasher.update(deployer.0);
        hasher.update(nonce.to_le_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

// Lowercase hex, no prefix.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
