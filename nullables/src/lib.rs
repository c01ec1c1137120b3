//! Nullable modules for deterministic testing.
//!
//! Small, fully in-memory modules that exercise the host and the governance
//! components from the outside:
//! - [`NullStorage`] implements dispatch and holds one number.
//! - [`NullInert`] has no dispatch entry point.
//! - [`NullRelay`] forwards whatever it receives to another module.

pub mod inert;
pub mod relay;
pub mod storage;

pub use inert::NullInert;
pub use relay::NullRelay;
pub use storage::{NullStorage, StorageOperation, NULL_STORAGE};
