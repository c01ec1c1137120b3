//! Hosting environment for governed modules.
//!
//! Every component and plugin is a [`Module`] living at an [`Address`] inside a
//! [`Host`]. State-changing calls enter through [`Host::transact`], which runs
//! them to completion and rolls every module back if the call fails. Inside a
//! call, modules see a [`Context`] carrying the caller identity; it lets them
//! read other modules and dispatch `execute(operation, payload)` into them.
//!
//! Components that reference each other are deployed unwired and connected
//! afterwards through one-time [`Binding`]s.
//!
//! [`Address`]: agora_types::Address

pub mod binding;
pub mod host;
pub mod module;

pub use binding::Binding;
pub use host::{Context, Host};
pub use module::{decode_state, encode_state, operation_not_found, AsAny, Module, Operation};
