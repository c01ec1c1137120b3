//! Shared utilities for the Agora workspace.

pub mod logging;

pub use logging::{init_logging, LogFormat};
