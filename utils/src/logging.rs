//! Structured logging initialisation.
//!
//! Two output formats are supported:
//! - [`LogFormat::Human`] for local development.
//! - [`LogFormat::Json`] for newline-delimited JSON.
//!
//! `RUST_LOG` overrides the caller-supplied `level` when set
//! (e.g. `"info"`, `"debug,agora_governance=trace"`).

use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Selects the output format for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Install the global tracing subscriber.
///
/// Fails if a global subscriber is already set, so tests and embedding
/// applications can call it more than once without panicking.
pub fn init_logging(format: LogFormat, level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    }
}
