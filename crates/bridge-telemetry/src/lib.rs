//! # Bridge Telemetry
//!
//! Structured logging for the bridge core and its host.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_tracing(&config).expect("Failed to init telemetry");
//!
//!     // Application code here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BRIDGE_SERVICE_NAME` | `bridge-core` | Service name in log lines |
//! | `BRIDGE_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `BRIDGE_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `BRIDGE_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::{init_tracing, TracingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
