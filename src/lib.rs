//! # FluidPendant
//!
//! A protocol engine for pendant front-ends talking to FluidNC (and Grbl)
//! CNC controllers over a serial link:
//! - Line framing and status report decoding
//! - A machine state model for displays to read
//! - Realtime and line command sending with single-outstanding-line tracking
//! - Link liveness tracking
//!
//! ## Architecture
//!
//! FluidPendant is organized as a workspace with multiple crates:
//!
//! 1. **fluidpendant-core** - Machine model, events, errors
//! 2. **fluidpendant-communication** - Transports, decoding, link writer, engine
//! 3. **fluidpendant-settings** - Configuration files
//! 4. **fluidpendant** - Glue and the headless `fluidpendant` host binary

pub use fluidpendant_communication::{
    command_creator, describe_alarm, describe_error, list_ports, EngineConfig, FluidResponse,
    LineFramer, MemoryTransport, PendantEngine, RealtimeCommand, SendOptions, SendPolicy,
    SerialPortInfo, SerialTransport, StatusReport, Transport,
};

pub use fluidpendant_core::{
    CommandError, CommandOutcome, CommandResult, CommandTicket, CompletionSink, ConnectionError,
    EngineEvent, Error, MachineMode, MachineModel, MachineSnapshot, Result,
};

pub use fluidpendant_settings::{Config, ConnectionSettings, LinkSettings, SettingsError};

use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Log lines go to stderr so stdout stays free for state output.
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Build the engine configuration from the link section of a config file
pub fn engine_config(config: &Config) -> EngineConfig {
    let link = &config.link;
    EngineConfig {
        disconnect_threshold: Duration::from_millis(link.disconnect_threshold_ms),
        default_line_timeout: Duration::from_millis(link.line_timeout_ms),
        fault_display_window: Duration::from_millis(link.fault_display_ms),
        max_line_len: link.max_line_len,
        max_command_len: link.max_command_len,
        axis_count: link.axis_count,
        status_poll_interval: (link.status_poll_ms > 0)
            .then(|| Duration::from_millis(link.status_poll_ms)),
        default_policy: if link.queue_lines {
            SendPolicy::Queue
        } else {
            SendPolicy::RejectIfBusy
        },
        event_capacity: link.event_capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_engine_defaults() {
        assert_eq!(engine_config(&Config::default()), EngineConfig::default());
    }

    #[test]
    fn test_polling_and_policy_mapping() {
        let mut config = Config::default();
        config.link.status_poll_ms = 0;
        config.link.queue_lines = true;
        let engine = engine_config(&config);
        assert_eq!(engine.status_poll_interval, None);
        assert_eq!(engine.default_policy, SendPolicy::Queue);
    }
}
