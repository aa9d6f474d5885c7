//! FluidPendant Settings Crate
//!
//! Handles the configuration file: connection and protocol link settings.

pub mod config;
pub mod error;

pub use config::{Config, ConnectionSettings, LinkSettings, AUTO_PORT};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
