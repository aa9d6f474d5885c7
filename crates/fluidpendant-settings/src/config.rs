//! Configuration management for FluidPendant
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML files; the default location is under the platform config directory.
//!
//! Configuration is organized into sections:
//! - Connection settings (port, baud rate)
//! - Link settings (timeouts, liveness, buffer limits, polling)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Port name meaning "first CNC-looking port found"
pub const AUTO_PORT: &str = "Auto";

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port, or "Auto"
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
}

impl ConnectionSettings {
    /// Check if the port should be picked automatically
    pub fn is_auto_port(&self) -> bool {
        self.port.is_empty() || self.port.eq_ignore_ascii_case(AUTO_PORT)
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: AUTO_PORT.to_string(),
            baud_rate: 115200,
        }
    }
}

/// Protocol link settings, durations in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Silence before the link counts as lost
    pub disconnect_threshold_ms: u64,
    /// Default line command timeout
    pub line_timeout_ms: u64,
    /// How long a received alarm/error stays fresh
    pub fault_display_ms: u64,
    /// Inbound line cap in bytes
    pub max_line_len: usize,
    /// Outbound line cap in bytes
    pub max_command_len: usize,
    /// Axes tracked (1..=6)
    pub axis_count: usize,
    /// Status request cadence; 0 disables polling
    pub status_poll_ms: u64,
    /// Queue lines while one is outstanding instead of rejecting them
    pub queue_lines: bool,
    /// Maximum queued engine events
    pub event_capacity: usize,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            disconnect_threshold_ms: 4000,
            line_timeout_ms: 2000,
            fault_display_ms: 1000,
            max_line_len: 256,
            max_command_len: 255,
            axis_count: 3,
            status_poll_ms: 250,
            queue_lines: false,
            event_capacity: 256,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Link settings
    pub link: LinkSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file path: `<config dir>/fluidpendant/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::UnsupportedPlatform("no user config directory".to_string())
        })?;
        Ok(dir.join("fluidpendant").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(e.to_string()))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.connection.baud_rate == 0 {
            return Err(invalid("connection.baud_rate", "must be > 0"));
        }

        let link = &self.link;
        if link.disconnect_threshold_ms == 0 {
            return Err(invalid("link.disconnect_threshold_ms", "must be > 0"));
        }
        if link.line_timeout_ms == 0 {
            return Err(invalid("link.line_timeout_ms", "must be > 0"));
        }
        if link.max_line_len < 16 {
            return Err(out_of_range("link.max_line_len", link.max_line_len));
        }
        if link.max_command_len == 0 {
            return Err(out_of_range("link.max_command_len", link.max_command_len));
        }
        if !(1..=6).contains(&link.axis_count) {
            return Err(out_of_range("link.axis_count", link.axis_count));
        }
        if link.event_capacity == 0 {
            return Err(out_of_range("link.event_capacity", link.event_capacity));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> SettingsError {
    SettingsError::InvalidSetting {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn out_of_range(key: &str, value: usize) -> SettingsError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert!(config.connection.is_auto_port());
        assert_eq!(config.link.disconnect_threshold_ms, 4000);
        assert_eq!(config.link.line_timeout_ms, 2000);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::new();
        config.link.axis_count = 7;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));

        let mut config = Config::new();
        config.connection.baud_rate = 0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[connection]\nport = \"/dev/ttyACM0\"\n").unwrap();
        assert_eq!(config.connection.port, "/dev/ttyACM0");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.link, LinkSettings::default());
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            format_of(Path::new("config.yaml")),
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }
}
