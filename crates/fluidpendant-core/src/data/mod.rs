//! Data models for the controller snapshot
//!
//! This module provides:
//! - Machine mode as reported by the controller (plus the local `Disconnected` mode)
//! - Six-axis position storage with last-known-good partial updates
//! - Limit and probe switch states
//! - Override percentages, feed/speed, and job progress
//! - Parser modal state, probe results, and firmware banner

pub mod modes;

pub use modes::GcodeModes;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of axes a controller can report
pub const MAX_AXES: usize = 6;

/// Axis letters in report order
pub const AXIS_LETTERS: [char; MAX_AXES] = ['X', 'Y', 'Z', 'A', 'B', 'C'];

/// Machine mode as reported in the first field of a status report
///
/// `Idle` is numerically zero and is the mode before first contact.
/// `Disconnected` is never sent by the controller; only the liveness
/// tracking enters and leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum MachineMode {
    /// Idle, ready for commands
    #[default]
    Idle = 0,
    /// In alarm state; g-code locked out, settings accessible
    Alarm,
    /// G-code check mode
    CheckMode,
    /// Performing a homing cycle
    Homing,
    /// A program or motion is executing
    Cycle,
    /// Feed hold is active
    Hold,
    /// Jogging
    Jog,
    /// Safety door is ajar
    SafetyDoor,
    /// Sleep state
    Sleep,
    /// Configuration is invalid; only config edits are possible
    ConfigAlarm,
    /// Only a reset can recover
    Critical,
    /// The controller cannot be heard
    Disconnected,
}

impl MachineMode {
    /// Map a status report mode name to a mode.
    ///
    /// The lookup is exact on the base name; a `:n` sub-state suffix
    /// (`Hold:0`, `Door:1`) must be split off by the caller.
    pub fn from_report_name(name: &str) -> Option<Self> {
        let mode = match name {
            "Idle" => Self::Idle,
            "Alarm" => Self::Alarm,
            "Check" => Self::CheckMode,
            "Home" => Self::Homing,
            "Run" => Self::Cycle,
            "Hold" => Self::Hold,
            "Jog" => Self::Jog,
            "Door" => Self::SafetyDoor,
            "Sleep" => Self::Sleep,
            "ConfigAlarm" => Self::ConfigAlarm,
            "Critical" => Self::Critical,
            _ => return None,
        };
        Some(mode)
    }

    /// Short label shown on pendant displays
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Alarm => "Alarm",
            Self::CheckMode => "Check",
            Self::Homing => "Homing",
            Self::Cycle => "Run",
            Self::Hold => "Hold",
            Self::Jog => "Jog",
            Self::SafetyDoor => "Door",
            Self::Sleep => "Sleep",
            Self::ConfigAlarm => "ConfigAlarm",
            Self::Critical => "Critical",
            Self::Disconnected => "N/C",
        }
    }

    /// Check if the machine is moving under its own control
    pub fn is_moving(&self) -> bool {
        matches!(self, Self::Cycle | Self::Jog | Self::Homing)
    }

    /// Check if the mode locks out motion until the operator intervenes
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Alarm | Self::ConfigAlarm | Self::Critical)
    }

    /// Check if this is the locally synthesized link-lost mode
    pub fn is_disconnected(&self) -> bool {
        *self == Self::Disconnected
    }
}

impl fmt::Display for MachineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Per-axis values in fixed X, Y, Z, A, B, C order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisPosition {
    values: [f64; MAX_AXES],
}

impl AxisPosition {
    /// Create a position with all axes at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a position from leading axis values; missing axes are zero
    pub fn from_slice(values: &[f64]) -> Self {
        let mut pos = Self::new();
        pos.apply(values, MAX_AXES);
        pos
    }

    /// Get one axis value
    pub fn get(&self, axis: usize) -> Option<f64> {
        self.values.get(axis).copied()
    }

    /// All six values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Overwrite the leading axes with `values`, up to `axis_count`.
    ///
    /// Axes beyond the supplied values keep their last-known value.
    /// Returns the number of axes written.
    pub fn apply(&mut self, values: &[f64], axis_count: usize) -> usize {
        let n = values.len().min(axis_count).min(MAX_AXES);
        self.values[..n].copy_from_slice(&values[..n]);
        n
    }

    /// Set a single axis
    pub fn set(&mut self, axis: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(axis) {
            *slot = value;
        }
    }
}

/// Limit switch per axis plus the probe input
///
/// Decoded from the `Pn` field. A report without `Pn` means nothing is asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchBank {
    limits: [bool; MAX_AXES],
    probe: bool,
}

impl SwitchBank {
    /// No switches asserted
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the letters of a `Pn` field. Letters outside `XYZABCP` are ignored.
    pub fn from_pin_letters(letters: &str) -> Self {
        let mut bank = Self::new();
        for c in letters.chars() {
            if c == 'P' {
                bank.probe = true;
            } else if let Some(axis) = AXIS_LETTERS.iter().position(|&a| a == c) {
                bank.limits[axis] = true;
            }
        }
        bank
    }

    /// Limit switch state for an axis
    pub fn limit(&self, axis: usize) -> bool {
        self.limits.get(axis).copied().unwrap_or(false)
    }

    /// Probe switch state
    pub fn probe(&self) -> bool {
        self.probe
    }

    /// Check if any switch is asserted
    pub fn any_active(&self) -> bool {
        self.probe || self.limits.iter().any(|&l| l)
    }
}

/// Override percentages (Feed, Rapid, Spindle)
///
/// Values are stored as reported, without range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverridePercent {
    /// Feed override percentage
    pub feed: u32,
    /// Rapid override percentage
    pub rapid: u32,
    /// Spindle or laser power override percentage
    pub spindle: u32,
}

impl Default for OverridePercent {
    fn default() -> Self {
        Self {
            feed: 100,
            rapid: 100,
            spindle: 100,
        }
    }
}

/// Current feed rate and spindle speed from the `FS` field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedSpeed {
    /// Feed rate (units/min)
    pub feed: f64,
    /// Spindle speed
    pub speed: f64,
}

/// Planner and serial receive buffer availability from the `Bf` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferState {
    /// Free planner blocks
    pub planner_blocks: u32,
    /// Free receive buffer bytes
    pub rx_bytes: u32,
}

/// Job progress from the `SD` field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobProgress {
    /// File being run; empty when no job is loaded
    pub filename: String,
    /// Completion percentage, 0..=100
    pub percent: f32,
}

impl JobProgress {
    /// Check if a job is loaded
    pub fn is_active(&self) -> bool {
        !self.filename.is_empty()
    }
}

/// Result of a probing cycle from a `[PRB:...]` report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Machine position where the probe stopped
    pub position: AxisPosition,
    /// Whether the probe made contact
    pub success: bool,
}

/// Firmware identification from the boot banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Firmware family ("Grbl" or "FluidNC")
    pub firmware: String,
    /// Version string as printed
    pub version: String,
}

/// `[MSG:...]` message split into level and body, with the line as received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoMessage {
    /// Level tag such as `INFO`, `WARN`, `INI`; `None` for untagged messages
    pub level: Option<String>,
    /// Message text
    pub body: String,
    /// Whole line as received, brackets included
    pub raw: String,
}
