//! FluidNC realtime commands
//!
//! Single control bytes the controller acts on as soon as they arrive,
//! ahead of anything in its line buffer. They are never acknowledged.

use std::fmt;

/// Realtime command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealtimeCommand {
    /// Request a status report
    StatusReport,
    /// Cycle start / resume
    CycleStart,
    /// Feed hold (pause)
    FeedHold,
    /// Soft reset
    Reset,
    /// Safety door
    SafetyDoor,
    /// Cancel an active jog
    JogCancel,
    /// Debug report
    DebugReport,
    /// Run macro 0..=3
    Macro(u8),
    /// Feed override: reset to 100%
    FeedOverrideReset,
    /// Feed override: +10%
    FeedOverrideCoarsePlus,
    /// Feed override: -10%
    FeedOverrideCoarseMinus,
    /// Feed override: +1%
    FeedOverrideFinePlus,
    /// Feed override: -1%
    FeedOverrideFineMinus,
    /// Rapid override: 100%
    RapidOverrideReset,
    /// Rapid override: 50%
    RapidOverrideMedium,
    /// Rapid override: 25%
    RapidOverrideLow,
    /// Spindle override: reset to 100%
    SpindleOverrideReset,
    /// Spindle override: +10%
    SpindleOverrideCoarsePlus,
    /// Spindle override: -10%
    SpindleOverrideCoarseMinus,
    /// Spindle override: +1%
    SpindleOverrideFinePlus,
    /// Spindle override: -1%
    SpindleOverrideFineMinus,
    /// Toggle spindle stop during hold
    SpindleStop,
    /// Toggle flood coolant
    FloodToggle,
    /// Toggle mist coolant
    MistToggle,
}

impl RealtimeCommand {
    /// Get the byte representation
    ///
    /// Macro numbers above 3 are clamped to macro 3.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::StatusReport => b'?',
            Self::CycleStart => b'~',
            Self::FeedHold => b'!',
            Self::Reset => 0x18,
            Self::SafetyDoor => 0x84,
            Self::JogCancel => 0x85,
            Self::DebugReport => 0x86,
            Self::Macro(n) => 0x87 + (*n).min(3),
            Self::FeedOverrideReset => 0x90,
            Self::FeedOverrideCoarsePlus => 0x91,
            Self::FeedOverrideCoarseMinus => 0x92,
            Self::FeedOverrideFinePlus => 0x93,
            Self::FeedOverrideFineMinus => 0x94,
            Self::RapidOverrideReset => 0x95,
            Self::RapidOverrideMedium => 0x96,
            Self::RapidOverrideLow => 0x97,
            Self::SpindleOverrideReset => 0x99,
            Self::SpindleOverrideCoarsePlus => 0x9A,
            Self::SpindleOverrideCoarseMinus => 0x9B,
            Self::SpindleOverrideFinePlus => 0x9C,
            Self::SpindleOverrideFineMinus => 0x9D,
            Self::SpindleStop => 0x9E,
            Self::FloodToggle => 0xA0,
            Self::MistToggle => 0xA1,
        }
    }

    /// Look up a command from its byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'?' => Self::StatusReport,
            b'~' => Self::CycleStart,
            b'!' => Self::FeedHold,
            0x18 => Self::Reset,
            0x84 => Self::SafetyDoor,
            0x85 => Self::JogCancel,
            0x86 => Self::DebugReport,
            0x87..=0x8A => Self::Macro(byte - 0x87),
            0x90 => Self::FeedOverrideReset,
            0x91 => Self::FeedOverrideCoarsePlus,
            0x92 => Self::FeedOverrideCoarseMinus,
            0x93 => Self::FeedOverrideFinePlus,
            0x94 => Self::FeedOverrideFineMinus,
            0x95 => Self::RapidOverrideReset,
            0x96 => Self::RapidOverrideMedium,
            0x97 => Self::RapidOverrideLow,
            0x99 => Self::SpindleOverrideReset,
            0x9A => Self::SpindleOverrideCoarsePlus,
            0x9B => Self::SpindleOverrideCoarseMinus,
            0x9C => Self::SpindleOverrideFinePlus,
            0x9D => Self::SpindleOverrideFineMinus,
            0x9E => Self::SpindleStop,
            0xA0 => Self::FloodToggle,
            0xA1 => Self::MistToggle,
            _ => return None,
        })
    }

    /// Check if sending this command abandons outstanding line commands
    pub fn abandons_lines(&self) -> bool {
        matches!(self, Self::Reset)
    }
}

impl fmt::Display for RealtimeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Macro(n) => write!(f, "Macro{}", n),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_bytes() {
        assert_eq!(RealtimeCommand::StatusReport.as_byte(), b'?');
        assert_eq!(RealtimeCommand::FeedHold.as_byte(), b'!');
        assert_eq!(RealtimeCommand::CycleStart.as_byte(), b'~');
        assert_eq!(RealtimeCommand::Reset.as_byte(), 0x18);
        assert_eq!(RealtimeCommand::JogCancel.as_byte(), 0x85);
        assert_eq!(RealtimeCommand::Macro(2).as_byte(), 0x89);
        assert_eq!(RealtimeCommand::Macro(9).as_byte(), 0x8A);
    }

    #[test]
    fn test_byte_lookup_matches() {
        for byte in 0u8..=255 {
            if let Some(cmd) = RealtimeCommand::from_byte(byte) {
                assert_eq!(cmd.as_byte(), byte);
            }
        }
        assert_eq!(RealtimeCommand::from_byte(b'G'), None);
    }

    #[test]
    fn test_only_reset_abandons() {
        assert!(RealtimeCommand::Reset.abandons_lines());
        assert!(!RealtimeCommand::FeedHold.abandons_lines());
        assert!(!RealtimeCommand::JogCancel.abandons_lines());
    }
}
