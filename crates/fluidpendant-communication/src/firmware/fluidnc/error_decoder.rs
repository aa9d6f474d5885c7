//! FluidNC Error and Alarm Code Decoder
//! Converts numeric error and alarm codes to human-readable messages

/// Decode a FluidNC error number to a human-readable message
pub fn describe_error(code: u32) -> &'static str {
    match code {
        0 => "No error",
        1 => "Expected GCode command letter",
        2 => "Bad GCode number format",
        3 => "Invalid $ statement",
        4 => "Negative value",
        5 => "Setting disabled",
        6 => "Step pulse too short",
        7 => "Failed to read settings",
        8 => "Command requires idle state",
        9 => "GCode cannot be executed in lock or alarm state",
        10 => "Soft limit error",
        11 => "Line too long",
        12 => "Max step rate exceeded",
        13 => "Check door",
        14 => "Startup line too long",
        15 => "Max travel exceeded during jog",
        16 => "Invalid jog command",
        17 => "Laser mode requires PWM output",
        18 => "No Homing/Cycle defined in settings",
        19 => "Single axis homing not allowed",
        20 => "Unsupported GCode command",
        21 => "Gcode modal group violation",
        22 => "Gcode undefined feed rate",
        23 => "Gcode command value not integer",
        24 => "Gcode axis command conflict",
        25 => "Gcode word repeated",
        26 => "Gcode no axis words",
        27 => "Gcode invalid line number",
        28 => "Gcode value word missing",
        29 => "Gcode unsupported coordinate system",
        30 => "Gcode G53 invalid motion mode",
        31 => "Gcode extra axis words",
        32 => "Gcode no axis words in plane",
        33 => "Gcode invalid target",
        34 => "Gcode arc radius error",
        35 => "Gcode no offsets in plane",
        36 => "Gcode unused words",
        37 => "Gcode G43 dynamic axis error",
        38 => "Gcode max value exceeded",
        39 => "P param max exceeded",
        40 => "Check control pins",
        60 => "Failed to mount device",
        61 => "Failed to read",
        62 => "Failed to open directory",
        63 => "Directory not found",
        64 => "File empty",
        65 => "File not found",
        66 => "Failed to open file",
        67 => "Device is busy",
        68 => "Failed to delete directory",
        69 => "Failed to delete file",
        70 => "Bluetooth failed to start",
        71 => "WiFi failed to start",
        80 => "Number out of range for setting",
        81 => "Invalid value for setting",
        82 => "Failed to create file",
        83 => "Failed to format filesystem",
        90 => "Failed to send message",
        100 => "Failed to store setting",
        101 => "Failed to get setting status",
        110 => "Authentication failed",
        111 => "End of line",
        112 => "End of file",
        113 => "System reset",
        114 => "No data",
        120 => "Another interface is busy",
        130 => "Jog cancelled",
        150 => "Bad pin specification",
        151 => "Bad runtime config setting",
        152 => "Configuration is invalid, check boot messages",
        160 => "File upload failed",
        161 => "File download failed",
        162 => "Read-only setting",
        _ => "Unknown error",
    }
}

/// Decode a FluidNC alarm number to a human-readable message
pub fn describe_alarm(code: u32) -> &'static str {
    match code {
        1 => "Hard limit triggered",
        2 => "Soft limit exceeded",
        3 => "Abort during cycle",
        4 => "Probe fail: probe not in expected initial state",
        5 => "Probe fail: no contact within travel",
        6 => "Homing fail: reset during homing",
        7 => "Homing fail: door opened during homing",
        8 => "Homing fail: could not clear limit switch on pulloff",
        9 => "Homing fail: limit switch not found",
        10 => "Spindle control failure",
        11 => "Control pin initially on",
        12 => "Ambiguous limit switch",
        13 => "Hard stop",
        14 => "Machine not homed",
        15 => "Initialization failure",
        _ => "Unknown alarm",
    }
}

/// Format an error for display, e.g. `error:9 (GCode cannot be executed ...)`
pub fn format_error(code: u32) -> String {
    format!("error:{} ({})", code, describe_error(code))
}

/// Format an alarm for display, e.g. `ALARM:1 (Hard limit triggered)`
pub fn format_alarm(code: u32) -> String {
    format!("ALARM:{} ({})", code, describe_alarm(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(describe_error(9), "GCode cannot be executed in lock or alarm state");
        assert_eq!(describe_alarm(1), "Hard limit triggered");
        assert_eq!(format_error(20), "error:20 (Unsupported GCode command)");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(describe_error(999), "Unknown error");
        assert_eq!(format_alarm(99), "ALARM:99 (Unknown alarm)");
    }
}
