//! FluidNC Command Creator
//!
//! Builds and validates line commands: `$` system commands, jogs and
//! probe cycles in the compact form pendants send.

use fluidpendant_core::{CommandError, AXIS_LETTERS};

/// Check a line command before it is queued or written.
///
/// The line must be non-empty, printable ASCII without terminators, and no
/// longer than `max_len` bytes. The `\n` added on the wire is not counted.
pub fn validate_line(line: &str, max_len: usize) -> Result<(), CommandError> {
    if line.trim().is_empty() {
        return Err(CommandError::EmptyLine);
    }
    if line.contains(['\n', '\r']) {
        return Err(CommandError::EmbeddedNewline);
    }
    if !line.bytes().all(|b| b.is_ascii_graphic() || b == b' ' || b == b'\t') {
        return Err(CommandError::NonAscii);
    }
    if line.len() > max_len {
        return Err(CommandError::LineTooLong {
            len: line.len(),
            max: max_len,
        });
    }
    Ok(())
}

/// Format a number with a fixed count of decimals.
///
/// Negative zero prints without its sign.
pub fn format_number(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Axis letter for an axis index, `None` beyond the sixth axis
pub fn axis_letter(axis: usize) -> Option<char> {
    AXIS_LETTERS.get(axis).copied()
}

/// Home all axes
pub fn home() -> String {
    "$H".to_string()
}

/// Home a single axis
pub fn home_axis(axis: usize) -> Option<String> {
    axis_letter(axis).map(|letter| format!("$H{}", letter))
}

/// Clear an alarm lock
pub fn unlock() -> String {
    "$X".to_string()
}

/// Request a `[GC:...]` parser state report
pub fn modes_query() -> String {
    "$G".to_string()
}

/// Request build info
pub fn build_info() -> String {
    "$I".to_string()
}

/// Incremental jog of one axis, e.g. `$J=G91F1000Z+20`
///
/// Returns `None` for an unknown axis.
pub fn jog(axis: usize, distance: f64, feed: f64) -> Option<String> {
    let letter = axis_letter(axis)?;
    let sign = if distance < 0.0 { "" } else { "+" };
    Some(format!(
        "$J=G91F{}{}{}{}",
        format_number(feed, 0),
        letter,
        sign,
        format_jog_distance(distance)
    ))
}

/// Probe toward a workpiece, e.g. `G38.2G91F80Z-20P8.00`
///
/// `travel` is signed; `offset` is the probe plate thickness.
pub fn probe(axis: usize, travel: f64, rate: f64, offset: f64) -> Option<String> {
    let letter = axis_letter(axis)?;
    Some(format!(
        "G38.2G91F{}{}{}P{}",
        format_number(rate, 0),
        letter,
        format_number(travel, 0),
        format_number(offset, 2)
    ))
}

// Whole-number jogs keep the short form; fractional steps keep 3 decimals.
fn format_jog_distance(distance: f64) -> String {
    if distance.fract() == 0.0 {
        format_number(distance, 0)
    } else {
        format_number(distance, 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_line() {
        assert!(validate_line("G0 X10", 255).is_ok());
        assert_eq!(validate_line("   ", 255), Err(CommandError::EmptyLine));
        assert_eq!(validate_line("G0\nX1", 255), Err(CommandError::EmbeddedNewline));
        assert_eq!(validate_line("G0 X1\r", 255), Err(CommandError::EmbeddedNewline));
        assert_eq!(validate_line("G0 Xé", 255), Err(CommandError::NonAscii));
        assert_eq!(
            validate_line("G0 X10", 4),
            Err(CommandError::LineTooLong { len: 6, max: 4 })
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0, 2), "8.00");
        assert_eq!(format_number(-20.0, 0), "-20");
        assert_eq!(format_number(1.2344, 3), "1.234");
        assert_eq!(format_number(-0.0001, 2), "0.00");
    }

    #[test]
    fn test_system_commands() {
        assert_eq!(home(), "$H");
        assert_eq!(home_axis(2).as_deref(), Some("$HZ"));
        assert_eq!(home_axis(6), None);
        assert_eq!(unlock(), "$X");
        assert_eq!(modes_query(), "$G");
        assert_eq!(build_info(), "$I");
    }

    #[test]
    fn test_jog() {
        assert_eq!(jog(2, 20.0, 1000.0).as_deref(), Some("$J=G91F1000Z+20"));
        assert_eq!(jog(0, -0.1, 500.0).as_deref(), Some("$J=G91F500X-0.100"));
        assert_eq!(jog(9, 1.0, 100.0), None);
    }

    #[test]
    fn test_probe() {
        assert_eq!(
            probe(2, -20.0, 80.0, 8.0).as_deref(),
            Some("G38.2G91F80Z-20P8.00")
        );
    }
}
