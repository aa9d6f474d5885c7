//! FluidNC Status Report Parsing
//!
//! Parses realtime status reports of the form
//! `<Mode|Key:value[,value...]|...>` into per-field fragments.
//!
//! Each field decodes on its own. A field whose value does not parse is
//! skipped and the rest of the report still decodes; unknown keys are
//! ignored. Numbers follow plain decimal notation only: an optional sign,
//! digits, and an optional fractional part with at least one digit. A value
//! cut off mid-number (`2.`, `-`, empty) makes its whole field absent.

use fluidpendant_core::{
    BufferState, FeedSpeed, MachineMode, OverridePercent, SwitchBank,
};
use serde::{Deserialize, Serialize};

/// Job progress from the `SD:<percent>,<filename>` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdProgress {
    /// Completion percentage
    pub percent: f32,
    /// File being run
    pub filename: String,
}

/// Parsed status report; `None` fields were absent or malformed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatusReport {
    /// Mode name as sent, including any sub-state suffix
    pub mode_name: String,
    /// Mode from the exact-match table; `None` if the name is unknown
    pub mode: Option<MachineMode>,
    /// Sub-state number from `Hold:n` or `Door:n`
    pub substate: Option<u8>,
    /// Machine position
    pub mpos: Option<Vec<f64>>,
    /// Work position
    pub wpos: Option<Vec<f64>>,
    /// Work coordinate offset
    pub wco: Option<Vec<f64>>,
    /// Overrides
    pub overrides: Option<OverridePercent>,
    /// Asserted limit/probe pins
    pub pins: Option<SwitchBank>,
    /// Feed and speed
    pub feed_speed: Option<FeedSpeed>,
    /// Planner/receive buffer availability
    pub buffer: Option<BufferState>,
    /// Executing line number
    pub line_number: Option<u32>,
    /// Job progress
    pub sd: Option<SdProgress>,
    /// Accessory flags (spindle, flood, mist)
    pub accessories: Option<String>,
}

impl StatusReport {
    /// Parse a complete status report line.
    ///
    /// Returns `None` unless the line starts with `<` and ends with `>`.
    pub fn parse(line: &str) -> Option<Self> {
        let body = line.strip_prefix('<')?.strip_suffix('>')?;
        let mut fields = body.split('|');

        let mut report = StatusReport::default();
        let mode_name = fields.next().unwrap_or("");
        report.mode_name = mode_name.to_string();
        let (base, sub) = match mode_name.split_once(':') {
            Some((base, sub)) => (base, parse_uint(sub).and_then(|n| u8::try_from(n).ok())),
            None => (mode_name, None),
        };
        report.mode = MachineMode::from_report_name(base);
        report.substate = sub;
        if report.mode.is_none() {
            tracing::debug!("Unknown mode name '{}' in status report", mode_name);
        }

        for field in fields {
            let Some((key, value)) = field.split_once(':') else {
                tracing::trace!("Status field without ':' ignored: {}", field);
                continue;
            };
            let parsed = match key {
                "MPos" => parse_values(value).map(|v| report.mpos = Some(v)),
                "WPos" => parse_values(value).map(|v| report.wpos = Some(v)),
                "WCO" => parse_values(value).map(|v| report.wco = Some(v)),
                "Ov" => parse_overrides(value).map(|v| report.overrides = Some(v)),
                "Pn" => {
                    report.pins = Some(SwitchBank::from_pin_letters(value));
                    Some(())
                }
                "FS" => parse_feed_speed(value).map(|v| report.feed_speed = Some(v)),
                "F" => parse_decimal(value).map(|feed| {
                    report.feed_speed = Some(FeedSpeed { feed, speed: 0.0 })
                }),
                "Bf" => parse_buffer(value).map(|v| report.buffer = Some(v)),
                "Ln" => parse_uint(value).map(|v| report.line_number = Some(v)),
                "SD" => parse_sd(value).map(|v| report.sd = Some(v)),
                "A" => {
                    report.accessories = Some(value.to_string());
                    Some(())
                }
                _ => Some(()),
            };
            if parsed.is_none() {
                tracing::debug!("Malformed status field skipped: {}", field);
            }
        }

        Some(report)
    }

    /// Check if the report carries a position in either frame
    pub fn has_position(&self) -> bool {
        self.mpos.is_some() || self.wpos.is_some()
    }
}

/// Parse a plain decimal number
pub fn parse_decimal(s: &str) -> Option<f64> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) {
        return None;
    }
    match frac_part {
        Some(f) if f.is_empty() || !all_digits(f) => return None,
        None if int_part.is_empty() => return None,
        _ => {}
    }
    s.parse::<f64>().ok()
}

/// Parse an unsigned decimal integer
pub fn parse_uint(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Parse a comma-separated list of decimals; any bad value rejects the list
pub fn parse_values(s: &str) -> Option<Vec<f64>> {
    s.split(',').map(parse_decimal).collect()
}

fn parse_overrides(s: &str) -> Option<OverridePercent> {
    let mut parts = s.split(',');
    let feed = parse_uint(parts.next()?)?;
    let rapid = parse_uint(parts.next()?)?;
    let spindle = parse_uint(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(OverridePercent {
        feed,
        rapid,
        spindle,
    })
}

fn parse_feed_speed(s: &str) -> Option<FeedSpeed> {
    let (feed, speed) = s.split_once(',')?;
    Some(FeedSpeed {
        feed: parse_decimal(feed)?,
        speed: parse_decimal(speed)?,
    })
}

fn parse_buffer(s: &str) -> Option<BufferState> {
    let (blocks, bytes) = s.split_once(',')?;
    Some(BufferState {
        planner_blocks: parse_uint(blocks)?,
        rx_bytes: parse_uint(bytes)?,
    })
}

fn parse_sd(s: &str) -> Option<SdProgress> {
    let (percent, filename) = s.split_once(',')?;
    Some(SdProgress {
        percent: parse_decimal(percent)? as f32,
        filename: filename.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_grammar() {
        assert_eq!(parse_decimal("1.000"), Some(1.0));
        assert_eq!(parse_decimal("-3.500"), Some(-3.5));
        assert_eq!(parse_decimal("+2"), Some(2.0));
        assert_eq!(parse_decimal(".5"), Some(0.5));
        assert_eq!(parse_decimal("2."), None);
        assert_eq!(parse_decimal("-"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("1,000"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("NaN"), None);
        assert_eq!(parse_decimal("1e3"), None);
    }

    #[test]
    fn test_parse_idle_mpos() {
        let r = StatusReport::parse("<Idle|MPos:1.000,2.000,-3.500>").unwrap();
        assert_eq!(r.mode, Some(MachineMode::Idle));
        assert_eq!(r.mpos, Some(vec![1.0, 2.0, -3.5]));
        assert!(r.wpos.is_none());
        assert!(r.pins.is_none());
    }

    #[test]
    fn test_parse_substate() {
        let r = StatusReport::parse("<Hold:1|WPos:0.000,0.000,0.000>").unwrap();
        assert_eq!(r.mode, Some(MachineMode::Hold));
        assert_eq!(r.substate, Some(1));
        assert_eq!(r.mode_name, "Hold:1");

        let r = StatusReport::parse("<Door:3>").unwrap();
        assert_eq!(r.mode, Some(MachineMode::SafetyDoor));
        assert_eq!(r.substate, Some(3));
    }

    #[test]
    fn test_unknown_mode_keeps_fields() {
        let r = StatusReport::parse("<Bogus|Ov:150,100,80>").unwrap();
        assert_eq!(r.mode, None);
        assert_eq!(
            r.overrides,
            Some(OverridePercent {
                feed: 150,
                rapid: 100,
                spindle: 80
            })
        );
    }

    #[test]
    fn test_malformed_field_is_skipped_individually() {
        let r = StatusReport::parse("<Run|MPos:1.0,2.|Ov:100,100,100|FS:500,0>").unwrap();
        assert_eq!(r.mode, Some(MachineMode::Cycle));
        assert!(r.mpos.is_none());
        assert!(r.overrides.is_some());
        assert_eq!(r.feed_speed, Some(FeedSpeed { feed: 500.0, speed: 0.0 }));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let r = StatusReport::parse("<Jog|Foo:bar|MPos:0,0,0|Baz|Pn:Z>").unwrap();
        assert_eq!(r.mpos, Some(vec![0.0, 0.0, 0.0]));
        assert!(r.pins.is_some_and(|p| p.limit(2)));
    }

    #[test]
    fn test_full_fluidnc_report() {
        let r = StatusReport::parse(
            "<Run|MPos:10.000,5.000,2.500|Bf:15,128|FS:1000,12000|Ln:42|WCO:1.000,1.000,0.000|Ov:120,50,90|A:SF|SD:12.50,/sd/job.nc>",
        )
        .unwrap();
        assert_eq!(r.buffer, Some(BufferState { planner_blocks: 15, rx_bytes: 128 }));
        assert_eq!(r.line_number, Some(42));
        assert_eq!(r.wco, Some(vec![1.0, 1.0, 0.0]));
        assert_eq!(r.accessories.as_deref(), Some("SF"));
        assert_eq!(
            r.sd,
            Some(SdProgress {
                percent: 12.5,
                filename: "/sd/job.nc".to_string()
            })
        );
    }

    #[test]
    fn test_requires_brackets() {
        assert!(StatusReport::parse("<Idle|MPos:0,0,0").is_none());
        assert!(StatusReport::parse("Idle|MPos:0,0,0>").is_none());
    }

    #[test]
    fn test_override_arity() {
        let r = StatusReport::parse("<Idle|Ov:100,100>").unwrap();
        assert!(r.overrides.is_none());
        let r = StatusReport::parse("<Idle|Ov:100,100,100,5>").unwrap();
        assert!(r.overrides.is_none());
    }
}
