//! FluidNC Response Parser
//!
//! Classifies one complete line from the controller: status reports,
//! acknowledgements, numbered errors and alarms, bracketed messages and
//! feedback, and the boot banner. Anything else is passed through verbatim.

use super::status_parser::{parse_decimal, parse_uint, parse_values, StatusReport};
use fluidpendant_core::{AxisPosition, Banner, GcodeModes, InfoMessage, ProbeResult};
use std::fmt;

/// One decoded line
#[derive(Debug, Clone, PartialEq)]
pub enum FluidResponse {
    /// `<...>` status report
    Status(StatusReport),
    /// `ok`
    Ok,
    /// `error:<n>`
    Error(u32),
    /// `ALARM:<n>`
    Alarm(u32),
    /// `[MSG:...]`
    Message(InfoMessage),
    /// `[GC:...]` parser state
    GcodeModes(GcodeModes),
    /// `[PRB:x,y,z:s]`
    Probe(ProbeResult),
    /// Other bracketed feedback, verbatim
    Feedback(String),
    /// Boot banner
    Banner(Banner),
    /// Not recognized, verbatim
    Unrecognized(String),
}

impl fmt::Display for FluidResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(r) => write!(f, "status:{}", r.mode_name),
            Self::Ok => write!(f, "ok"),
            Self::Error(code) => write!(f, "error:{}", code),
            Self::Alarm(code) => write!(f, "ALARM:{}", code),
            Self::Message(m) => write!(f, "message:{}", m.body),
            Self::GcodeModes(_) => write!(f, "gcode_modes"),
            Self::Probe(p) => write!(f, "probe:{}", p.success),
            Self::Feedback(text) => write!(f, "feedback:{}", text),
            Self::Banner(b) => write!(f, "banner:{} {}", b.firmware, b.version),
            Self::Unrecognized(text) => write!(f, "unrecognized:{}", text),
        }
    }
}

impl FluidResponse {
    /// Parse a complete line (terminator already removed)
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line == "ok" {
            return Self::Ok;
        }

        if let Some(code) = line.strip_prefix("error:").and_then(parse_uint) {
            return Self::Error(code);
        }

        if let Some(code) = line
            .strip_prefix("ALARM:")
            .or_else(|| line.strip_prefix("alarm:"))
            .and_then(parse_uint)
        {
            return Self::Alarm(code);
        }

        if line.starts_with('<') {
            return match StatusReport::parse(line) {
                Some(report) => Self::Status(report),
                None => Self::Unrecognized(line.to_string()),
            };
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            return Self::parse_bracketed(line, inner);
        }

        if let Some(banner) = parse_banner(line) {
            return Self::Banner(banner);
        }

        Self::Unrecognized(line.to_string())
    }

    /// Check if the line was recognized as controller output
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    fn parse_bracketed(line: &str, inner: &str) -> Self {
        if let Some(body) = inner.strip_prefix("MSG:") {
            return Self::Message(parse_message(line, body));
        }
        if let Some(words) = inner.strip_prefix("GC:") {
            return Self::GcodeModes(parse_gcode_modes(words));
        }
        if let Some(probe) = inner.strip_prefix("PRB:").and_then(parse_probe) {
            return Self::Probe(probe);
        }
        Self::Feedback(line.to_string())
    }
}

/// Split `LEVEL: body` / `LEVEL body` into level and body.
///
/// The level is a leading run of at least two uppercase ASCII letters,
/// optionally followed by `:`, then a space.
fn parse_message(line: &str, body: &str) -> InfoMessage {
    if let Some((token, rest)) = body.split_once(' ') {
        let tag = token.strip_suffix(':').unwrap_or(token);
        if tag.len() >= 2 && tag.bytes().all(|b| b.is_ascii_uppercase()) {
            return InfoMessage {
                level: Some(tag.to_string()),
                body: rest.trim().to_string(),
                raw: line.to_string(),
            };
        }
    }
    InfoMessage {
        level: None,
        body: body.trim().to_string(),
        raw: line.to_string(),
    }
}

/// Parse the words of a `[GC:...]` report. Unknown words are ignored.
pub fn parse_gcode_modes(words: &str) -> GcodeModes {
    let mut modes = GcodeModes::default();
    let mut coolant: Vec<&str> = Vec::new();

    for word in words.split_whitespace() {
        let mut chars = word.chars();
        let Some(letter) = chars.next() else {
            continue;
        };
        let number = chars.as_str();
        match letter {
            'G' => {
                let target = match number.split('.').next().and_then(parse_uint) {
                    Some(0..=3) | Some(38) | Some(80) => &mut modes.motion,
                    Some(54..=59) => &mut modes.wcs,
                    Some(17..=19) => &mut modes.plane,
                    Some(20 | 21) => &mut modes.units,
                    Some(90 | 91) => &mut modes.distance,
                    Some(93 | 94) => &mut modes.feed_mode,
                    _ => continue,
                };
                *target = word.to_string();
            }
            'M' => match number {
                "3" | "4" | "5" => modes.spindle = word.to_string(),
                "7" | "8" | "9" => coolant.push(word),
                _ => {}
            },
            'T' => {
                if let Some(tool) = parse_uint(number) {
                    modes.tool = tool;
                }
            }
            'F' => {
                if let Some(feed) = parse_decimal(number) {
                    modes.feed = feed;
                }
            }
            'S' => {
                if let Some(speed) = parse_decimal(number) {
                    modes.speed = speed;
                }
            }
            _ => {}
        }
    }

    if !coolant.is_empty() {
        modes.coolant = coolant.join(" ");
    }
    modes
}

fn parse_probe(body: &str) -> Option<ProbeResult> {
    let (values, flag) = body.rsplit_once(':')?;
    let success = match flag {
        "1" => true,
        "0" => false,
        _ => return None,
    };
    let values = parse_values(values)?;
    Some(ProbeResult {
        position: AxisPosition::from_slice(&values),
        success,
    })
}

/// Boot lines start with `Grbl <version>`; FluidNC adds `[FluidNC <version> ...]`.
/// A line merely mentioning FluidNC (config dumps, file listings) is not a banner.
fn parse_banner(line: &str) -> Option<Banner> {
    let first_word = |text: &str| {
        text.split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches(']')
            .to_string()
    };
    if let Some(rest) = line.strip_prefix("FluidNC ") {
        return Some(Banner {
            firmware: "FluidNC".to_string(),
            version: first_word(rest),
        });
    }
    let rest = line.strip_prefix("Grbl ")?;
    if let Some(idx) = rest.find("[FluidNC ") {
        return Some(Banner {
            firmware: "FluidNC".to_string(),
            version: first_word(&rest[idx + "[FluidNC ".len()..]),
        });
    }
    Some(Banner {
        firmware: "Grbl".to_string(),
        version: first_word(rest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluidpendant_core::MachineMode;

    #[test]
    fn test_parse_ok_and_errors() {
        assert_eq!(FluidResponse::parse("ok"), FluidResponse::Ok);
        assert_eq!(FluidResponse::parse("error:9"), FluidResponse::Error(9));
        assert_eq!(FluidResponse::parse("ALARM:1"), FluidResponse::Alarm(1));
        assert_eq!(FluidResponse::parse("alarm:6"), FluidResponse::Alarm(6));
        assert!(matches!(
            FluidResponse::parse("error:x"),
            FluidResponse::Unrecognized(_)
        ));
        assert!(matches!(
            FluidResponse::parse("okay"),
            FluidResponse::Unrecognized(_)
        ));
    }

    #[test]
    fn test_parse_status() {
        match FluidResponse::parse("<Alarm|Pn:XYP>") {
            FluidResponse::Status(r) => {
                assert_eq!(r.mode, Some(MachineMode::Alarm));
                let pins = r.pins.unwrap();
                assert!(pins.limit(0) && pins.limit(1) && pins.probe());
                assert!(!pins.limit(2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_truncated_status_is_unrecognized() {
        assert_eq!(
            FluidResponse::parse("<Idle|MPos:1.0,2"),
            FluidResponse::Unrecognized("<Idle|MPos:1.0,2".to_string())
        );
    }

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            FluidResponse::parse("[MSG:INFO: Hello pendant]"),
            FluidResponse::Message(InfoMessage {
                level: Some("INFO".to_string()),
                body: "Hello pendant".to_string(),
                raw: "[MSG:INFO: Hello pendant]".to_string()
            })
        );
        assert_eq!(
            FluidResponse::parse("[MSG:INI io.1=inp,low,pu]"),
            FluidResponse::Message(InfoMessage {
                level: Some("INI".to_string()),
                body: "io.1=inp,low,pu".to_string(),
                raw: "[MSG:INI io.1=inp,low,pu]".to_string()
            })
        );
        assert_eq!(
            FluidResponse::parse("[MSG:Reset to continue]"),
            FluidResponse::Message(InfoMessage {
                level: None,
                body: "Reset to continue".to_string(),
                raw: "[MSG:Reset to continue]".to_string()
            })
        );
    }

    #[test]
    fn test_parse_gcode_modes() {
        let FluidResponse::GcodeModes(m) =
            FluidResponse::parse("[GC:G1 G55 G17 G20 G91 G94 M3 M7 M8 T2 F500 S12000]")
        else {
            panic!("expected modes");
        };
        assert_eq!(m.motion, "G1");
        assert_eq!(m.wcs, "G55");
        assert!(m.is_inches());
        assert!(m.is_incremental());
        assert_eq!(m.spindle, "M3");
        assert_eq!(m.coolant, "M7 M8");
        assert_eq!(m.tool, 2);
        assert_eq!(m.feed, 500.0);
        assert_eq!(m.speed, 12000.0);
    }

    #[test]
    fn test_parse_probe() {
        let FluidResponse::Probe(p) = FluidResponse::parse("[PRB:1.000,2.000,-8.250:1]") else {
            panic!("expected probe");
        };
        assert!(p.success);
        assert_eq!(p.position.get(2), Some(-8.25));
    }

    #[test]
    fn test_other_feedback_verbatim() {
        assert_eq!(
            FluidResponse::parse("[VER:3.7.8 FluidNC:]"),
            FluidResponse::Feedback("[VER:3.7.8 FluidNC:]".to_string())
        );
    }

    #[test]
    fn test_parse_banners() {
        assert_eq!(
            FluidResponse::parse("Grbl 3.7 [FluidNC v3.7.8 (wifi) '$' for help]"),
            FluidResponse::Banner(Banner {
                firmware: "FluidNC".to_string(),
                version: "v3.7.8".to_string()
            })
        );
        assert_eq!(
            FluidResponse::parse("Grbl 1.1h ['$' for help]"),
            FluidResponse::Banner(Banner {
                firmware: "Grbl".to_string(),
                version: "1.1h".to_string()
            })
        );
    }

    #[test]
    fn test_fluidnc_mention_is_not_a_banner() {
        for line in ["name: FluidNC Default", "board: FluidNC 6-pack", "Running FluidNC v3.7.8"] {
            assert_eq!(
                FluidResponse::parse(line),
                FluidResponse::Unrecognized(line.trim().to_string()),
                "{line}"
            );
        }
        assert_eq!(
            FluidResponse::parse("FluidNC v3.7.8"),
            FluidResponse::Banner(Banner {
                firmware: "FluidNC".to_string(),
                version: "v3.7.8".to_string()
            })
        );
    }
}
