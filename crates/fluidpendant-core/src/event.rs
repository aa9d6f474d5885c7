//! Engine events and command completion
//!
//! Provides:
//! - Command tickets and outcomes for line commands
//! - The completion sink interface for callers that want a callback
//! - Event types the engine queues for display/input collaborators

use crate::data::{Banner, GcodeModes, InfoMessage, MachineMode, ProbeResult};
use crate::model::ModeChange;
use std::fmt;
use std::time::Duration;

/// Identifies one line command from send to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandTicket(pub u64);

impl fmt::Display for CommandTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a line command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// Controller answered `ok`
    Ok,
    /// Controller answered `error:<n>`
    Error(u32),
    /// No answer within the line's timeout
    TimedOut,
    /// Dropped by a reset or link loss before an answer arrived
    Abandoned,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Completion record of a line command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Ticket returned when the line was submitted
    pub ticket: CommandTicket,
    /// The line as sent, without terminator
    pub line: String,
    /// How it finished
    pub result: CommandResult,
    /// Time from transmission to completion; zero if never transmitted
    pub elapsed: Duration,
}

/// Receives line command completions
///
/// Called from the engine's poll path; implementations must not block.
pub trait CompletionSink {
    /// Called once per line command
    fn on_complete(&mut self, outcome: &CommandOutcome);
}

impl<F> CompletionSink for F
where
    F: FnMut(&CommandOutcome),
{
    fn on_complete(&mut self, outcome: &CommandOutcome) {
        self(outcome)
    }
}

/// Events produced for collaborators, drained by the host loop
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Mode changed
    ModeChanged(ModeChange),
    /// No bytes for longer than the disconnect threshold
    LinkLost,
    /// A well-formed line arrived after the link was lost
    LinkRecovered(MachineMode),
    /// Firmware boot banner
    Banner(Banner),
    /// `[MSG:...]` message
    Message(InfoMessage),
    /// Other bracketed feedback (`[VER:...]`, `[OPT:...]`, ...), verbatim
    Feedback(String),
    /// Line not recognized by the decoder, verbatim
    Unrecognized(String),
    /// `ALARM:<n>`
    Alarm(u32),
    /// `error:<n>`
    ProtocolError(u32),
    /// `[PRB:...]`
    ProbeResult(ProbeResult),
    /// `[GC:...]`
    GcodeModes(GcodeModes),
    /// A line command finished
    CommandCompleted(CommandOutcome),
    /// Oversize input discarded by the line framer
    LineDropped {
        /// Bytes discarded
        bytes: usize,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::ModeChanged(change) => write!(f, "Mode: {} -> {}", change.from, change.to),
            EngineEvent::LinkLost => write!(f, "Link lost"),
            EngineEvent::LinkRecovered(mode) => write!(f, "Link recovered ({})", mode),
            EngineEvent::Banner(b) => write!(f, "{} {}", b.firmware, b.version),
            EngineEvent::Message(m) => match &m.level {
                Some(level) => write!(f, "[{}] {}", level, m.body),
                None => write!(f, "{}", m.body),
            },
            EngineEvent::Feedback(text) => write!(f, "{}", text),
            EngineEvent::Unrecognized(text) => write!(f, "{}", text),
            EngineEvent::Alarm(code) => write!(f, "ALARM:{}", code),
            EngineEvent::ProtocolError(code) => write!(f, "error:{}", code),
            EngineEvent::ProbeResult(p) => write!(
                f,
                "Probe {} at {:?}",
                if p.success { "hit" } else { "miss" },
                p.position.as_slice()
            ),
            EngineEvent::GcodeModes(m) => write!(
                f,
                "Modes: {} {} {} {} {}",
                m.motion, m.wcs, m.units, m.distance, m.spindle
            ),
            EngineEvent::CommandCompleted(o) => {
                write!(f, "Command {} '{}': {:?}", o.ticket, o.line, o.result)
            }
            EngineEvent::LineDropped { bytes } => write!(f, "Dropped {} bytes of oversize input", bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |o: &CommandOutcome| seen.push(o.result);
            sink.on_complete(&CommandOutcome {
                ticket: CommandTicket(1),
                line: "$H".to_string(),
                result: CommandResult::Ok,
                elapsed: Duration::ZERO,
            });
        }
        assert_eq!(seen, vec![CommandResult::Ok]);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(EngineEvent::Alarm(3).to_string(), "ALARM:3");
        assert_eq!(EngineEvent::ProtocolError(9).to_string(), "error:9");
        assert_eq!(CommandTicket(7).to_string(), "#7");
    }
}
