//! Pendant protocol engine
//!
//! Owns the transport, the line framer, the link writer, the liveness
//! monitor and the machine model. The host calls [`PendantEngine::poll`]
//! every tick; nothing here blocks or spawns threads, and every method
//! takes the current time so behavior is deterministic under test.

use crate::communication::{LineFramer, Transport};
use crate::firmware::fluidnc::{FluidResponse, RealtimeCommand, StatusReport};
use crate::link::{LinkTransition, LinkWriter, LivenessMonitor, SendOptions, SendPolicy};
use fluidpendant_core::{
    CommandOutcome, CommandResult, CommandTicket, CompletionSink, EngineEvent, Error, MachineMode,
    MachineModel, MachineSnapshot, ModeChange, PositionFrame, Result,
};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Upper bound on transport reads per poll
const MAX_READS_PER_POLL: usize = 64;

/// Bytes requested per transport read
const READ_CHUNK: usize = 256;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Silence after which the link counts as lost
    pub disconnect_threshold: Duration,
    /// Line command timeout when the caller does not give one
    pub default_line_timeout: Duration,
    /// How long a received alarm/error counts as fresh
    pub fault_display_window: Duration,
    /// Inbound line cap in bytes
    pub max_line_len: usize,
    /// Outbound line cap in bytes, excluding the terminator
    pub max_command_len: usize,
    /// Number of axes tracked (1..=6)
    pub axis_count: usize,
    /// Cadence of `?` status requests; `None` relies on auto-reporting
    pub status_poll_interval: Option<Duration>,
    /// Busy policy when the caller does not give one
    pub default_policy: SendPolicy,
    /// Maximum queued events; the oldest is dropped when full
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            disconnect_threshold: Duration::from_millis(4000),
            default_line_timeout: Duration::from_millis(2000),
            fault_display_window: Duration::from_millis(1000),
            max_line_len: 256,
            max_command_len: 255,
            axis_count: 3,
            status_poll_interval: Some(Duration::from_millis(250)),
            default_policy: SendPolicy::RejectIfBusy,
            event_capacity: 256,
        }
    }
}

/// Poll-driven FluidNC pendant engine
pub struct PendantEngine<T: Transport> {
    transport: T,
    config: EngineConfig,
    framer: LineFramer,
    writer: LinkWriter,
    liveness: LivenessMonitor,
    model: MachineModel,
    events: VecDeque<EngineEvent>,
    last_outcome: Option<CommandOutcome>,
    sink: Option<Box<dyn CompletionSink>>,
    last_status_request: Option<Instant>,
    recognized_lines: u64,
    read_buf: Vec<u8>,
}

impl<T: Transport> PendantEngine<T> {
    /// Create an engine; the liveness clock starts now
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self::with_start(transport, config, Instant::now())
    }

    /// Create an engine whose liveness clock starts at `now`
    pub fn with_start(transport: T, config: EngineConfig, now: Instant) -> Self {
        Self {
            transport,
            framer: LineFramer::new(config.max_line_len),
            writer: LinkWriter::new(config.max_command_len),
            liveness: LivenessMonitor::new(config.disconnect_threshold, now),
            model: MachineModel::new(config.axis_count, config.fault_display_window),
            events: VecDeque::with_capacity(config.event_capacity.min(1024)),
            last_outcome: None,
            sink: None,
            last_status_request: None,
            recognized_lines: 0,
            read_buf: vec![0; READ_CHUNK],
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Machine state as last reported
    pub fn model(&self) -> &MachineModel {
        &self.model
    }

    /// Serializable copy of the model
    pub fn snapshot(&self, now: Instant) -> MachineSnapshot {
        MachineSnapshot::capture(&self.model, now)
    }

    /// Link state as of the last `poll`
    pub fn is_connected(&self) -> bool {
        self.liveness.is_connected()
    }

    /// Check if bytes have arrived recently enough at `now`; unlike
    /// [`is_connected`](Self::is_connected) this does not wait for `poll`
    pub fn is_connected_at(&self, now: Instant) -> bool {
        self.liveness.is_connected_at(now)
    }

    /// Most recent line command completion
    pub fn last_outcome(&self) -> Option<&CommandOutcome> {
        self.last_outcome.as_ref()
    }

    /// Number of recognized lines decoded so far
    pub fn recognized_lines(&self) -> u64 {
        self.recognized_lines
    }

    /// Check if a line command is awaiting acknowledgement
    pub fn is_busy(&self) -> bool {
        self.writer.is_busy()
    }

    /// Lines waiting behind the outstanding one
    pub fn queued_lines(&self) -> usize {
        self.writer.queued_len()
    }

    /// Register a callback for line command completions
    pub fn set_completion_sink(&mut self, sink: impl CompletionSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Remove the completion callback
    pub fn clear_completion_sink(&mut self) {
        self.sink = None;
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Send a line command with the default timeout and policy
    pub fn send_line(&mut self, line: &str, now: Instant) -> Result<CommandTicket> {
        self.send_line_with(line, SendOptions::default(), now)
    }

    /// Send a line command.
    ///
    /// Returns once the line is written or queued. The outcome arrives later
    /// through the completion sink, [`last_outcome`](Self::last_outcome) and
    /// an [`EngineEvent::CommandCompleted`] event.
    pub fn send_line_with(
        &mut self,
        line: &str,
        options: SendOptions,
        now: Instant,
    ) -> Result<CommandTicket> {
        let timeout = options.timeout.unwrap_or(self.config.default_line_timeout);
        let policy = options.policy.unwrap_or(self.config.default_policy);
        self.writer
            .submit(&mut self.transport, line, timeout, policy, now)
    }

    /// Send a realtime byte immediately.
    ///
    /// Does not touch the outstanding line, except that `Reset` abandons it
    /// and everything queued, whether or not the write succeeds.
    pub fn send_realtime(&mut self, command: RealtimeCommand, now: Instant) -> Result<()> {
        tracing::debug!("Realtime {}", command);
        let written = self.transport.write_all(&[command.as_byte()]);
        if command.abandons_lines() {
            for outcome in self.writer.abandon_all(now) {
                self.complete(outcome);
            }
        }
        written.map_err(|e| {
            tracing::warn!("Failed to send realtime {}: {}", command, e);
            Error::from(e)
        })
    }

    /// Run one engine tick: read input, decode lines, advance timers
    pub fn poll(&mut self, now: Instant) {
        self.read_input(now);

        let dropped = self.framer.take_dropped();
        if dropped > 0 {
            self.push_event(EngineEvent::LineDropped { bytes: dropped });
        }

        while let Some(line) = self.framer.next_line() {
            self.handle_line(&line, now);
        }

        if let Some(outcome) = self.writer.check_timeout(now) {
            self.complete(outcome);
        }

        if let Some(LinkTransition::Lost) = self.liveness.check(now) {
            self.on_link_lost(now);
        }

        for outcome in self.writer.pump(&mut self.transport, now) {
            self.complete(outcome);
        }

        self.request_status(now);
    }

    fn read_input(&mut self, now: Instant) {
        for _ in 0..MAX_READS_PER_POLL {
            match self.transport.read_available(&mut self.read_buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.liveness.record_rx(now);
                    self.framer.push(&self.read_buf[..n]);
                }
                Err(e) => {
                    tracing::warn!("Transport read failed: {}", e);
                    break;
                }
            }
        }
    }

    fn handle_line(&mut self, line: &str, now: Instant) {
        let response = FluidResponse::parse(line);
        tracing::debug!("Decoded {}", response);

        if response.is_recognized() {
            self.recognized_lines += 1;
        }
        let recovering = response.is_recognized() && self.liveness.on_line().is_some();
        if recovering {
            self.model.force_reconnecting();
        }

        let change = self.apply_response(response, now);

        if recovering {
            let mode = self.model.mode();
            self.push_event(EngineEvent::ModeChanged(ModeChange {
                from: MachineMode::Disconnected,
                to: mode,
            }));
            self.push_event(EngineEvent::LinkRecovered(mode));
        } else if let Some(change) = change {
            tracing::info!("Mode {} -> {}", change.from, change.to);
            self.push_event(EngineEvent::ModeChanged(change));
        }
    }

    fn apply_response(&mut self, response: FluidResponse, now: Instant) -> Option<ModeChange> {
        match response {
            FluidResponse::Status(report) => return self.apply_status(&report),
            FluidResponse::Ok => match self.writer.resolve(CommandResult::Ok, now) {
                Some(outcome) => self.complete(outcome),
                None => tracing::warn!("Unsolicited ok"),
            },
            FluidResponse::Error(code) => {
                self.model.record_error(code, now);
                self.push_event(EngineEvent::ProtocolError(code));
                match self.writer.resolve(CommandResult::Error(code), now) {
                    Some(outcome) => self.complete(outcome),
                    None => tracing::warn!("Unsolicited error:{}", code),
                }
            }
            FluidResponse::Alarm(code) => {
                tracing::info!("ALARM:{}", code);
                self.push_event(EngineEvent::Alarm(code));
                return self.model.record_alarm(code, now);
            }
            FluidResponse::Message(message) => self.push_event(EngineEvent::Message(message)),
            FluidResponse::GcodeModes(modes) => {
                self.model.set_gcode_modes(modes.clone());
                self.push_event(EngineEvent::GcodeModes(modes));
            }
            FluidResponse::Probe(probe) => {
                self.model.set_probe_result(probe.clone());
                self.push_event(EngineEvent::ProbeResult(probe));
            }
            FluidResponse::Feedback(text) => self.push_event(EngineEvent::Feedback(text)),
            FluidResponse::Banner(banner) => {
                tracing::info!("Controller reset: {} {}", banner.firmware, banner.version);
                // A rebooted controller will never answer lines sent before it
                for outcome in self.writer.abandon_all(now) {
                    self.complete(outcome);
                }
                self.model.set_banner(banner.clone());
                self.push_event(EngineEvent::Banner(banner));
            }
            FluidResponse::Unrecognized(text) => self.push_event(EngineEvent::Unrecognized(text)),
        }
        None
    }

    fn apply_status(&mut self, report: &StatusReport) -> Option<ModeChange> {
        if let Some(wco) = &report.wco {
            self.model.update_work_offset(wco);
        }
        if let Some(mpos) = &report.mpos {
            self.model.update_position(PositionFrame::Machine, mpos);
        }
        if let Some(wpos) = &report.wpos {
            self.model.update_position(PositionFrame::Work, wpos);
        }

        let change = match report.mode {
            Some(mode) => self.model.set_mode(mode, report.substate),
            None => None,
        };

        if let Some(overrides) = report.overrides {
            self.model.update_overrides(overrides);
        }
        // Pn is omitted when no switch is asserted
        self.model.update_switches(report.pins.unwrap_or_default());
        if let Some(feed_speed) = report.feed_speed {
            self.model.update_feed_speed(feed_speed);
        }
        if let Some(buffer) = report.buffer {
            self.model.update_buffer(buffer);
        }
        if let Some(line) = report.line_number {
            self.model.update_line_number(line);
        }
        self.model.update_job(
            report
                .sd
                .as_ref()
                .map(|sd| (sd.filename.as_str(), sd.percent)),
        );

        change
    }

    fn on_link_lost(&mut self, now: Instant) {
        if let Some(change) = self.model.force_disconnected() {
            self.push_event(EngineEvent::ModeChanged(change));
        }
        for outcome in self.writer.abandon_all(now) {
            self.complete(outcome);
        }
        self.push_event(EngineEvent::LinkLost);
    }

    fn request_status(&mut self, now: Instant) {
        let Some(interval) = self.config.status_poll_interval else {
            return;
        };
        let due = self
            .last_status_request
            .is_none_or(|last| now.saturating_duration_since(last) >= interval);
        if !due {
            return;
        }
        self.last_status_request = Some(now);
        if let Err(e) = self
            .transport
            .write_all(&[RealtimeCommand::StatusReport.as_byte()])
        {
            tracing::debug!("Status request failed: {}", e);
        }
    }

    fn complete(&mut self, outcome: CommandOutcome) {
        if let Some(sink) = self.sink.as_mut() {
            sink.on_complete(&outcome);
        }
        self.last_outcome = Some(outcome.clone());
        self.push_event(EngineEvent::CommandCompleted(outcome));
    }

    fn push_event(&mut self, event: EngineEvent) {
        if self.events.len() >= self.config.event_capacity.max(1) {
            self.events.pop_front();
            tracing::trace!("Event queue full, dropped oldest event");
        }
        self.events.push_back(event);
    }
}

impl<T: Transport + std::fmt::Debug> std::fmt::Debug for PendantEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendantEngine")
            .field("transport", &self.transport)
            .field("mode", &self.model.mode())
            .field("connected", &self.liveness.is_connected())
            .field("busy", &self.writer.is_busy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::MemoryTransport;

    fn engine(now: Instant) -> PendantEngine<MemoryTransport> {
        let config = EngineConfig {
            status_poll_interval: None,
            ..EngineConfig::default()
        };
        PendantEngine::with_start(MemoryTransport::new(), config, now)
    }

    #[test]
    fn test_status_poll_cadence() {
        let t0 = Instant::now();
        let mut e = PendantEngine::with_start(MemoryTransport::new(), EngineConfig::default(), t0);
        e.poll(t0);
        e.poll(t0 + Duration::from_millis(100));
        e.poll(t0 + Duration::from_millis(250));
        assert_eq!(e.transport().sent_realtime(), vec![b'?', b'?']);
    }

    #[test]
    fn test_unsolicited_ok_is_harmless() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        e.transport_mut().push_line("ok");
        e.poll(t0);
        assert!(e.last_outcome().is_none());
        assert!(e.drain_events().is_empty());
    }

    #[test]
    fn test_event_queue_drops_oldest() {
        let t0 = Instant::now();
        let config = EngineConfig {
            status_poll_interval: None,
            event_capacity: 2,
            ..EngineConfig::default()
        };
        let mut e = PendantEngine::with_start(MemoryTransport::new(), config, t0);
        for text in ["[A:1]", "[B:2]", "[C:3]"] {
            e.transport_mut().push_line(text);
        }
        e.poll(t0);
        assert_eq!(
            e.drain_events(),
            vec![
                EngineEvent::Feedback("[B:2]".to_string()),
                EngineEvent::Feedback("[C:3]".to_string())
            ]
        );
    }

    #[test]
    fn test_banner_abandons_outstanding() {
        let t0 = Instant::now();
        let mut e = engine(t0);
        e.send_line("$H", t0).unwrap();
        e.transport_mut().push_line("Grbl 3.7 [FluidNC v3.7.8 (wifi) '$' for help]");
        e.poll(t0);
        assert_eq!(e.last_outcome().map(|o| o.result), Some(CommandResult::Abandoned));
        assert_eq!(e.model().banner().map(|b| b.version.as_str()), Some("v3.7.8"));
        assert!(!e.is_busy());
    }
}
