//! Machine state model
//!
//! The authoritative snapshot of what the controller last reported, plus the
//! rules for how each decoded fragment updates it. Every mutating method
//! applies one whole fragment; a fragment that failed to decode never reaches
//! the model, so fields keep their last-known values across report gaps.

use crate::data::{
    AxisPosition, Banner, BufferState, FeedSpeed, GcodeModes, JobProgress, MachineMode,
    OverridePercent, ProbeResult, SwitchBank, MAX_AXES,
};
use std::time::{Duration, Instant};

/// Coordinate frame of a reported position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionFrame {
    /// `MPos`: machine coordinates
    Machine,
    /// `WPos`: work coordinates
    Work,
}

/// A mode transition caused by an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// Mode before the update
    pub from: MachineMode,
    /// Mode after the update
    pub to: MachineMode,
}

/// A received alarm or error number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    /// Alarm or error number
    pub code: u32,
    /// When it was received
    pub received_at: Instant,
}

/// Most recent alarm and error numbers with freshness tracking
///
/// Expiry only affects the freshness queries; the stored numbers remain.
#[derive(Debug, Clone)]
pub struct LastFault {
    alarm: Option<FaultRecord>,
    error: Option<FaultRecord>,
    display_window: Duration,
}

impl LastFault {
    /// Create an empty fault record with the given freshness window
    pub fn new(display_window: Duration) -> Self {
        Self {
            alarm: None,
            error: None,
            display_window,
        }
    }

    /// Last alarm received
    pub fn alarm(&self) -> Option<FaultRecord> {
        self.alarm
    }

    /// Last error received
    pub fn error(&self) -> Option<FaultRecord> {
        self.error
    }

    /// Last alarm number
    pub fn alarm_code(&self) -> Option<u32> {
        self.alarm.map(|r| r.code)
    }

    /// Last error number
    pub fn error_code(&self) -> Option<u32> {
        self.error.map(|r| r.code)
    }

    /// Freshness window
    pub fn display_window(&self) -> Duration {
        self.display_window
    }

    /// Check if the last alarm is still within the display window
    pub fn is_alarm_fresh(&self, now: Instant) -> bool {
        self.alarm.is_some_and(|r| self.within_window(r, now))
    }

    /// Check if the last error is still within the display window
    pub fn is_error_fresh(&self, now: Instant) -> bool {
        self.error.is_some_and(|r| self.within_window(r, now))
    }

    fn within_window(&self, record: FaultRecord, now: Instant) -> bool {
        now.saturating_duration_since(record.received_at) < self.display_window
    }

    fn record_alarm(&mut self, code: u32, now: Instant) {
        self.alarm = Some(FaultRecord {
            code,
            received_at: now,
        });
    }

    fn record_error(&mut self, code: u32, now: Instant) {
        self.error = Some(FaultRecord {
            code,
            received_at: now,
        });
    }
}

/// Snapshot of controller state
#[derive(Debug, Clone)]
pub struct MachineModel {
    mode: MachineMode,
    substate: Option<u8>,
    axis_count: usize,
    machine_position: AxisPosition,
    work_position: AxisPosition,
    work_offset: AxisPosition,
    switches: SwitchBank,
    overrides: OverridePercent,
    feed_speed: Option<FeedSpeed>,
    buffer: Option<BufferState>,
    line_number: Option<u32>,
    job: JobProgress,
    last_fault: LastFault,
    gcode_modes: Option<GcodeModes>,
    last_probe: Option<ProbeResult>,
    banner: Option<Banner>,
}

impl MachineModel {
    /// Create a model in `Idle` with zeroed positions
    ///
    /// `axis_count` is clamped to 1..=6.
    pub fn new(axis_count: usize, fault_display_window: Duration) -> Self {
        Self {
            mode: MachineMode::Idle,
            substate: None,
            axis_count: axis_count.clamp(1, MAX_AXES),
            machine_position: AxisPosition::new(),
            work_position: AxisPosition::new(),
            work_offset: AxisPosition::new(),
            switches: SwitchBank::new(),
            overrides: OverridePercent::default(),
            feed_speed: None,
            buffer: None,
            line_number: None,
            job: JobProgress::default(),
            last_fault: LastFault::new(fault_display_window),
            gcode_modes: None,
            last_probe: None,
            banner: None,
        }
    }

    pub fn mode(&self) -> MachineMode {
        self.mode
    }

    /// Sub-state number from `Hold:n` / `Door:n`
    pub fn substate(&self) -> Option<u8> {
        self.substate
    }

    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    /// Displayed axis positions (work coordinates)
    pub fn axes(&self) -> &AxisPosition {
        &self.work_position
    }

    pub fn machine_position(&self) -> &AxisPosition {
        &self.machine_position
    }

    pub fn work_position(&self) -> &AxisPosition {
        &self.work_position
    }

    pub fn work_offset(&self) -> &AxisPosition {
        &self.work_offset
    }

    pub fn switches(&self) -> &SwitchBank {
        &self.switches
    }

    pub fn overrides(&self) -> &OverridePercent {
        &self.overrides
    }

    pub fn feed_speed(&self) -> Option<&FeedSpeed> {
        self.feed_speed.as_ref()
    }

    pub fn buffer(&self) -> Option<&BufferState> {
        self.buffer.as_ref()
    }

    pub fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    pub fn job(&self) -> &JobProgress {
        &self.job
    }

    pub fn last_fault(&self) -> &LastFault {
        &self.last_fault
    }

    pub fn gcode_modes(&self) -> Option<&GcodeModes> {
        self.gcode_modes.as_ref()
    }

    pub fn last_probe(&self) -> Option<&ProbeResult> {
        self.last_probe.as_ref()
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// Apply the mode from a status report.
    ///
    /// Ignored while `Disconnected`; only [`force_reconnecting`](Self::force_reconnecting)
    /// leaves that mode. `Disconnected` itself cannot be set this way.
    pub fn set_mode(&mut self, mode: MachineMode, substate: Option<u8>) -> Option<ModeChange> {
        if self.mode.is_disconnected() || mode.is_disconnected() {
            tracing::debug!("Ignoring mode {} while link state owns the mode", mode);
            return None;
        }
        self.substate = substate;
        self.transition(mode)
    }

    /// Apply an `MPos` or `WPos` field.
    ///
    /// The other frame is derived through the last known work offset.
    pub fn update_position(&mut self, frame: PositionFrame, values: &[f64]) {
        let n = match frame {
            PositionFrame::Machine => self.machine_position.apply(values, self.axis_count),
            PositionFrame::Work => self.work_position.apply(values, self.axis_count),
        };
        for axis in 0..n {
            let offset = self.work_offset.as_slice()[axis];
            match frame {
                PositionFrame::Machine => {
                    let m = self.machine_position.as_slice()[axis];
                    self.work_position.set(axis, m - offset);
                }
                PositionFrame::Work => {
                    let w = self.work_position.as_slice()[axis];
                    self.machine_position.set(axis, w + offset);
                }
            }
        }
    }

    /// Apply a `WCO` field. Work positions are recomputed from machine positions.
    pub fn update_work_offset(&mut self, values: &[f64]) {
        let n = self.work_offset.apply(values, self.axis_count);
        for axis in 0..n {
            let m = self.machine_position.as_slice()[axis];
            self.work_position
                .set(axis, m - self.work_offset.as_slice()[axis]);
        }
    }

    pub fn update_overrides(&mut self, overrides: OverridePercent) {
        self.overrides = overrides;
    }

    pub fn update_switches(&mut self, switches: SwitchBank) {
        self.switches = switches;
    }

    pub fn update_feed_speed(&mut self, feed_speed: FeedSpeed) {
        self.feed_speed = Some(feed_speed);
    }

    pub fn update_buffer(&mut self, buffer: BufferState) {
        self.buffer = Some(buffer);
    }

    pub fn update_line_number(&mut self, line: u32) {
        self.line_number = Some(line);
    }

    /// Apply the `SD` field of a status report, or its absence.
    ///
    /// Must run after the report's mode has been applied: a report in `Idle`
    /// or `Alarm` without an `SD` field ends a loaded job.
    pub fn update_job(&mut self, report: Option<(&str, f32)>) {
        match report {
            Some((filename, percent)) => {
                let percent = percent.clamp(0.0, 100.0);
                if filename != self.job.filename {
                    tracing::debug!("Job started: {} at {}%", filename, percent);
                    self.job = JobProgress {
                        filename: filename.to_string(),
                        percent,
                    };
                } else if percent > self.job.percent {
                    self.job.percent = percent;
                }
            }
            None => {
                if self.job.is_active() && matches!(self.mode, MachineMode::Idle | MachineMode::Alarm)
                {
                    tracing::debug!("Job ended: {}", self.job.filename);
                    self.job = JobProgress::default();
                }
            }
        }
    }

    /// Record `ALARM:<n>`: enter `Alarm` and remember the number
    pub fn record_alarm(&mut self, code: u32, now: Instant) -> Option<ModeChange> {
        self.last_fault.record_alarm(code, now);
        self.set_mode(MachineMode::Alarm, None)
    }

    /// Record `error:<n>`; the mode is not affected
    pub fn record_error(&mut self, code: u32, now: Instant) {
        self.last_fault.record_error(code, now);
    }

    pub fn set_gcode_modes(&mut self, modes: GcodeModes) {
        self.gcode_modes = Some(modes);
    }

    pub fn set_probe_result(&mut self, probe: ProbeResult) {
        self.last_probe = Some(probe);
    }

    pub fn set_banner(&mut self, banner: Banner) {
        self.banner = Some(banner);
    }

    /// Enter `Disconnected`. Used only by liveness tracking.
    pub fn force_disconnected(&mut self) -> Option<ModeChange> {
        self.substate = None;
        self.transition(MachineMode::Disconnected)
    }

    /// Leave `Disconnected` for `Idle`, pending the mode carried by the
    /// line that proved the link is back. Used only by liveness tracking.
    pub fn force_reconnecting(&mut self) -> Option<ModeChange> {
        if !self.mode.is_disconnected() {
            return None;
        }
        self.transition(MachineMode::Idle)
    }

    fn transition(&mut self, to: MachineMode) -> Option<ModeChange> {
        if self.mode == to {
            return None;
        }
        let change = ModeChange {
            from: self.mode,
            to,
        };
        tracing::debug!("Mode {} -> {}", change.from, change.to);
        self.mode = to;
        Some(change)
    }
}

impl Default for MachineModel {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}
