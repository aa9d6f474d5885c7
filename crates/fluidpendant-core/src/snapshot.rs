//! Serializable view of the machine model
//!
//! `MachineModel` holds monotonic timestamps, which do not serialize; this
//! view replaces them with fault ages relative to a caller-supplied instant.

use crate::data::{
    AxisPosition, FeedSpeed, GcodeModes, JobProgress, MachineMode, OverridePercent, SwitchBank,
};
use crate::model::MachineModel;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Fault number with its age at snapshot time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSnapshot {
    pub code: u32,
    pub age_ms: u64,
    pub fresh: bool,
}

/// Point-in-time copy of the model for display or export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub mode: MachineMode,
    pub connected: bool,
    pub axes: Vec<f64>,
    pub machine_position: AxisPosition,
    pub switches: SwitchBank,
    pub overrides: OverridePercent,
    pub feed_speed: Option<FeedSpeed>,
    pub job: JobProgress,
    pub last_alarm: Option<FaultSnapshot>,
    pub last_error: Option<FaultSnapshot>,
    pub gcode_modes: Option<GcodeModes>,
}

impl MachineSnapshot {
    /// Capture the model as seen at `now`
    pub fn capture(model: &MachineModel, now: Instant) -> Self {
        let fault = model.last_fault();
        let age = |at: Instant| now.saturating_duration_since(at).as_millis() as u64;
        Self {
            mode: model.mode(),
            connected: !model.mode().is_disconnected(),
            axes: model.axes().as_slice()[..model.axis_count()].to_vec(),
            machine_position: *model.machine_position(),
            switches: *model.switches(),
            overrides: *model.overrides(),
            feed_speed: model.feed_speed().copied(),
            job: model.job().clone(),
            last_alarm: fault.alarm().map(|r| FaultSnapshot {
                code: r.code,
                age_ms: age(r.received_at),
                fresh: fault.is_alarm_fresh(now),
            }),
            last_error: fault.error().map(|r| FaultSnapshot {
                code: r.code,
                age_ms: age(r.received_at),
                fresh: fault.is_error_fresh(now),
            }),
            gcode_modes: model.gcode_modes().cloned(),
        }
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        let axes: Vec<String> = self
            .axes
            .iter()
            .zip(crate::data::AXIS_LETTERS)
            .map(|(v, letter)| format!("{}{:.3}", letter, v))
            .collect();
        let mut line = format!(
            "{:<6} {}  F{}% R{}% S{}%",
            self.mode.display_name(),
            axes.join(" "),
            self.overrides.feed,
            self.overrides.rapid,
            self.overrides.spindle
        );
        if self.job.is_active() {
            line.push_str(&format!("  {} {:.1}%", self.job.filename, self.job.percent));
        }
        if let Some(alarm) = self.last_alarm.filter(|a| a.fresh) {
            line.push_str(&format!("  ALARM:{}", alarm.code));
        }
        if let Some(error) = self.last_error.filter(|e| e.fresh) {
            line.push_str(&format!("  error:{}", error.code));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PositionFrame;
    use std::time::Duration;

    #[test]
    fn test_capture_and_serialize() {
        let mut model = MachineModel::new(3, Duration::from_millis(1000));
        let t0 = Instant::now();
        model.update_position(PositionFrame::Machine, &[1.0, 2.0, -3.5]);
        model.record_error(9, t0);

        let snap = MachineSnapshot::capture(&model, t0 + Duration::from_millis(250));
        assert_eq!(snap.axes, vec![1.0, 2.0, -3.5]);
        assert_eq!(snap.last_error.map(|e| e.age_ms), Some(250));
        assert!(snap.last_error.is_some_and(|e| e.fresh));
        assert!(snap.summary().contains("error:9"));

        let json = serde_json::to_string(&snap).unwrap();
        let back: MachineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
