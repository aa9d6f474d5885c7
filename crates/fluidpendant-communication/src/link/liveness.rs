//! Link liveness tracking
//!
//! Any received byte proves the link is up, even one that never completes a
//! line. Silence longer than the threshold marks the link lost; the first
//! recognized line afterwards marks it recovered.

use std::time::{Duration, Instant};

/// Link state change reported by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    /// Silence exceeded the threshold
    Lost,
    /// A recognized line arrived while lost
    Recovered,
}

/// Last-received-byte watchdog
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    threshold: Duration,
    last_rx: Instant,
    connected: bool,
}

impl LivenessMonitor {
    /// Start watching; the silence clock starts at `now`
    pub fn new(threshold: Duration, now: Instant) -> Self {
        Self {
            threshold,
            last_rx: now,
            connected: true,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Link state as of the last [`check`](Self::check) or
    /// [`on_line`](Self::on_line)
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Link state at `now`, without waiting for the next check
    pub fn is_connected_at(&self, now: Instant) -> bool {
        self.connected && self.silence(now) <= self.threshold
    }

    /// When the last byte arrived
    pub fn last_rx(&self) -> Instant {
        self.last_rx
    }

    /// Time since the last byte
    pub fn silence(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_rx)
    }

    /// Note that bytes arrived
    pub fn record_rx(&mut self, now: Instant) {
        if now > self.last_rx {
            self.last_rx = now;
        }
    }

    /// Check the silence threshold
    pub fn check(&mut self, now: Instant) -> Option<LinkTransition> {
        if self.connected && self.silence(now) > self.threshold {
            self.connected = false;
            tracing::info!("Link lost: no data for {:?}", self.silence(now));
            return Some(LinkTransition::Lost);
        }
        None
    }

    /// Note that a recognized line was decoded
    pub fn on_line(&mut self) -> Option<LinkTransition> {
        if self.connected {
            return None;
        }
        self.connected = true;
        tracing::info!("Link recovered");
        Some(LinkTransition::Recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lost_after_threshold() {
        let t0 = Instant::now();
        let mut m = LivenessMonitor::new(Duration::from_millis(4000), t0);
        assert_eq!(m.check(t0 + Duration::from_millis(4000)), None);
        assert_eq!(
            m.check(t0 + Duration::from_millis(4001)),
            Some(LinkTransition::Lost)
        );
        assert_eq!(m.check(t0 + Duration::from_millis(9000)), None);
        assert!(!m.is_connected());
    }

    #[test]
    fn test_bytes_keep_link_alive() {
        let t0 = Instant::now();
        let mut m = LivenessMonitor::new(Duration::from_millis(100), t0);
        m.record_rx(t0 + Duration::from_millis(90));
        assert_eq!(m.check(t0 + Duration::from_millis(150)), None);
    }

    #[test]
    fn test_recovery_needs_a_line() {
        let t0 = Instant::now();
        let mut m = LivenessMonitor::new(Duration::from_millis(100), t0);
        m.check(t0 + Duration::from_millis(200));
        m.record_rx(t0 + Duration::from_millis(250));
        assert!(!m.is_connected());
        assert_eq!(m.on_line(), Some(LinkTransition::Recovered));
        assert_eq!(m.on_line(), None);
    }

    #[test]
    fn test_connected_at_sees_silence_before_check() {
        let t0 = Instant::now();
        let m = LivenessMonitor::new(Duration::from_millis(100), t0);
        assert!(m.is_connected_at(t0 + Duration::from_millis(100)));
        assert!(!m.is_connected_at(t0 + Duration::from_millis(101)));
        assert!(m.is_connected());
    }
}
