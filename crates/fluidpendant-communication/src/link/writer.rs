//! Line command writer with single-outstanding-line tracking
//!
//! At most one line is on the wire awaiting `ok`/`error`. Further lines are
//! either rejected or held in a FIFO queue, per the caller's [`SendPolicy`],
//! and go out one at a time as the slot frees. Realtime bytes never pass
//! through here.

use crate::communication::Transport;
use crate::firmware::fluidnc::command_creator::validate_line;
use fluidpendant_core::{
    CommandError, CommandOutcome, CommandResult, CommandTicket, Error, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// What to do with a line when another one is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendPolicy {
    /// Fail with [`CommandError::Busy`]
    #[default]
    RejectIfBusy,
    /// Append to the FIFO queue
    Queue,
}

/// Per-line send options; unset fields fall back to the engine defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendOptions {
    /// Time allowed for `ok`/`error` after transmission
    pub timeout: Option<Duration>,
    /// Busy policy
    pub policy: Option<SendPolicy>,
}

impl SendOptions {
    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the busy policy
    pub fn with_policy(mut self, policy: SendPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Options that queue instead of rejecting
    pub fn queued() -> Self {
        Self::default().with_policy(SendPolicy::Queue)
    }
}

#[derive(Debug, Clone)]
struct PendingLine {
    ticket: CommandTicket,
    line: String,
    timeout: Duration,
}

#[derive(Debug, Clone)]
struct OutstandingLine {
    pending: PendingLine,
    sent_at: Instant,
}

impl OutstandingLine {
    fn complete(self, result: CommandResult, now: Instant) -> CommandOutcome {
        CommandOutcome {
            ticket: self.pending.ticket,
            line: self.pending.line,
            result,
            elapsed: now.saturating_duration_since(self.sent_at),
        }
    }
}

/// Outbound line command state
#[derive(Debug)]
pub struct LinkWriter {
    outstanding: Option<OutstandingLine>,
    queue: VecDeque<PendingLine>,
    next_ticket: u64,
    max_command_len: usize,
}

impl LinkWriter {
    /// Create a writer accepting lines up to `max_command_len` bytes
    pub fn new(max_command_len: usize) -> Self {
        Self {
            outstanding: None,
            queue: VecDeque::new(),
            next_ticket: 1,
            max_command_len,
        }
    }

    /// Check if a line is awaiting acknowledgement
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Ticket and text of the outstanding line
    pub fn outstanding(&self) -> Option<(CommandTicket, &str)> {
        self.outstanding
            .as_ref()
            .map(|o| (o.pending.ticket, o.pending.line.as_str()))
    }

    /// Number of lines waiting behind the outstanding one
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Submit a line.
    ///
    /// Written immediately when the slot is free, otherwise rejected or
    /// queued per `policy`. A failed write leaves the slot free and returns
    /// the I/O error.
    pub fn submit<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        line: &str,
        timeout: Duration,
        policy: SendPolicy,
        now: Instant,
    ) -> Result<CommandTicket> {
        validate_line(line, self.max_command_len)?;

        let busy = self.outstanding.is_some() || !self.queue.is_empty();
        if busy && policy == SendPolicy::RejectIfBusy {
            tracing::debug!("Rejecting '{}': a line is outstanding", line);
            return Err(CommandError::Busy.into());
        }

        let pending = PendingLine {
            ticket: self.allocate_ticket(),
            line: line.to_string(),
            timeout,
        };
        let ticket = pending.ticket;

        if busy {
            tracing::debug!("Queued {} '{}'", ticket, line);
            self.queue.push_back(pending);
            return Ok(ticket);
        }

        self.transmit(transport, pending, now)?;
        Ok(ticket)
    }

    /// Resolve the outstanding line with an `ok` or `error:<n>` answer.
    ///
    /// Returns `None` when nothing was outstanding.
    pub fn resolve(&mut self, result: CommandResult, now: Instant) -> Option<CommandOutcome> {
        let outstanding = self.outstanding.take()?;
        tracing::debug!(
            "{} '{}' -> {:?}",
            outstanding.pending.ticket,
            outstanding.pending.line,
            result
        );
        Some(outstanding.complete(result, now))
    }

    /// Time out the outstanding line if its deadline has passed
    pub fn check_timeout(&mut self, now: Instant) -> Option<CommandOutcome> {
        let expired = self.outstanding.as_ref().is_some_and(|o| {
            now.saturating_duration_since(o.sent_at) >= o.pending.timeout
        });
        if !expired {
            return None;
        }
        let outstanding = self.outstanding.take()?;
        tracing::warn!(
            "{} '{}' timed out after {:?}",
            outstanding.pending.ticket,
            outstanding.pending.line,
            outstanding.pending.timeout
        );
        Some(outstanding.complete(CommandResult::TimedOut, now))
    }

    /// Send the next queued line if the slot is free.
    ///
    /// Lines whose write fails are reported as abandoned and the next one is
    /// tried.
    pub fn pump<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        now: Instant,
    ) -> Vec<CommandOutcome> {
        let mut failed = Vec::new();
        while self.outstanding.is_none() {
            let Some(pending) = self.queue.pop_front() else {
                break;
            };
            let ticket = pending.ticket;
            let line = pending.line.clone();
            if let Err(e) = self.transmit(transport, pending, now) {
                tracing::warn!("Dropping queued {} '{}': {}", ticket, line, e);
                failed.push(CommandOutcome {
                    ticket,
                    line,
                    result: CommandResult::Abandoned,
                    elapsed: Duration::ZERO,
                });
            }
        }
        failed
    }

    /// Abandon the outstanding line and everything queued
    pub fn abandon_all(&mut self, now: Instant) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(self.queue.len() + 1);
        if let Some(outstanding) = self.outstanding.take() {
            outcomes.push(outstanding.complete(CommandResult::Abandoned, now));
        }
        outcomes.extend(self.queue.drain(..).map(|p| CommandOutcome {
            ticket: p.ticket,
            line: p.line,
            result: CommandResult::Abandoned,
            elapsed: Duration::ZERO,
        }));
        if !outcomes.is_empty() {
            tracing::debug!("Abandoned {} line command(s)", outcomes.len());
        }
        outcomes
    }

    fn allocate_ticket(&mut self) -> CommandTicket {
        let ticket = CommandTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn transmit<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        pending: PendingLine,
        now: Instant,
    ) -> Result<()> {
        let mut bytes = Vec::with_capacity(pending.line.len() + 1);
        bytes.extend_from_slice(pending.line.as_bytes());
        bytes.push(b'\n');
        transport.write_all(&bytes).map_err(|e| {
            tracing::warn!("Write failed for {}: {}", pending.ticket, e);
            Error::from(e)
        })?;
        tracing::trace!("tx: {}", pending.line);
        self.outstanding = Some(OutstandingLine {
            pending,
            sent_at: now,
        });
        Ok(())
    }
}

impl Default for LinkWriter {
    fn default() -> Self {
        Self::new(255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::MemoryTransport;

    const TIMEOUT: Duration = Duration::from_millis(2000);

    #[test]
    fn test_reject_if_busy() {
        let mut t = MemoryTransport::new();
        let mut w = LinkWriter::default();
        let now = Instant::now();

        let first = w
            .submit(&mut t, "$H", TIMEOUT, SendPolicy::RejectIfBusy, now)
            .unwrap();
        let err = w
            .submit(&mut t, "$X", TIMEOUT, SendPolicy::RejectIfBusy, now)
            .unwrap_err();
        assert!(err.is_busy());
        assert_eq!(t.sent_lines(), vec!["$H"]);

        let outcome = w.resolve(CommandResult::Ok, now).unwrap();
        assert_eq!(outcome.ticket, first);
        assert!(!w.is_busy());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut t = MemoryTransport::new();
        let mut w = LinkWriter::default();
        let now = Instant::now();

        for line in ["G0 X1", "G0 X2", "G0 X3"] {
            w.submit(&mut t, line, TIMEOUT, SendPolicy::Queue, now).unwrap();
        }
        assert_eq!(w.queued_len(), 2);
        assert_eq!(t.sent_lines(), vec!["G0 X1"]);

        w.resolve(CommandResult::Ok, now);
        assert!(w.pump(&mut t, now).is_empty());
        assert_eq!(t.sent_lines(), vec!["G0 X1", "G0 X2"]);
        assert_eq!(w.outstanding().map(|(_, l)| l), Some("G0 X2"));
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut t = MemoryTransport::new();
        let mut w = LinkWriter::default();
        let t0 = Instant::now();
        w.submit(&mut t, "$I", Duration::from_millis(100), SendPolicy::RejectIfBusy, t0)
            .unwrap();

        assert!(w.check_timeout(t0 + Duration::from_millis(99)).is_none());
        let outcome = w.check_timeout(t0 + Duration::from_millis(150)).unwrap();
        assert_eq!(outcome.result, CommandResult::TimedOut);
        assert_eq!(outcome.elapsed, Duration::from_millis(150));
        assert!(w.check_timeout(t0 + Duration::from_millis(300)).is_none());
        assert!(!w.is_busy());
    }

    #[test]
    fn test_abandon_all() {
        let mut t = MemoryTransport::new();
        let mut w = LinkWriter::default();
        let now = Instant::now();
        w.submit(&mut t, "G0 X1", TIMEOUT, SendPolicy::Queue, now).unwrap();
        w.submit(&mut t, "G0 X2", TIMEOUT, SendPolicy::Queue, now).unwrap();

        let outcomes = w.abandon_all(now);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.result == CommandResult::Abandoned));
        assert!(!w.is_busy());
        assert_eq!(w.queued_len(), 0);
    }

    #[test]
    fn test_failed_write_frees_slot() {
        let mut t = MemoryTransport::new();
        t.set_fail_writes(true);
        let mut w = LinkWriter::default();
        let now = Instant::now();
        let err = w
            .submit(&mut t, "$H", TIMEOUT, SendPolicy::RejectIfBusy, now)
            .unwrap_err();
        assert!(err.is_connection_error());
        assert!(!w.is_busy());
    }

    #[test]
    fn test_invalid_line_rejected() {
        let mut t = MemoryTransport::new();
        let mut w = LinkWriter::new(4);
        let now = Instant::now();
        let err = w
            .submit(&mut t, "G0 X100", TIMEOUT, SendPolicy::Queue, now)
            .unwrap_err();
        assert!(err.is_command_error());
        assert!(t.writes().is_empty());
    }
}
