//! Line framing for the inbound byte stream
//!
//! Splits arbitrary chunks into `\n`-terminated lines. A partial line longer
//! than the cap is discarded and framing resumes at the next `\n` or at the
//! next `<`, which starts a fresh status report.

use std::collections::VecDeque;

/// Default maximum line length in bytes
pub const DEFAULT_MAX_LINE_LEN: usize = 256;

/// Incremental line framer
#[derive(Debug, Clone)]
pub struct LineFramer {
    buffer: Vec<u8>,
    ready: VecDeque<String>,
    max_line_len: usize,
    discarding: bool,
    dropped: usize,
}

impl LineFramer {
    /// Create a framer with the given line cap (at least 1)
    pub fn new(max_line_len: usize) -> Self {
        let max_line_len = max_line_len.max(1);
        Self {
            buffer: Vec::with_capacity(max_line_len),
            ready: VecDeque::new(),
            max_line_len,
            discarding: false,
            dropped: 0,
        }
    }

    /// Maximum line length
    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    /// Append received bytes; completed lines become available from
    /// [`next_line`](Self::next_line)
    pub fn push(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.discarding {
                match byte {
                    b'\n' => self.discarding = false,
                    b'<' => {
                        self.discarding = false;
                        self.buffer.push(byte);
                    }
                    _ => self.dropped += 1,
                }
                continue;
            }

            if byte == b'\n' {
                self.finish_line();
                continue;
            }

            self.buffer.push(byte);
            // A trailing `\r` is part of the terminator, not the line
            let line_len = self.buffer.len() - usize::from(byte == b'\r');
            if line_len > self.max_line_len {
                tracing::warn!(
                    "Discarding oversize line ({} bytes without terminator)",
                    self.buffer.len()
                );
                self.dropped += self.buffer.len();
                self.buffer.clear();
                self.discarding = true;
            }
        }
    }

    /// Next complete line, without terminator
    pub fn next_line(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    /// Drain complete lines lazily
    pub fn lines(&mut self) -> impl Iterator<Item = String> + '_ {
        std::iter::from_fn(move || self.next_line())
    }

    /// Bytes discarded since the last call
    pub fn take_dropped(&mut self) -> usize {
        std::mem::take(&mut self.dropped)
    }

    /// Length of the buffered partial line
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the framer is skipping an oversize line
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Drop buffered input and completed lines
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.ready.clear();
        self.discarding = false;
        self.dropped = 0;
    }

    fn finish_line(&mut self) {
        if self.buffer.last() == Some(&b'\r') {
            self.buffer.pop();
        }
        let line = String::from_utf8_lossy(&self.buffer);
        if !line.trim().is_empty() {
            tracing::trace!("rx: {}", line);
            self.ready.push_back(line.into_owned());
        }
        self.buffer.clear();
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}
