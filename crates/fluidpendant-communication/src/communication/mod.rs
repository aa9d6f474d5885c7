//! Byte transport to the controller
//!
//! The engine never opens a port itself. The host supplies a [`Transport`];
//! this module provides the serial implementation and an in-memory one for
//! hosts without hardware and for tests.

pub mod framer;
pub mod serial;

use std::collections::VecDeque;
use std::io;

pub use framer::LineFramer;
pub use serial::{list_ports, SerialPortInfo, SerialTransport};

/// Duplex, non-blocking byte stream
pub trait Transport {
    /// Read whatever bytes are available into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is available. Must not block.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data`
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_available(buf)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }
}

/// In-memory transport with scripted input and recorded output
///
/// Each pushed chunk is delivered by one read (split if the read buffer is
/// smaller), so tests control exactly how bytes arrive per poll.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Vec<u8>>,
    writes: Vec<Vec<u8>>,
    fail_writes: bool,
}

impl MemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be read
    pub fn push_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        if !bytes.is_empty() {
            self.inbound.push_back(bytes);
        }
    }

    /// Queue a line followed by `\n`
    pub fn push_line(&mut self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.inbound.push_back(bytes);
    }

    /// Number of queued chunks not yet read
    pub fn pending_chunks(&self) -> usize {
        self.inbound.len()
    }

    /// Make subsequent writes fail with `BrokenPipe`
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Every write call, in order
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// All written bytes concatenated
    pub fn sent(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Line commands written, without terminators
    pub fn sent_lines(&self) -> Vec<String> {
        self.writes
            .iter()
            .filter_map(|w| w.strip_suffix(b"\n"))
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Single-byte realtime writes
    pub fn sent_realtime(&self) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|w| w.len() == 1 && w[0] != b'\n')
            .map(|w| w[0])
            .collect()
    }

    /// Forget recorded writes
    pub fn clear_sent(&mut self) {
        self.writes.clear();
    }
}

impl Transport for MemoryTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(chunk) = self.inbound.front_mut() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n == chunk.len() {
            self.inbound.pop_front();
        } else {
            chunk.drain(..n);
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "transport closed"));
        }
        self.writes.push(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_chunks() {
        let mut t = MemoryTransport::new();
        t.push_bytes(b"<Idle".to_vec());
        t.push_line("|MPos:0,0,0>");

        let mut buf = [0u8; 3];
        assert_eq!(t.read_available(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"<Id");
        assert_eq!(t.read_available(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"le");

        let mut big = [0u8; 64];
        let n = t.read_available(&mut big).unwrap();
        assert_eq!(&big[..n], b"|MPos:0,0,0>\n");
        assert_eq!(t.read_available(&mut big).unwrap(), 0);
    }

    #[test]
    fn test_memory_transport_records_writes() {
        let mut t = MemoryTransport::new();
        t.write_all(b"$H\n").unwrap();
        t.write_all(&[0x18]).unwrap();
        assert_eq!(t.sent_lines(), vec!["$H".to_string()]);
        assert_eq!(t.sent_realtime(), vec![0x18]);
        assert_eq!(t.sent(), b"$H\n\x18".to_vec());

        t.set_fail_writes(true);
        assert!(t.write_all(b"?").is_err());
    }
}
