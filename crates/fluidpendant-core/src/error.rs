//! Error handling for FluidPendant
//!
//! Provides error types for the layers of the protocol engine:
//! - Command errors (a line rejected before it reaches the wire)
//! - Connection errors (opening and driving the byte transport)
//!
//! Nothing here is fatal to the engine. Protocol-level failures (`error:<n>`,
//! alarms, timeouts, link loss) are reported as state and command outcomes,
//! not as `Err` values.

use thiserror::Error;

/// Command error type
///
/// Returned when a line command cannot be accepted for transmission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A line is already awaiting acknowledgement and the policy is reject-if-busy
    #[error("A line command is already outstanding")]
    Busy,

    /// The line is empty after trimming
    #[error("Line command is empty")]
    EmptyLine,

    /// The line contains a newline or carriage return
    #[error("Line command contains an embedded line terminator")]
    EmbeddedNewline,

    /// The line contains bytes outside printable ASCII
    #[error("Line command contains non-ASCII characters")]
    NonAscii,

    /// The line exceeds the controller's line buffer
    #[error("Line command is {len} bytes, maximum is {max}")]
    LineTooLong {
        /// Length of the rejected line in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Connection error type
///
/// Represents errors related to the byte transport to the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// I/O error on an open transport
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Main error type for FluidPendant
#[derive(Error, Debug)]
pub enum Error {
    /// Command error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the line was rejected because another line is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Command(CommandError::Busy))
    }

    /// Check if this is a connection or I/O error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Io(_))
    }

    /// Check if this is a command validation error
    pub fn is_command_error(&self) -> bool {
        matches!(self, Error::Command(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_classification() {
        let err: Error = CommandError::Busy.into();
        assert!(err.is_busy());
        assert!(err.is_command_error());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_io_is_connection_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.is_connection_error());
        assert!(!err.is_busy());
    }

    #[test]
    fn test_line_too_long_message() {
        let err = CommandError::LineTooLong { len: 300, max: 255 };
        assert_eq!(err.to_string(), "Line command is 300 bytes, maximum is 255");
    }
}
