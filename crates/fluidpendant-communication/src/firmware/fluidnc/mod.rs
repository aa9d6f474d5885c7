//! FluidNC protocol support
//!
//! FluidNC speaks the Grbl 1.1 line protocol with a few extensions
//! (`SD:` job progress, `[MSG:LEVEL: ...]` messages, sub-state suffixes).

pub mod command_creator;
pub mod error_decoder;
pub mod realtime;
pub mod response_parser;
pub mod status_parser;

pub use command_creator::{axis_letter, format_number, validate_line};
pub use error_decoder::{describe_alarm, describe_error, format_alarm, format_error};
pub use realtime::RealtimeCommand;
pub use response_parser::FluidResponse;
pub use status_parser::{SdProgress, StatusReport};
