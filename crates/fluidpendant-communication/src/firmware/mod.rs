//! Firmware protocol implementations
//!
//! Supported controllers:
//! - FluidNC (and Grbl 1.1, which shares the line protocol)

pub mod fluidnc;

pub use fluidnc::{FluidResponse, RealtimeCommand, StatusReport};
