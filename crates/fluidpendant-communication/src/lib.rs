//! # FluidPendant Communication
//!
//! The FluidNC pendant protocol engine: byte transports, line framing,
//! response decoding, line command tracking, liveness, and the poll-driven
//! [`PendantEngine`] that ties them to the machine model.

pub mod communication;
pub mod engine;
pub mod firmware;
pub mod link;

pub use communication::{
    list_ports, LineFramer, MemoryTransport, SerialPortInfo, SerialTransport, Transport,
};
pub use engine::{EngineConfig, PendantEngine};
pub use firmware::fluidnc::{
    command_creator, describe_alarm, describe_error, FluidResponse, RealtimeCommand, SdProgress,
    StatusReport,
};
pub use link::{LinkTransition, LinkWriter, LivenessMonitor, SendOptions, SendPolicy};
