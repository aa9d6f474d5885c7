//! # FluidPendant Core
//!
//! Core types for FluidPendant: the machine state model that pendant
//! front-ends read, the events the protocol engine produces, and the error
//! types shared across crates.

pub mod data;
pub mod error;
pub mod event;
pub mod model;
pub mod snapshot;

pub use data::{
    AxisPosition, Banner, BufferState, FeedSpeed, GcodeModes, InfoMessage, JobProgress,
    MachineMode, OverridePercent, ProbeResult, SwitchBank, AXIS_LETTERS, MAX_AXES,
};

pub use error::{CommandError, ConnectionError, Error, Result};

pub use event::{CommandOutcome, CommandResult, CommandTicket, CompletionSink, EngineEvent};

pub use model::{FaultRecord, LastFault, MachineModel, ModeChange, PositionFrame};

pub use snapshot::{FaultSnapshot, MachineSnapshot};
