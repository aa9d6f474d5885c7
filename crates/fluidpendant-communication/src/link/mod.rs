//! Link management: outbound line tracking and liveness

pub mod liveness;
pub mod writer;

pub use liveness::{LinkTransition, LivenessMonitor};
pub use writer::{LinkWriter, SendOptions, SendPolicy};
