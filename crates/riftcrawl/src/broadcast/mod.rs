//! Broadcasting of step logs for live streaming to subscribers.

pub mod log_broadcaster;

pub use log_broadcaster::{StepLogBroadcaster, StepLogEvent};
