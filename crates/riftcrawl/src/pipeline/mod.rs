//! Step/director execution engine.
//!
//! A [`Director`] runs its [`Step`]s in a fixed order against one context.
//! Steps record one [`StepLog`] per unit of work (an API call, a validation
//! pass, a bulk write) and never fail as a whole; [`reduce`] turns the
//! resulting [`StepLogs`] into a [`LogSummary`].

pub mod control;
pub mod director;
pub mod error;
pub mod log;
pub mod pool;
pub mod sink;
pub mod step;
pub mod summary;

pub use control::RunControl;
pub use director::{Director, DirectorBuilder};
pub use error::PipelineError;
pub use log::{StepLog, StepLogs, StepStatus};
pub use pool::UnitResult;
pub use sink::{FanoutSink, LogSink, MemorySink, NoopSink, TracingSink};
pub use step::{timed, RunContext, RunScope, Step, UnitError};
pub use summary::{reduce, reduce_at, LogSummary, StepLogSummary};
