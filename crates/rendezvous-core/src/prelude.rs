//! Common module for library exports

pub use crate::barrier::{Barrier, BarrierWaitResult, Phase};
#[cfg(not(loom))]
pub use crate::coordinator::{Coordinator, FixtureConfig, RunSummary, DEFAULT_ROUNDS, DEFAULT_WORKERS};
pub use crate::counter::SharedCounter;
pub use crate::error::{InitializationError, RendezvousError, Result, UsageError};
pub use crate::progress::{Participant, ProgressEvent, ProgressSink, RecordingSink, StdoutSink};
