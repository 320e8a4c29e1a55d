//! # rendezvous-core
//!
//! Synchronization primitives and thread coordination behind the
//! multithreaded debugger fixture.
//!
//! This crate provides:
//! - [`Barrier`]: a reusable counting barrier built on a mutex, a condition
//!   variable and a phase counter
//! - [`SharedCounter`]: the integer the workers increment under mutual
//!   exclusion
//! - [`Coordinator`]: spawns the workers, joins the barrier as the extra
//!   participant, and reports the aggregate
//! - [`ProgressSink`]: where run events go (stdout for the harness, memory
//!   for tests)
//!
//! ## Model checking
//!
//! Building with `RUSTFLAGS="--cfg loom"` backs [`Barrier`] and
//! [`SharedCounter`] with `loom`'s primitives. The coordinator spawns real OS
//! threads and is left out of such builds.

pub mod barrier;
#[cfg(not(loom))]
pub mod coordinator;
pub mod counter;
pub mod error;
pub mod prelude;
pub mod progress;
mod sync;

pub use barrier::{Barrier, BarrierWaitResult, Phase};
#[cfg(not(loom))]
pub use coordinator::{Coordinator, FixtureConfig, RunSummary};
pub use counter::SharedCounter;
pub use error::{InitializationError, RendezvousError, Result, UsageError};
pub use progress::{Participant, ProgressEvent, ProgressSink, RecordingSink, StdoutSink};
