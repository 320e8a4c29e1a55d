//! # Error Types
//!
//! Error handling for the barrier, the shared counter and the coordinator.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! ## Error Categories
//!
//! 1. **Initialization errors**: the run could not be set up (zero-capacity
//!    barrier, a worker thread the OS refused to create). These are terminal:
//!    a fixture with fewer participants than expected produces a meaningless
//!    result, so nothing is retried.
//! 2. **Usage errors**: a contract was broken by the caller (destroying a
//!    barrier that still has arrivals counted, a participant that panicked
//!    while holding a lock). These indicate a bug, not a runtime condition.

use thiserror::Error;

/// The run could not be set up.
#[derive(Error, Debug)]
pub enum InitializationError
{
    /// A barrier needs at least one participant per phase
    #[error("Barrier capacity must be at least 1")]
    ZeroCapacity,

    /// `workers + 1` participants do not fit in a `usize`
    #[error("Too many workers: {workers} plus the coordinator overflows the barrier capacity")]
    TooManyWorkers
    {
        /// Requested worker count
        workers: usize,
    },

    /// The operating system refused to create a worker thread
    #[error("Failed to create thread {index}: {source}")]
    ThreadSpawn
    {
        /// Ordinal of the worker that could not be started
        index: usize,
        /// Error reported by `std::thread::Builder::spawn`
        #[source]
        source: std::io::Error,
    },
}

/// A caller broke the contract of a primitive.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError
{
    /// The barrier was destroyed while participants were still counted as
    /// arrived in an unfinished phase.
    ///
    /// Ownership normally rules this out: a blocked participant holds a
    /// reference to the barrier, so `destroy` cannot be reached until every
    /// participant has been joined.
    #[error("Barrier destroyed with {arrived} participant(s) still waiting")]
    ActiveWaiters
    {
        /// Participants counted in the unfinished phase
        arrived: usize,
    },

    /// The coordinator tried to destroy a barrier other handles still point to
    #[error("Barrier still shared by {handles} handle(s)")]
    StillShared
    {
        /// Strong references observed at destroy time
        handles: usize,
    },

    /// A participant panicked while holding the named lock
    #[error("Lock poisoned: {resource}")]
    Poisoned
    {
        /// Which lock was poisoned (`barrier` or `counter`)
        resource: &'static str,
    },

    /// A worker thread panicked before finishing its critical section
    #[error("Worker {index} panicked")]
    WorkerPanicked
    {
        /// Ordinal of the worker that panicked
        index: usize,
    },
}

/// Top-level error for a coordinated run
#[derive(Error, Debug)]
pub enum RendezvousError
{
    /// Setup failed; the run never started or was aborted
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// A primitive was misused
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Convenience type alias for `Result<T, RendezvousError>`
///
/// ```rust
/// use rendezvous_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, RendezvousError>;

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_initialization_converts_into_rendezvous_error()
    {
        let err: RendezvousError = InitializationError::ZeroCapacity.into();
        assert!(matches!(err, RendezvousError::Initialization(InitializationError::ZeroCapacity)));
    }

    #[test]
    fn test_usage_error_is_transparent()
    {
        let err: RendezvousError = UsageError::Poisoned { resource: "counter" }.into();
        assert_eq!(err.to_string(), "Lock poisoned: counter");
    }
}
