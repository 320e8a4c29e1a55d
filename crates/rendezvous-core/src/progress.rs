//! # Progress Reporting
//!
//! Observable events of a coordinated run and the sinks that consume them.
//!
//! The debugger harness only sees stdout, and matches it by substring. The
//! [`StdoutSink`] prints exactly the lines the harness looks for:
//!
//! ```text
//! Starting 2 worker threads
//! Thread 0 incremented counter to 1
//! Thread 1 incremented counter to 2
//! Final counter value: 2
//! ```
//!
//! Barrier releases are not part of that contract and only go to `tracing`.
//! [`RecordingSink`] keeps every event in order, which is what the tests use
//! to check that each worker's increment follows its release.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::barrier::Phase;

/// Who passed the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Participant
{
    /// The thread that spawned the workers (the "+1" participant)
    Coordinator,
    /// Worker thread with the given ordinal
    Worker(usize),
}

impl fmt::Display for Participant
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Participant::Coordinator => write!(f, "coordinator"),
            Participant::Worker(index) => write!(f, "worker {index}"),
        }
    }
}

/// Something that happened during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent
{
    /// The coordinator is about to spawn `workers` threads
    Started
    {
        /// Number of worker threads
        workers: usize,
    },
    /// A participant returned from `Barrier::wait`
    Released
    {
        /// Who was released
        participant: Participant,
        /// Phase that completed
        phase: Phase,
    },
    /// A worker finished its critical section
    Incremented
    {
        /// Worker ordinal
        worker: usize,
        /// Counter value right after this worker's increment
        value: u64,
    },
    /// All workers joined; the aggregate is final
    Finished
    {
        /// Final counter value
        value: u64,
    },
}

impl ProgressEvent
{
    /// The stdout line the harness expects for this event, if any
    pub fn harness_line(&self) -> Option<String>
    {
        match self {
            ProgressEvent::Started { workers } => Some(format!("Starting {workers} worker threads")),
            ProgressEvent::Incremented { worker, value } => {
                Some(format!("Thread {worker} incremented counter to {value}"))
            }
            ProgressEvent::Finished { value } => Some(format!("Final counter value: {value}")),
            ProgressEvent::Released { .. } => None,
        }
    }
}

/// Consumer of progress events
///
/// Sinks are shared by every worker thread, so implementations must be
/// `Send + Sync` and must not assume events arrive from a single thread.
pub trait ProgressSink: Send + Sync
{
    /// Handle one event
    fn report(&self, event: ProgressEvent);
}

/// Prints harness lines to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ProgressSink for StdoutSink
{
    fn report(&self, event: ProgressEvent)
    {
        let Some(line) = event.harness_line() else {
            debug!(?event, "progress");
            return;
        };

        // A closed pipe (`threaded | head -1`) must not take a worker down
        if let Err(e) = writeln!(io::stdout().lock(), "{line}") {
            warn!(error = %e, line = %line, "failed to write progress line");
        }
    }
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink
{
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink
{
    /// Create an empty sink
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<ProgressEvent>
    {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ProgressSink for RecordingSink
{
    fn report(&self, event: ProgressEvent)
    {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_harness_lines()
    {
        assert_eq!(
            ProgressEvent::Started { workers: 2 }.harness_line().as_deref(),
            Some("Starting 2 worker threads")
        );
        assert_eq!(
            ProgressEvent::Incremented { worker: 1, value: 2 }.harness_line().as_deref(),
            Some("Thread 1 incremented counter to 2")
        );
        assert_eq!(
            ProgressEvent::Finished { value: 2 }.harness_line().as_deref(),
            Some("Final counter value: 2")
        );
    }

    #[test]
    fn test_release_is_not_a_harness_line()
    {
        let event = ProgressEvent::Released { participant: Participant::Worker(0), phase: Phase(0) };
        assert!(event.harness_line().is_none());
    }

    #[test]
    fn test_recording_sink_keeps_order()
    {
        let sink = RecordingSink::new();
        sink.report(ProgressEvent::Started { workers: 1 });
        sink.report(ProgressEvent::Finished { value: 1 });
        assert_eq!(
            sink.events(),
            vec![ProgressEvent::Started { workers: 1 }, ProgressEvent::Finished { value: 1 }]
        );
    }

    #[test]
    fn test_participant_display()
    {
        assert_eq!(Participant::Coordinator.to_string(), "coordinator");
        assert_eq!(Participant::Worker(3).to_string(), "worker 3");
    }
}
