//! # Coordinator
//!
//! Runs the multithreaded fixture: `workers` threads plus the coordinator
//! meet at one [`Barrier`] of capacity `workers + 1`, then each worker bumps
//! the [`SharedCounter`] once inside a critical section.
//!
//! ## Protocol
//!
//! 1. Build the barrier and the counter.
//! 2. Report `Started`, then spawn every worker on a named thread
//!    (`worker-<i>`). A worker's first action is `Barrier::wait`.
//! 3. Call `Barrier::wait` from the coordinator. Workers cannot get past the
//!    barrier until the coordinator has reached it too.
//! 4. After release each worker increments the counter under its lock and
//!    reports the value outside the lock.
//! 5. Join every worker, report `Finished`, destroy the barrier.
//!
//! Steps 3 and 4 repeat once per round on the same barrier.
//!
//! ## Breakpoint markers
//!
//! The `BREAKPOINT_MARKER` comments below are looked up by the debugger's
//! test harness. Keep them verbatim and at the same logical points. The
//! `thread_entry` marker sits before the barrier: stopping one worker there
//! leaves every other participant parked in `wait` forever. The
//! `after_barrier` marker and everything in `worker_body` are safe.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::barrier::{Barrier, Phase};
use crate::counter::SharedCounter;
use crate::error::{InitializationError, Result, UsageError};
use crate::progress::{Participant, ProgressEvent, ProgressSink};

/// Worker threads spawned by the fixture when nothing else is configured
pub const DEFAULT_WORKERS: usize = 2;

/// Rendezvous rounds per run when nothing else is configured
pub const DEFAULT_ROUNDS: usize = 1;

/// Shape of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureConfig
{
    /// Worker threads to spawn; the barrier capacity is `workers + 1`
    pub workers: usize,
    /// Times every participant goes through the barrier
    pub rounds: usize,
}

impl Default for FixtureConfig
{
    fn default() -> Self
    {
        Self { workers: DEFAULT_WORKERS, rounds: DEFAULT_ROUNDS }
    }
}

impl FixtureConfig
{
    /// Barrier capacity for this configuration (workers plus the coordinator)
    ///
    /// `None` when `workers + 1` does not fit in a `usize`.
    pub fn capacity(&self) -> Option<usize>
    {
        self.workers.checked_add(1)
    }

    /// Counter value a correct run ends with
    pub fn expected_total(&self) -> u64
    {
        (self.workers as u64).saturating_mul(self.rounds as u64)
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary
{
    /// Configuration the run used
    pub config: FixtureConfig,
    /// Counter value after every worker was joined
    pub final_value: u64,
    /// Rendezvous the barrier completed
    pub phases: Phase,
}

/// Everything a worker thread owns
struct WorkerTask
{
    index: usize,
    rounds: usize,
    barrier: Arc<Barrier>,
    counter: Arc<SharedCounter>,
    sink: Arc<dyn ProgressSink>,
}

/// Spawns the workers, joins the barrier as the extra participant, and
/// aggregates the counter
pub struct Coordinator
{
    config: FixtureConfig,
    sink: Arc<dyn ProgressSink>,
}

impl Coordinator
{
    /// Create a coordinator reporting to `sink`
    pub fn new(config: FixtureConfig, sink: Arc<dyn ProgressSink>) -> Self
    {
        Self { config, sink }
    }

    /// The configuration this coordinator runs with
    pub fn config(&self) -> FixtureConfig
    {
        self.config
    }

    /// Execute one full run.
    ///
    /// ## Errors
    ///
    /// - [`InitializationError::TooManyWorkers`] if the barrier capacity
    ///   would overflow.
    /// - [`InitializationError::ThreadSpawn`] if a worker thread cannot be
    ///   created. The run is aborted on the spot: workers spawned so far stay
    ///   parked at the barrier (it can never fill up) and are expected to die
    ///   with the process.
    /// - [`UsageError`] if a lock was poisoned or a worker panicked. A worker
    ///   that fails still arrives at the barrier for its remaining rounds, so
    ///   the other participants finish and the failure surfaces at join.
    pub fn run(&self) -> Result<RunSummary>
    {
        let config = self.config;
        let capacity = config
            .capacity()
            .ok_or(InitializationError::TooManyWorkers { workers: config.workers })?;
        let barrier = Arc::new(Barrier::new(capacity)?);
        let counter = Arc::new(SharedCounter::new());
        info!(workers = config.workers, rounds = config.rounds, "starting run");

        // BREAKPOINT_MARKER: main_start
        self.sink.report(ProgressEvent::Started { workers: config.workers });

        let mut handles: Vec<JoinHandle<std::result::Result<(), UsageError>>> = Vec::new();
        for index in 0..config.workers {
            let task = WorkerTask {
                index,
                rounds: config.rounds,
                barrier: Arc::clone(&barrier),
                counter: Arc::clone(&counter),
                sink: Arc::clone(&self.sink),
            };
            let handle = thread::Builder::new()
                .name(format!("worker-{index}"))
                .spawn(move || thread_entry(&task))
                .map_err(|source| InitializationError::ThreadSpawn { index, source })?;
            handles.push(handle);
        }

        for _ in 0..config.rounds {
            // BREAKPOINT_MARKER: main_wait
            let released = barrier.wait()?;
            self.sink.report(ProgressEvent::Released { participant: Participant::Coordinator, phase: released.phase() });
        }

        for (index, handle) in handles.into_iter().enumerate() {
            handle.join().map_err(|_| UsageError::WorkerPanicked { index })??;
            debug!(worker = index, "joined");
        }

        let final_value = counter.value()?;
        if final_value != config.expected_total() {
            warn!(final_value, expected = config.expected_total(), "counter does not match participant count");
        }
        self.sink.report(ProgressEvent::Finished { value: final_value });

        let barrier = Arc::try_unwrap(barrier).map_err(|shared| UsageError::StillShared {
            handles: Arc::strong_count(&shared),
        })?;
        let phases = barrier.destroy()?;
        info!(final_value, phases = phases.0, "run complete");

        Ok(RunSummary { config, final_value, phases })
    }
}

/// Rounds a worker still owes the barrier
///
/// Dropping it with rounds outstanding (an early `?` return or a panic in the
/// sink) keeps arriving on the worker's behalf, so the coordinator and the
/// other workers are not left waiting for a participant that is gone.
struct OutstandingRounds<'a>
{
    barrier: &'a Barrier,
    remaining: usize,
}

impl OutstandingRounds<'_>
{
    /// Count one arrival, returning `false` once every round is used up
    fn take(&mut self) -> bool
    {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

impl Drop for OutstandingRounds<'_>
{
    fn drop(&mut self)
    {
        if self.remaining > 0 {
            warn!(remaining = self.remaining, "worker failed, arriving for its remaining rounds");
        }
        while self.take() {
            if self.barrier.wait().is_err() {
                break;
            }
        }
    }
}

fn thread_entry(task: &WorkerTask) -> std::result::Result<(), UsageError>
{
    let mut rounds = OutstandingRounds { barrier: &task.barrier, remaining: task.rounds };
    while rounds.take() {
        // BREAKPOINT_MARKER: thread_entry (BEFORE barrier - do NOT break here)
        // Breaking here causes deadlock: debugger stops this thread while other threads
        // wait for all workers + 1 threads (including stopped one) to reach barrier
        let released = task.barrier.wait()?;

        // BREAKPOINT_MARKER: after_barrier (SAFE to break here - all threads synchronized)
        task.sink.report(ProgressEvent::Released { participant: Participant::Worker(task.index), phase: released.phase() });
        worker_body(task.index, &task.counter, task.sink.as_ref())?;
    }
    Ok(())
}

// Called only after the barrier released this worker - safe to break here
// BREAKPOINT_MARKER: worker_body
#[inline(never)]
fn worker_body(thread_id: usize, counter: &SharedCounter, sink: &dyn ProgressSink) -> std::result::Result<(), UsageError>
{
    // BREAKPOINT_MARKER: worker_start
    let local_count = counter.increment()?;

    sink.report(ProgressEvent::Incremented { worker: thread_id, value: local_count });
    // BREAKPOINT_MARKER: worker_end
    Ok(())
}
