//! # Barrier
//!
//! A reusable counting barrier built from a mutex and a condition variable.
//!
//! A barrier is created for a fixed number of participants (its *capacity*).
//! Each participant calls [`Barrier::wait`]; every caller blocks until the
//! last one arrives, then all of them are released together and the barrier
//! resets itself for the next phase.
//!
//! ## Why a phase counter?
//!
//! A condition variable may wake a thread that nobody notified (a spurious
//! wakeup), and on a reused barrier a slow waiter can wake up after a fresh
//! round has already started filling `arrived` again. Checking `arrived`
//! alone cannot tell these cases apart. Each waiter therefore remembers the
//! phase it arrived in and only returns once the barrier's phase has moved
//! past it:
//!
//! ```text
//! lock
//! my_phase = phase
//! arrived += 1
//! if arrived == capacity:
//!     arrived = 0; phase += 1; notify_all      (leader, returns at once)
//! else:
//!     while phase == my_phase: wait            (releases lock while parked)
//! unlock
//! ```
//!
//! ## Lifecycle
//!
//! A barrier has no timeout and no cancellation. A participant that never
//! arrives blocks its peers forever; the fixture relies on this to show why a
//! breakpoint placed before the barrier deadlocks every other thread.
//!
//! Destroying a barrier while a participant is blocked inside `wait` is
//! undefined in the pthread world. Here it cannot be expressed: a blocked
//! participant borrows the barrier (usually through an `Arc`), so
//! [`Barrier::destroy`] is only reachable once every participant has been
//! joined.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//!
//! use rendezvous_core::Barrier;
//!
//! let barrier = Arc::new(Barrier::new(3)?);
//! let handles: Vec<_> = (0..2)
//!     .map(|_| {
//!         let barrier = Arc::clone(&barrier);
//!         thread::spawn(move || barrier.wait())
//!     })
//!     .collect();
//!
//! barrier.wait()?;
//! for handle in handles {
//!     handle.join().expect("participant panicked")?;
//! }
//!
//! let barrier = Arc::try_unwrap(barrier).expect("all participants joined");
//! assert_eq!(barrier.destroy()?.0, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use tracing::{debug, trace};

use crate::error::{InitializationError, UsageError};
use crate::sync::{Condvar, Mutex};

/// Generation number of a barrier
///
/// Phase `0` is the first rendezvous. The barrier's phase is advanced by one
/// each time a rendezvous completes, so after `n` completed rendezvous the
/// barrier reports phase `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Phase(pub u64);

impl fmt::Display for Phase
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Phase
{
    fn from(phase: u64) -> Self
    {
        Phase(phase)
    }
}

/// Outcome of a single [`Barrier::wait`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult
{
    phase: Phase,
    leader: bool,
}

impl BarrierWaitResult
{
    /// The phase this caller took part in (the one that just completed)
    pub fn phase(&self) -> Phase
    {
        self.phase
    }

    /// Whether this caller's arrival completed the phase
    ///
    /// Exactly one participant per phase is the leader. It never blocks: it
    /// resets the barrier, wakes everyone else and returns immediately.
    pub fn is_leader(&self) -> bool
    {
        self.leader
    }
}

/// State guarded by the barrier's lock
struct BarrierState
{
    /// Participants that called `wait` in the current phase
    arrived: usize,
    /// Completed rendezvous so far
    phase: u64,
}

/// Reusable rendezvous point for a fixed number of participants
pub struct Barrier
{
    state: Mutex<BarrierState>,
    released: Condvar,
    capacity: usize,
}

impl Barrier
{
    /// Create a barrier for `capacity` participants per phase.
    ///
    /// ## Errors
    ///
    /// Returns [`InitializationError::ZeroCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, InitializationError>
    {
        if capacity == 0 {
            return Err(InitializationError::ZeroCapacity);
        }

        debug!(capacity, "barrier created");
        Ok(Self {
            state: Mutex::new(BarrierState { arrived: 0, phase: 0 }),
            released: Condvar::new(),
            capacity,
        })
    }

    /// Participants required per phase
    pub fn capacity(&self) -> usize
    {
        self.capacity
    }

    /// Number of completed rendezvous so far
    ///
    /// ## Errors
    ///
    /// Returns [`UsageError::Poisoned`] if a participant panicked while
    /// holding the barrier's lock.
    pub fn phase(&self) -> Result<Phase, UsageError>
    {
        let state = self.state.lock().map_err(|_| poisoned())?;
        Ok(Phase(state.phase))
    }

    /// Block until `capacity` participants have called `wait` in this phase.
    ///
    /// The participant whose arrival completes the phase becomes the leader:
    /// it resets the arrival count, advances the phase, wakes every blocked
    /// participant and returns without blocking. Everyone else parks on the
    /// condition variable and only returns once the phase has advanced past
    /// the one they arrived in.
    ///
    /// At most `capacity` participants may be inside `wait` at once. Calling
    /// `wait` from more threads than that lets the surplus callers spill into
    /// the next phase.
    ///
    /// ## Errors
    ///
    /// Returns [`UsageError::Poisoned`] if a participant panicked while
    /// holding the barrier's lock.
    pub fn wait(&self) -> Result<BarrierWaitResult, UsageError>
    {
        let mut state = self.state.lock().map_err(|_| poisoned())?;
        let my_phase = state.phase;
        state.arrived += 1;
        trace!(phase = my_phase, arrived = state.arrived, capacity = self.capacity, "participant arrived");

        if state.arrived == self.capacity {
            state.arrived = 0;
            state.phase += 1;
            self.released.notify_all();
            debug!(phase = my_phase, capacity = self.capacity, "rendezvous complete, releasing participants");
            return Ok(BarrierWaitResult { phase: Phase(my_phase), leader: true });
        }

        // Spurious wakeups and wakeups meant for another generation loop back here
        while state.phase == my_phase {
            state = self.released.wait(state).map_err(|_| poisoned())?;
        }

        trace!(phase = my_phase, "participant released");
        Ok(BarrierWaitResult { phase: Phase(my_phase), leader: false })
    }

    /// Tear the barrier down, returning the number of completed rendezvous.
    ///
    /// Consuming `self` releases the lock and the condition variable. Callers
    /// holding the barrier in an `Arc` must join every participant and
    /// `Arc::try_unwrap` it first.
    ///
    /// ## Errors
    ///
    /// - [`UsageError::ActiveWaiters`] if some participants arrived in a phase
    ///   that never completed.
    /// - [`UsageError::Poisoned`] if a participant panicked while holding the
    ///   barrier's lock.
    pub fn destroy(self) -> Result<Phase, UsageError>
    {
        let (arrived, phase) = {
            let state = self.state.lock().map_err(|_| poisoned())?;
            (state.arrived, state.phase)
        };

        if arrived != 0 {
            return Err(UsageError::ActiveWaiters { arrived });
        }

        debug!(phases = phase, "barrier destroyed");
        Ok(Phase(phase))
    }
}

impl fmt::Debug for Barrier
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Barrier").field("capacity", &self.capacity).finish_non_exhaustive()
    }
}

fn poisoned() -> UsageError
{
    UsageError::Poisoned { resource: "barrier" }
}
