//! Shared counter mutated by the workers' critical section.

use std::fmt;

use crate::error::UsageError;
use crate::sync::Mutex;

/// Integer protected by its own lock
///
/// The lock is separate from the barrier's: the barrier orders workers
/// relative to the coordinator, the counter only keeps increments from
/// overlapping. Any interleaving of increments is valid.
pub struct SharedCounter
{
    value: Mutex<u64>,
}

impl SharedCounter
{
    /// Create a counter starting at 0
    pub fn new() -> Self
    {
        Self { value: Mutex::new(0) }
    }

    /// Add one and return the post-increment value.
    ///
    /// The guard is dropped before returning, so anything the caller does
    /// with the value (printing it, for instance) happens outside the lock.
    ///
    /// ## Errors
    ///
    /// Returns [`UsageError::Poisoned`] if another thread panicked while
    /// holding the counter's lock.
    pub fn increment(&self) -> Result<u64, UsageError>
    {
        let mut value = self.value.lock().map_err(|_| poisoned())?;
        *value += 1;
        Ok(*value)
    }

    /// Current value
    ///
    /// ## Errors
    ///
    /// Returns [`UsageError::Poisoned`] if another thread panicked while
    /// holding the counter's lock.
    pub fn value(&self) -> Result<u64, UsageError>
    {
        let value = self.value.lock().map_err(|_| poisoned())?;
        Ok(*value)
    }
}

impl Default for SharedCounter
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl fmt::Debug for SharedCounter
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SharedCounter").finish_non_exhaustive()
    }
}

fn poisoned() -> UsageError
{
    UsageError::Poisoned { resource: "counter" }
}
