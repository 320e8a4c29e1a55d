//! Lock and condition variable types used by the primitives.
//!
//! Normal builds use `std::sync`. Building with `RUSTFLAGS="--cfg loom"` swaps
//! in the `loom` model checker's versions so `tests/loom_barrier.rs` can
//! explore every interleaving of `Barrier::wait` and `SharedCounter::increment`.

#[cfg(loom)]
pub(crate) use loom::sync::{Condvar, Mutex};
#[cfg(not(loom))]
pub(crate) use std::sync::{Condvar, Mutex};
