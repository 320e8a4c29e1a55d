//! Tests for the reusable barrier

#![cfg(not(loom))]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use rendezvous_core::{Barrier, InitializationError, Phase, UsageError};

/// Spawn `capacity` participants that each go through the barrier `rounds`
/// times, counting arrivals before every wait. Returns the leaders observed.
fn run_rounds(capacity: usize, rounds: usize) -> (Arc<Barrier>, usize)
{
    let barrier = Arc::new(Barrier::new(capacity).unwrap());
    let arrivals = Arc::new(AtomicUsize::new(0));
    let leaders = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..capacity)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let arrivals = Arc::clone(&arrivals);
            let leaders = Arc::clone(&leaders);
            thread::spawn(move || {
                for round in 0..rounds {
                    arrivals.fetch_add(1, Ordering::SeqCst);
                    let result = barrier.wait().unwrap();

                    // Nobody leaves a phase before every participant entered it
                    assert!(arrivals.load(Ordering::SeqCst) >= capacity * (round + 1));
                    assert_eq!(result.phase(), Phase(round as u64));
                    if result.is_leader() {
                        leaders.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let leaders = leaders.load(Ordering::SeqCst);
    (barrier, leaders)
}

#[test]
fn test_zero_capacity_is_initialization_error()
{
    let err = Barrier::new(0).unwrap_err();
    assert!(matches!(err, InitializationError::ZeroCapacity));
}

#[test]
fn test_capacity_is_fixed()
{
    let barrier = Barrier::new(3).unwrap();
    assert_eq!(barrier.capacity(), 3);
    assert_eq!(barrier.phase().unwrap(), Phase(0));
}

#[test]
fn test_no_release_before_last_arrival()
{
    for capacity in 1..=8 {
        let (barrier, leaders) = run_rounds(capacity, 1);
        assert_eq!(leaders, 1, "capacity {capacity}");
        assert_eq!(barrier.phase().unwrap(), Phase(1));
    }
}

#[test]
fn test_barrier_is_reusable()
{
    let (barrier, leaders) = run_rounds(5, 25);
    assert_eq!(leaders, 25);
    assert_eq!(barrier.phase().unwrap(), Phase(25));
}

#[test]
fn test_destroy_after_join()
{
    let (barrier, _) = run_rounds(3, 4);
    let barrier = Arc::try_unwrap(barrier).unwrap();
    assert_eq!(barrier.destroy(), Ok(Phase(4)));
}

#[test]
fn test_destroy_unused_barrier()
{
    assert_eq!(Barrier::new(2).unwrap().destroy(), Ok::<_, UsageError>(Phase(0)));
}
