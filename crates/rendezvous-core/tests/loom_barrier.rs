//! Loom model tests for the barrier and the counter
//!
//! Run with `RUSTFLAGS="--cfg loom" cargo test -p rendezvous-core --test loom_barrier --release`.

#![cfg(loom)]

use loom::sync::atomic::{AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;
use rendezvous_core::{Barrier, Phase, SharedCounter};

#[test]
fn barrier_releases_only_after_all_arrive()
{
    loom::model(|| {
        let barrier = Arc::new(Barrier::new(3).unwrap());
        let arrivals = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let barrier = barrier.clone();
                let arrivals = arrivals.clone();
                thread::spawn(move || {
                    arrivals.fetch_add(1, Ordering::SeqCst);
                    barrier.wait().unwrap();
                    assert_eq!(arrivals.load(Ordering::SeqCst), 3);
                })
            })
            .collect();

        arrivals.fetch_add(1, Ordering::SeqCst);
        barrier.wait().unwrap();
        assert_eq!(arrivals.load(Ordering::SeqCst), 3);

        for handle in handles {
            handle.join().unwrap();
        }
    });
}

#[test]
fn barrier_reuse_does_not_leak_across_phases()
{
    loom::model(|| {
        let barrier = Arc::new(Barrier::new(2).unwrap());
        let arrivals = Arc::new(AtomicUsize::new(0));

        let peer = {
            let barrier = barrier.clone();
            let arrivals = arrivals.clone();
            thread::spawn(move || {
                for round in 0..2 {
                    arrivals.fetch_add(1, Ordering::SeqCst);
                    let result = barrier.wait().unwrap();
                    assert_eq!(result.phase(), Phase(round as u64));
                    assert!(arrivals.load(Ordering::SeqCst) >= 2 * (round + 1));
                }
            })
        };

        for round in 0..2 {
            arrivals.fetch_add(1, Ordering::SeqCst);
            let result = barrier.wait().unwrap();
            assert_eq!(result.phase(), Phase(round as u64));
            assert!(arrivals.load(Ordering::SeqCst) >= 2 * (round + 1));
        }

        peer.join().unwrap();
        assert_eq!(barrier.phase().unwrap(), Phase(2));
    });
}

#[test]
fn counter_increments_are_serialized()
{
    loom::model(|| {
        let counter = Arc::new(SharedCounter::new());

        let peer = {
            let counter = counter.clone();
            thread::spawn(move || counter.increment().unwrap())
        };

        let mine = counter.increment().unwrap();
        let theirs = peer.join().unwrap();

        let mut values = [mine, theirs];
        values.sort_unstable();
        assert_eq!(values, [1, 2]);
        assert_eq!(counter.value().unwrap(), 2);
    });
}
