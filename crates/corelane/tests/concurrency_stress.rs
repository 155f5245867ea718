//! Stress tests for the move-only primitives and serial executors.
//!
//! These mirror the style (many threads, many operations each, assert on an
//! aggregate invariant) used to catch ordering and exactly-once races under
//! real contention rather than single-threaded unit coverage.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use corelane::executor::{ExecutorPool, SerialExecutor};
use corelane::handoff::HandoffCell;
use corelane::lane::TicketGenerator;

const THREAD_COUNT: usize = 8;
const OPS_PER_THREAD: usize = 500;

// ============================================================================
// HandoffCell
// ============================================================================

#[test]
fn stress_handoff_exactly_one_winner() {
    for _ in 0..OPS_PER_THREAD {
        let (_cell, token) = HandoffCell::new(());
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..THREAD_COUNT)
            .map(|_| {
                let token = token.clone();
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if token.take_if_stored().is_some() {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::Relaxed), 1);
    }
}

// ============================================================================
// TicketGenerator
// ============================================================================

#[test]
fn stress_ticket_generator_no_duplicates() {
    let generator = Arc::new(TicketGenerator::new());
    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|_| {
            let generator = Arc::clone(&generator);
            thread::spawn(move || (0..OPS_PER_THREAD).map(|_| generator.next()).collect::<Vec<_>>())
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for ticket in handle.join().unwrap() {
            assert!(seen.insert(ticket), "duplicate ticket issued: {ticket}");
        }
    }
    assert_eq!(seen.len(), THREAD_COUNT * OPS_PER_THREAD);
}

// ============================================================================
// SerialExecutor: FIFO ordering holds even under concurrent submitters
// ============================================================================

#[test]
fn stress_serial_executor_preserves_per_submitter_order() {
    let executor = Arc::new(SerialExecutor::new().unwrap());
    let observed: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..THREAD_COUNT)
        .map(|submitter| {
            let executor = Arc::clone(&executor);
            let observed = Arc::clone(&observed);
            thread::spawn(move || {
                for op in 0..OPS_PER_THREAD {
                    let observed = Arc::clone(&observed);
                    executor
                        .submit(move || {
                            observed.lock().unwrap().push((submitter, op));
                        })
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    Arc::into_inner(executor).expect("all submitter threads joined").join();

    let observed = observed.lock().unwrap();
    let mut last_op_per_submitter = vec![None; THREAD_COUNT];
    for &(submitter, op) in observed.iter() {
        if let Some(last) = last_op_per_submitter[submitter] {
            assert!(op > last, "submitter {submitter} saw op {op} after {last}");
        }
        last_op_per_submitter[submitter] = Some(op);
    }
    assert_eq!(observed.len(), THREAD_COUNT * OPS_PER_THREAD);
}

// ============================================================================
// ExecutorPool: every submitted job runs exactly once
// ============================================================================

#[test]
fn stress_executor_pool_runs_every_job_once() {
    let pool = ExecutorPool::new("corelane-stress-pool", 4).unwrap();
    let completed = Arc::new(AtomicUsize::new(0));

    for _ in 0..(THREAD_COUNT * OPS_PER_THREAD) {
        let completed = Arc::clone(&completed);
        pool.next().submit(move || {
            completed.fetch_add(1, Ordering::Relaxed);
        }).unwrap();
    }
    pool.join();
    assert_eq!(completed.load(Ordering::Relaxed), THREAD_COUNT * OPS_PER_THREAD);
}
