//! Integration tests for the blocking lane's admission/completion race
//! resolution and backpressure policies.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use corelane::lane::{Backpressure, Deadline, Lane, LaneConfig, LaneError, Outcome};
use corelane::LifecycleError;
use tokio_util::sync::CancellationToken;

const THREAD_COUNT: usize = 8;
const OPS_PER_THREAD: usize = 200;

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

// ============================================================================
// Admission and completion happy path
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_submissions_all_complete() {
    let lane: Lane<u64, Infallible> = Lane::new(LaneConfig::new().with_worker_count(4).with_queue_capacity(32)).unwrap();
    let cancel = cancel();

    let mut handles = Vec::new();
    for i in 0..200u64 {
        let cancel = cancel.clone();
        let outcome = lane.run(Deadline::None, &cancel, move || Ok(i * 2));
        handles.push(outcome);
    }
    let results = futures_join_all(handles).await;
    let mut values: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().success().unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, (0..200u64).map(|i| i * 2).collect::<Vec<_>>());
    lane.join();
}

async fn futures_join_all<F: std::future::Future>(futures: Vec<F>) -> Vec<F::Output> {
    let mut results = Vec::with_capacity(futures.len());
    for f in futures {
        results.push(f.await);
    }
    results
}

// ============================================================================
// Completion-wins race: cancel fires after the worker has already recorded a
// completion, but before the submitter has re-acquired the lock to check.
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_cancellation_after_completion_does_not_override_success() {
    let lane: Lane<u64, Infallible> = Lane::new(LaneConfig::new().with_worker_count(1)).unwrap();
    let cancel_token = cancel();

    let outcome = lane.run(Deadline::None, &cancel_token, || Ok(7)).await.unwrap();
    // Cancelling after the call has already resolved is a no-op; it must not
    // retroactively change an outcome that was already delivered.
    cancel_token.cancel();
    assert!(matches!(outcome, Outcome::Success(7)));
    lane.join();
}

// ============================================================================
// Backpressure policies
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fail_fast_rejects_once_queue_is_full() {
    let config = LaneConfig::new()
        .with_worker_count(1)
        .with_queue_capacity(1)
        .with_backpressure(Backpressure::FailFast);
    let lane: Lane<(), Infallible> = Lane::new(config).unwrap();
    let cancel = cancel();

    let gate = Arc::new(Mutex::new(Some(std::sync::mpsc::channel::<()>())));
    let (block_tx, block_rx) = {
        let (tx, rx) = gate.lock().unwrap().take().unwrap();
        (tx, rx)
    };
    let block_rx = Arc::new(Mutex::new(Some(block_rx)));
    let job_rx = Arc::clone(&block_rx);
    let occupying = lane.run(Deadline::None, &cancel, move || {
        job_rx.lock().unwrap().take().unwrap().recv().ok();
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let queued = lane.run(Deadline::None, &cancel, || Ok(()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let rejected = lane.run(Deadline::None, &cancel, || Ok(())).await.unwrap();
    assert!(matches!(rejected, Outcome::Domain(LaneError::QueueFull { capacity: 1 })));

    block_tx.send(()).unwrap();
    occupying.await.unwrap();
    queued.await.unwrap();
    lane.join();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overloaded_when_admission_waiters_are_full() {
    let config = LaneConfig::new()
        .with_worker_count(1)
        .with_queue_capacity(1)
        .with_admission_waiters_capacity(1)
        .with_backpressure(Backpressure::Suspend);
    let lane: Lane<(), Infallible> = Lane::new(config).unwrap();
    let cancel = cancel();

    let (block_tx, block_rx) = std::sync::mpsc::channel::<()>();
    let block_rx = Arc::new(Mutex::new(Some(block_rx)));
    let job_rx = Arc::clone(&block_rx);
    let occupying = lane.run(Deadline::None, &cancel, move || {
        job_rx.lock().unwrap().take().unwrap().recv().ok();
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    // This one fills the single queue slot's only admission waiter seat.
    let waiting = lane.run(Deadline::None, &cancel, || Ok(()));
    tokio::time::sleep(Duration::from_millis(20)).await;

    let overloaded = lane.run(Deadline::None, &cancel, || Ok(())).await.unwrap();
    assert!(matches!(
        overloaded,
        Outcome::Domain(LaneError::Overloaded { admission_waiters_capacity: 1 })
    ));

    block_tx.send(()).unwrap();
    occupying.await.unwrap();
    waiting.await.unwrap();
    lane.join();
}

// ============================================================================
// Stress: ticket uniqueness and completion accounting under load
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stress_completions_match_submissions() {
    let lane: Lane<usize, Infallible> = Lane::new(
        LaneConfig::new()
            .with_worker_count(4)
            .with_queue_capacity(16)
            .with_admission_waiters_capacity(1024)
            .with_backpressure(Backpressure::Suspend),
    )
    .unwrap();
    let cancel = cancel();
    let completed = Arc::new(AtomicU64::new(0));

    let mut futures = Vec::new();
    for _ in 0..THREAD_COUNT {
        for i in 0..OPS_PER_THREAD {
            let cancel = cancel.clone();
            let completed = Arc::clone(&completed);
            futures.push(async {
                let outcome = lane.run(Deadline::None, &cancel, move || Ok(i)).await.unwrap();
                if outcome.is_success() {
                    completed.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    }
    for f in futures {
        f.await;
    }
    assert_eq!(completed.load(Ordering::Relaxed), (THREAD_COUNT * OPS_PER_THREAD) as u64);
    lane.join();
}

// ============================================================================
// Deadlines
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_immediate_fails_if_admission_would_block() {
    let config = LaneConfig::new()
        .with_worker_count(1)
        .with_queue_capacity(1)
        .with_backpressure(Backpressure::FailFast);
    let lane: Lane<(), Infallible> = Lane::new(config).unwrap();
    let cancel = cancel();

    let (block_tx, block_rx) = std::sync::mpsc::channel::<()>();
    let block_rx = Arc::new(Mutex::new(Some(block_rx)));
    let job_rx = Arc::clone(&block_rx);
    let occupying = lane.run(Deadline::None, &cancel, move || {
        job_rx.lock().unwrap().take().unwrap().recv().ok();
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let immediate = lane.run_immediate(&cancel, || Ok(())).await.unwrap();
    assert!(matches!(immediate, Outcome::Domain(LaneError::QueueFull { .. })));

    block_tx.send(()).unwrap();
    occupying.await.unwrap();
    lane.join();
}

// ============================================================================
// Shutdown draining: a running job still delivers its real outcome, but a
// merely-queued job (never dequeued by a worker) is drained as a lifecycle
// failure instead of being started.
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_drains_queued_job_but_lets_running_job_finish() {
    let config = LaneConfig::new()
        .with_worker_count(1)
        .with_queue_capacity(2)
        .with_backpressure(Backpressure::FailFast);
    let lane = Arc::new(Lane::<(), Infallible>::new(config).unwrap());

    let (block_tx, block_rx) = std::sync::mpsc::channel::<()>();
    let block_rx = Arc::new(Mutex::new(Some(block_rx)));
    let job_rx = Arc::clone(&block_rx);
    let lane_for_running = Arc::clone(&lane);
    let running = tokio::spawn(async move {
        let cancel = cancel();
        lane_for_running
            .run(Deadline::None, &cancel, move || {
                job_rx.lock().unwrap().take().unwrap().recv().ok();
                Ok(())
            })
            .await
    });
    // Give the single worker a moment to dequeue and start running this job.
    tokio::time::sleep(Duration::from_millis(20)).await;

    // This one is admitted into the queue but the worker is still busy
    // running the job above, so it never gets dequeued before shutdown.
    let lane_for_queued = Arc::clone(&lane);
    let queued = tokio::spawn(async move {
        let cancel = cancel();
        lane_for_queued.run(Deadline::None, &cancel, || Ok(())).await
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    lane.shutdown();

    let queued_outcome = queued.await.unwrap();
    assert!(matches!(queued_outcome, Err(LifecycleError::ShutdownInProgress)));

    block_tx.send(()).unwrap();
    let running_outcome = running.await.unwrap().unwrap();
    assert!(matches!(running_outcome, Outcome::Success(())));

    let lane = Arc::try_unwrap(lane).ok().expect("no other Lane handles should remain");
    lane.join();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_in_the_past_resolves_immediately() {
    let lane: Lane<(), Infallible> = Lane::new(LaneConfig::new().with_worker_count(1)).unwrap();
    let cancel = cancel();
    let past = Deadline::At(Instant::now() - Duration::from_secs(1));

    let (block_tx, block_rx) = std::sync::mpsc::channel::<()>();
    let block_rx = Arc::new(Mutex::new(Some(block_rx)));
    let job_rx = Arc::clone(&block_rx);
    let occupying = lane.run(Deadline::None, &cancel, move || {
        job_rx.lock().unwrap().take().unwrap().recv().ok();
        Ok(())
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let outcome = lane.run(past, &cancel, || Ok(())).await.unwrap();
    assert!(matches!(outcome, Outcome::Domain(LaneError::DeadlineExceeded)));

    block_tx.send(()).unwrap();
    occupying.await.unwrap();
    lane.join();
}
