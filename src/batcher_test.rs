//! Tests for the batching orchestrator and worker pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::Batcher;
use crate::config::Options;
use crate::error::Error;
use crate::event::Event;
use crate::metrics::ClientMetrics;
use crate::transport::Transport;

/// Transport that records every delivered batch.
#[derive(Default)]
struct RecordingTransport {
    batches: Mutex<Vec<Vec<Event>>>,
}

impl RecordingTransport {
    fn batches(&self) -> Vec<Vec<Event>> {
        self.batches.lock().unwrap().clone()
    }

    fn total_events(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver(&self, batch: &[Event]) -> Result<(), Error> {
        self.batches.lock().unwrap().push(batch.to_vec());
        Ok(())
    }
}

/// Transport that fails every delivery.
#[derive(Default)]
struct FailingTransport {
    attempts: AtomicU64,
}

#[async_trait]
impl Transport for FailingTransport {
    async fn deliver(&self, _batch: &[Event]) -> Result<(), Error> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(Error::Server {
            status: 500,
            message: "unavailable".into(),
        })
    }
}

fn test_options(max_batch_size: usize, max_batch_wait: Duration) -> Options {
    Options::new("test-key")
        .with_max_batch_size(max_batch_size)
        .with_max_batch_wait(max_batch_wait)
        .with_worker_count(2)
        .with_queue_size(8)
}

fn make_batcher(options: &Options, transport: Arc<dyn Transport>) -> (Batcher, Arc<ClientMetrics>) {
    let metrics = Arc::new(ClientMetrics::new());
    let batcher = Batcher::new(options, transport, Arc::clone(&metrics));
    (batcher, metrics)
}

fn ev(name: &str) -> Event {
    Event::new(name)
}

// ============================================================================
// Flush triggers
// ============================================================================

#[tokio::test]
async fn test_size_threshold_triggers_dispatch() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(3, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.add(ev("a")).await;
    batcher.add(ev("b")).await;
    batcher.add(ev("c")).await;
    batcher.wait().await;

    // Exactly one batch of 3, without any manual flush or timer
    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_time_trigger_flushes_partial_batch() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(1000, Duration::from_millis(50));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.add(ev("lonely")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    batcher.wait().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timer_never_dispatches_empty_batches() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(1000, Duration::from_millis(10));
    let (batcher, metrics) = make_batcher(&options, transport.clone());

    // Let the timer tick many times against an empty buffer
    tokio::time::sleep(Duration::from_millis(100)).await;
    batcher.wait().await;

    assert!(transport.batches().is_empty());
    assert_eq!(metrics.snapshot().batches_dispatched, 0);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_flush_resets_timer_window() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(1000, Duration::from_millis(100));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.add(ev("first")).await;
    tokio::time::sleep(Duration::from_millis(60)).await;

    // Manual flush at t=60ms restarts the window; the original t=100ms
    // deadline must no longer apply to the next event.
    batcher.flush().await;
    batcher.wait().await;
    assert_eq!(transport.batches().len(), 1);

    batcher.add(ev("second")).await;
    tokio::time::sleep(Duration::from_millis(70)).await; // t=130ms < 60+100
    assert_eq!(transport.batches().len(), 1, "window should not have elapsed yet");

    tokio::time::sleep(Duration::from_millis(50)).await; // past t=160ms
    batcher.wait().await;
    assert_eq!(transport.batches().len(), 2);
}

// ============================================================================
// Flush / wait semantics
// ============================================================================

#[tokio::test]
async fn test_flush_on_empty_buffer_is_noop() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(10, Duration::from_secs(60));
    let (batcher, metrics) = make_batcher(&options, transport.clone());

    batcher.flush().await;
    batcher.flush().await;
    batcher.wait().await;

    assert!(transport.batches().is_empty());
    assert_eq!(metrics.snapshot().batches_dispatched, 0);
}

#[tokio::test]
async fn test_flush_preserves_add_order() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(100, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.add(ev("e1")).await;
    batcher.add(ev("e2")).await;
    batcher.add(ev("e3")).await;
    batcher.flush().await;
    batcher.wait().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    let names: Vec<&str> = batches[0].iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["e1", "e2", "e3"]);
}

#[tokio::test]
async fn test_repeated_flush_wait_cycles() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(100, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    for round in 0..3 {
        batcher.add(ev(&format!("round-{round}"))).await;
        batcher.flush().await;
        batcher.wait().await;
    }
    batcher.wait().await;

    assert_eq!(transport.batches().len(), 3);
    assert_eq!(transport.total_events(), 3);
}

#[tokio::test]
async fn test_counter_conservation_under_concurrent_adds() {
    const TASKS: usize = 8;
    const EVENTS_PER_TASK: usize = 25;

    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(10, Duration::from_secs(60));
    let (batcher, metrics) = make_batcher(&options, transport.clone());
    let batcher = Arc::new(batcher);

    let mut handles = Vec::new();
    for t in 0..TASKS {
        let batcher = Arc::clone(&batcher);
        handles.push(tokio::spawn(async move {
            for i in 0..EVENTS_PER_TASK {
                batcher.add(Event::new(format!("t{t}-{i}"))).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    batcher.flush().await;
    batcher.wait().await;

    // Every accepted event appears in exactly one delivered batch
    assert_eq!(transport.total_events(), TASKS * EVENTS_PER_TASK);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_accepted, (TASKS * EVENTS_PER_TASK) as u64);
    assert_eq!(snapshot.events_delivered, snapshot.events_accepted);
}

#[tokio::test]
async fn test_concurrent_flushes_never_dispatch_empty() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(2, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());
    let batcher = Arc::new(batcher);

    // Interleave size-triggered dispatches with explicit flushes; the
    // racing drains must only ever produce non-empty batches.
    let adder = {
        let batcher = Arc::clone(&batcher);
        tokio::spawn(async move {
            for i in 0..100 {
                batcher.add(Event::new(format!("e{i}"))).await;
            }
        })
    };
    let flusher = {
        let batcher = Arc::clone(&batcher);
        tokio::spawn(async move {
            for _ in 0..50 {
                batcher.flush().await;
                tokio::task::yield_now().await;
            }
        })
    };
    adder.await.unwrap();
    flusher.await.unwrap();

    batcher.flush().await;
    batcher.wait().await;

    assert_eq!(transport.total_events(), 100);
    for batch in transport.batches() {
        assert!(!batch.is_empty(), "empty batch must never be dispatched");
    }
}

// ============================================================================
// Enable gate
// ============================================================================

#[tokio::test]
async fn test_disabled_add_is_pure_noop() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(2, Duration::from_secs(60));
    let (batcher, metrics) = make_batcher(&options, transport.clone());

    batcher.set_enabled(false);
    assert!(!batcher.is_enabled());

    for i in 0..10 {
        batcher.add(Event::new(format!("suppressed-{i}"))).await;
    }
    batcher.flush().await;

    // wait() must return immediately: nothing was counted as outstanding
    tokio::time::timeout(Duration::from_millis(100), batcher.wait())
        .await
        .expect("wait should not block after suppressed adds");

    assert!(transport.batches().is_empty());
    assert_eq!(metrics.snapshot().events_accepted, 0);
}

#[tokio::test]
async fn test_reenabled_client_accepts_again() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(100, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.set_enabled(false);
    batcher.add(ev("dropped")).await;
    batcher.set_enabled(true);
    batcher.add(ev("kept")).await;

    batcher.flush().await;
    batcher.wait().await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].name, "kept");
}

// ============================================================================
// Failure accounting and teardown
// ============================================================================

#[tokio::test]
async fn test_delivery_failure_still_completes_wait() {
    let transport = Arc::new(FailingTransport::default());
    let options = test_options(3, Duration::from_secs(60));
    let (batcher, metrics) = make_batcher(&options, transport.clone());

    batcher.add(ev("a")).await;
    batcher.add(ev("b")).await;
    batcher.add(ev("c")).await;

    // The attempt fails, but the events are still accounted as processed
    tokio::time::timeout(Duration::from_secs(5), batcher.wait())
        .await
        .expect("wait must terminate even when delivery fails");

    assert_eq!(transport.attempts.load(Ordering::Relaxed), 1);
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.events_failed, 3);
    assert_eq!(snapshot.events_delivered, 0);
}

#[tokio::test]
async fn test_close_delivers_buffered_events() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(100, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    batcher.add(ev("pending-1")).await;
    batcher.add(ev("pending-2")).await;
    batcher.close().await;

    // close() implies flush-then-wait: both events delivered before return
    assert_eq!(transport.total_events(), 2);
}

#[tokio::test]
async fn test_close_with_empty_buffer() {
    let transport = Arc::new(RecordingTransport::default());
    let options = test_options(100, Duration::from_secs(60));
    let (batcher, _) = make_batcher(&options, transport.clone());

    tokio::time::timeout(Duration::from_secs(1), batcher.close())
        .await
        .expect("close on an idle batcher should return promptly");
    assert!(transport.batches().is_empty());
}
