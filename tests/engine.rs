use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use syncboard::clipboard::{Clipboard, MemoryClipboard};
use syncboard::engine::{EngineState, SyncEngine};
use syncboard::error::{ClipboardError, Result};
use syncboard::TickOutcome;

const TEST_INTERVAL: Duration = Duration::from_millis(50);

/// Build an engine over a fresh in-memory clipboard. Tests drive the detector
/// with `poll_once` instead of the background loop, so ticks are a logical
/// clock rather than wall time.
fn make_engine() -> (Arc<MemoryClipboard>, SyncEngine, UnboundedReceiver<String>) {
    let clipboard = Arc::new(MemoryClipboard::new());
    let (tx, rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(clipboard.clone(), tx, TEST_INTERVAL);
    (clipboard, engine, rx)
}

fn assert_no_event(rx: &mut UnboundedReceiver<String>) {
    assert!(rx.try_recv().is_err(), "expected no outbound event");
}

#[test]
fn write_then_read_round_trips() {
    let clipboard = MemoryClipboard::new();
    clipboard.write_text("héllo wörld\nsecond line").unwrap();
    assert_eq!(
        clipboard.read_text().unwrap().as_deref(),
        Some("héllo wörld\nsecond line")
    );
}

#[test]
fn every_write_advances_the_counter() {
    let clipboard = MemoryClipboard::new();
    let before = clipboard.change_count();
    clipboard.write_text("a").unwrap();
    clipboard.write_text("b").unwrap();
    assert!(clipboard.change_count() > before);
}

#[test]
fn startup_content_is_not_broadcast() {
    let clipboard = Arc::new(MemoryClipboard::new());
    clipboard.copy_from_elsewhere("already here");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(clipboard, tx, TEST_INTERVAL);

    assert_eq!(engine.poll_once(), TickOutcome::Unchanged);
    assert_no_event(&mut rx);
}

#[test]
fn external_change_is_emitted() {
    let (clipboard, engine, mut rx) = make_engine();

    clipboard.copy_from_elsewhere("hello");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("hello".into()));
    assert_eq!(rx.try_recv().unwrap(), "hello");

    // Nothing new on the next tick
    assert_eq!(engine.poll_once(), TickOutcome::Unchanged);
    assert_no_event(&mut rx);
}

#[test]
fn apply_remote_is_never_echoed() {
    let (clipboard, engine, mut rx) = make_engine();

    engine.apply_remote("from the peer").unwrap();
    assert_eq!(
        clipboard.read_text().unwrap().as_deref(),
        Some("from the peer")
    );

    // The very next tick observes our own write and swallows it.
    assert_eq!(engine.poll_once(), TickOutcome::Suppressed);
    assert_no_event(&mut rx);

    // Suppression is single-shot: a later genuine change still flows.
    clipboard.copy_from_elsewhere("genuine");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("genuine".into()));
    assert_eq!(rx.try_recv().unwrap(), "genuine");
}

#[test]
fn rapid_changes_coalesce_to_latest() {
    let (clipboard, engine, mut rx) = make_engine();

    clipboard.copy_from_elsewhere("T1");
    clipboard.copy_from_elsewhere("T2");

    assert_eq!(engine.poll_once(), TickOutcome::Changed("T2".into()));
    assert_eq!(rx.try_recv().unwrap(), "T2");
    assert_no_event(&mut rx);
}

#[test]
fn non_text_change_is_silent_but_consumed() {
    let (clipboard, engine, mut rx) = make_engine();

    clipboard.copy_non_text();
    assert_eq!(engine.poll_once(), TickOutcome::NoText);
    assert_no_event(&mut rx);

    // The counter was still stored; the same change is not revisited.
    assert_eq!(engine.poll_once(), TickOutcome::Unchanged);
}

#[test]
fn same_content_under_new_counter_is_not_rebroadcast() {
    let (clipboard, engine, mut rx) = make_engine();

    clipboard.copy_from_elsewhere("same");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("same".into()));
    assert_eq!(rx.try_recv().unwrap(), "same");

    clipboard.copy_from_elsewhere("same");
    assert_eq!(engine.poll_once(), TickOutcome::Duplicate);
    assert_no_event(&mut rx);
}

#[test]
fn remote_apply_then_matching_external_copy_is_duplicate() {
    let (clipboard, engine, mut rx) = make_engine();

    engine.apply_remote("shared").unwrap();
    assert_eq!(engine.poll_once(), TickOutcome::Suppressed);

    // A user copying the exact same text afterwards produces no new event
    // either: the snapshot recorded what the apply wrote.
    clipboard.copy_from_elsewhere("shared");
    assert_eq!(engine.poll_once(), TickOutcome::Duplicate);
    assert_no_event(&mut rx);
}

#[test]
fn full_session_scenario() {
    let (clipboard, engine, mut rx) = make_engine();

    // External actor copies "hello"
    clipboard.copy_from_elsewhere("hello");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("hello".into()));
    assert_eq!(rx.try_recv().unwrap(), "hello");

    // Remote peer sends "world"; the resulting local change is swallowed
    engine.apply_remote("world").unwrap();
    assert_eq!(engine.poll_once(), TickOutcome::Suppressed);
    assert_no_event(&mut rx);

    // A subsequent external change flows normally
    clipboard.copy_from_elsewhere("done");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("done".into()));
    assert_eq!(rx.try_recv().unwrap(), "done");
}

// ---------------------------------------------------------------------------
// Failure injection
// ---------------------------------------------------------------------------

/// Clipboard whose read/write paths can be forced to fail, standing in for
/// another process holding the system clipboard open.
struct FlakyClipboard {
    inner: MemoryClipboard,
    fail_reads: std::sync::atomic::AtomicBool,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl FlakyClipboard {
    fn new() -> Self {
        Self {
            inner: MemoryClipboard::new(),
            fail_reads: std::sync::atomic::AtomicBool::new(false),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn set_fail_reads(&self, fail: bool) {
        self.fail_reads
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clipboard for FlakyClipboard {
    fn change_count(&self) -> u64 {
        self.inner.change_count()
    }

    fn read_text(&self) -> Result<Option<String>> {
        if self.fail_reads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ClipboardError::Busy);
        }
        self.inner.read_text()
    }

    fn write_text(&self, text: &str) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ClipboardError::Busy);
        }
        self.inner.write_text(text)
    }
}

#[test]
fn contended_read_skips_the_tick() {
    let clipboard = Arc::new(FlakyClipboard::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(clipboard.clone(), tx, TEST_INTERVAL);

    clipboard.set_fail_reads(true);
    clipboard.inner.copy_from_elsewhere("contended");
    assert_eq!(engine.poll_once(), TickOutcome::Unavailable);
    assert_no_event(&mut rx);

    // The loop keeps running afterwards and later changes still flow.
    clipboard.set_fail_reads(false);
    clipboard.inner.copy_from_elsewhere("later");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("later".into()));
    assert_eq!(rx.try_recv().unwrap(), "later");
}

#[test]
fn failed_apply_does_not_wedge_detection() {
    let clipboard = Arc::new(FlakyClipboard::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = SyncEngine::new(clipboard.clone(), tx, TEST_INTERVAL);

    clipboard.set_fail_writes(true);
    assert!(engine.apply_remote("rejected").is_err());
    clipboard.set_fail_writes(false);

    // No suppression was armed for the failed write, so the next genuine
    // change is not swallowed.
    clipboard.inner.copy_from_elsewhere("genuine");
    assert_eq!(engine.poll_once(), TickOutcome::Changed("genuine".into()));
    assert_eq!(rx.try_recv().unwrap(), "genuine");
}

#[test]
fn transient_errors_are_identified() {
    assert!(ClipboardError::Busy.is_transient());
    assert!(!ClipboardError::GlobalLockFailed.is_transient());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn polling_loop_emits_and_stops() {
    let (clipboard, engine, mut rx) = make_engine();
    assert_eq!(engine.state(), EngineState::Created);

    engine.start();
    assert_eq!(engine.state(), EngineState::Running);

    clipboard.copy_from_elsewhere("looped");
    tokio::time::sleep(TEST_INTERVAL * 3).await;
    assert_eq!(rx.recv().await.unwrap(), "looped");

    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);

    // Changes after stop are never picked up
    clipboard.copy_from_elsewhere("after stop");
    tokio::time::sleep(TEST_INTERVAL * 5).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() {
    let (clipboard, engine, mut rx) = make_engine();

    engine.start();
    engine.start();
    assert_eq!(engine.state(), EngineState::Running);

    // A single change yields a single event even after the double start
    clipboard.copy_from_elsewhere("once");
    tokio::time::sleep(TEST_INTERVAL * 3).await;
    assert_eq!(rx.recv().await.unwrap(), "once");
    assert!(rx.try_recv().is_err());

    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent_and_safe_before_start() {
    let (_clipboard, engine, _rx) = make_engine();

    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
    engine.stop();
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn engine_restarts_after_stop() {
    let (clipboard, engine, mut rx) = make_engine();

    engine.start();
    engine.stop();
    engine.start();
    assert_eq!(engine.state(), EngineState::Running);

    clipboard.copy_from_elsewhere("second run");
    tokio::time::sleep(TEST_INTERVAL * 3).await;
    assert_eq!(rx.recv().await.unwrap(), "second run");

    engine.stop();
}

#[tokio::test(start_paused = true)]
async fn apply_remote_races_cleanly_with_the_loop() {
    let (clipboard, engine, mut rx) = make_engine();
    let engine = Arc::new(engine);

    engine.start();

    // Interleave applies with loop ticks; none of them may echo back.
    for i in 0..10 {
        engine.apply_remote(&format!("remote {i}")).unwrap();
        tokio::time::sleep(TEST_INTERVAL).await;
    }
    tokio::time::sleep(TEST_INTERVAL * 3).await;
    assert!(rx.try_recv().is_err(), "remote applies must not echo");

    // The engine is still live for genuine changes
    clipboard.copy_from_elsewhere("still alive");
    tokio::time::sleep(TEST_INTERVAL * 3).await;
    assert_eq!(rx.recv().await.unwrap(), "still alive");

    engine.stop();
}
