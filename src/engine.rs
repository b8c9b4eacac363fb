use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::clipboard::Clipboard;
use crate::detector::{ChangeDetector, TickOutcome};
use crate::error::Result;

/// Default poll cadence: responsive enough for interactive copy/paste without
/// contending with other clipboard consumers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lifecycle of the engine's polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed; snapshot seeded, loop not yet launched.
    Created,
    /// Polling loop active.
    Running,
    /// Loop cancelled. Terminal until the next `start()`.
    Stopped,
}

enum Lifecycle {
    Created,
    Running(CancellationToken),
    Stopped,
}

/// Coordinates clipboard synchronization for one remote session.
///
/// Owns the background polling task and the echo-suppression state. Outbound:
/// one event per genuine local clipboard change, sent on the channel given at
/// construction; the session transport decides how to ship it to the peer.
/// Inbound: the transport's receive path calls [`SyncEngine::apply_remote`].
///
/// `apply_remote` and the poll tick share one mutex around the detector, so
/// arming suppression plus writing is atomic relative to a concurrent tick.
pub struct SyncEngine {
    clipboard: Arc<dyn Clipboard>,
    detector: Arc<Mutex<ChangeDetector>>,
    events: UnboundedSender<String>,
    poll_interval: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl SyncEngine {
    /// Create an engine around `clipboard`. The detector snapshot is seeded
    /// with the current change counter, so whatever is on the clipboard at
    /// construction time is not broadcast.
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        events: UnboundedSender<String>,
        poll_interval: Duration,
    ) -> Self {
        let initial = clipboard.change_count();
        Self {
            clipboard,
            detector: Arc::new(Mutex::new(ChangeDetector::new(initial))),
            events,
            poll_interval,
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        match *self.lifecycle.lock().unwrap() {
            Lifecycle::Created => EngineState::Created,
            Lifecycle::Running(_) => EngineState::Running,
            Lifecycle::Stopped => EngineState::Stopped,
        }
    }

    /// Launch the polling loop. Idempotent: calling `start` while running
    /// leaves the existing loop in place.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if matches!(*lifecycle, Lifecycle::Running(_)) {
            tracing::debug!("sync engine already running");
            return;
        }

        let token = CancellationToken::new();
        let loop_token = token.clone();
        let clipboard = self.clipboard.clone();
        let detector = self.detector.clone();
        let events = self.events.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(
                "clipboard poll loop started (interval {}ms)",
                poll_interval.as_millis()
            );
            loop {
                tokio::select! {
                    biased;
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        poll_step(clipboard.as_ref(), &detector, &events);
                    }
                }
            }
            tracing::info!("clipboard poll loop stopped");
        });

        *lifecycle = Lifecycle::Running(token);
    }

    /// Cancel the polling loop. The in-flight delay returns promptly and no
    /// further tick runs. Safe to call repeatedly or before `start`.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if let Lifecycle::Running(token) = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            token.cancel();
        }
    }

    /// Apply clipboard content received from the remote peer.
    ///
    /// The detector mutex is held across the write and the arming of
    /// suppression, so a concurrent tick can never observe the counter bump
    /// without the armed flag. Suppression is armed only after a successful
    /// write; a rejected write therefore cannot leave a stale flag that would
    /// swallow the next genuine change.
    pub fn apply_remote(&self, text: &str) -> Result<()> {
        let mut detector = self.detector.lock().unwrap();
        if let Err(e) = self.clipboard.write_text(text) {
            tracing::warn!("failed to apply remote clipboard content: {e}");
            return Err(e);
        }
        detector.arm_suppression(text);
        tracing::debug!("applied remote clipboard content ({} bytes)", text.len());
        Ok(())
    }

    /// Run exactly one detector tick. The polling loop calls this every
    /// interval; tests call it directly for a deterministic logical clock.
    pub fn poll_once(&self) -> TickOutcome {
        poll_step(self.clipboard.as_ref(), &self.detector, &self.events)
    }
}

fn poll_step(
    clipboard: &dyn Clipboard,
    detector: &Mutex<ChangeDetector>,
    events: &UnboundedSender<String>,
) -> TickOutcome {
    let outcome = detector.lock().unwrap().tick(clipboard);
    if let TickOutcome::Changed(text) = &outcome {
        tracing::debug!("local clipboard change detected ({} bytes)", text.len());
        if events.send(text.clone()).is_err() {
            tracing::warn!("clipboard event channel closed");
        }
    }
    outcome
}
