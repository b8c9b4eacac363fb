use crate::clipboard::Clipboard;

/// Last-observed clipboard state. Written only by [`ChangeDetector::tick`]
/// and by the coordinator's apply path; both run under the engine mutex.
#[derive(Debug)]
struct ClipboardSnapshot {
    /// OS change counter at the last observed mutation.
    counter: u64,
    /// Text at the last observed mutation, if it had a text payload.
    text: Option<String>,
}

/// What a single poll tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Counter unchanged since the previous tick.
    Unchanged,
    /// Counter changed, but the change was our own write; swallowed exactly
    /// once per armed suppression.
    Suppressed,
    /// Counter changed and the clipboard holds new text to broadcast.
    Changed(String),
    /// Counter changed but the clipboard holds no text payload (cleared, or
    /// another app copied an image). Nothing to broadcast.
    NoText,
    /// Counter changed but the text matches what we already observed; the
    /// same content re-arrived under a new counter value.
    Duplicate,
    /// The clipboard could not be acquired this tick (held by another
    /// process). Retried on the next tick.
    Unavailable,
}

/// Polling-based change detector.
///
/// The OS exposes no change notification here; instead every tick compares
/// the clipboard's monotonic change counter against the stored snapshot and
/// fetches content only when the counter moved. Multiple changes landing
/// between two ticks coalesce into one observation of the latest content.
#[derive(Debug)]
pub struct ChangeDetector {
    snapshot: ClipboardSnapshot,
    /// Single-shot echo guard: armed by the coordinator when it writes,
    /// consumed by the first changed-counter tick thereafter.
    suppress_next: bool,
}

impl ChangeDetector {
    /// Create a detector whose snapshot starts at `initial_counter`, so
    /// content already on the clipboard at startup is not broadcast.
    pub fn new(initial_counter: u64) -> Self {
        Self {
            snapshot: ClipboardSnapshot {
                counter: initial_counter,
                text: None,
            },
            suppress_next: false,
        }
    }

    /// Arm the echo guard and record the text the coordinator just wrote, so
    /// the duplicate check stays accurate for the suppressed change.
    /// Re-arming stores rather than counts: a flag left over from a write
    /// whose counter bump was never observed cannot accumulate.
    pub fn arm_suppression(&mut self, written_text: &str) {
        self.suppress_next = true;
        self.snapshot.text = Some(written_text.to_string());
    }

    /// Run one poll step against the clipboard.
    pub fn tick(&mut self, clipboard: &dyn Clipboard) -> TickOutcome {
        let counter = clipboard.change_count();
        if counter == self.snapshot.counter {
            return TickOutcome::Unchanged;
        }

        // Store the counter before any further work so a fetch failure can
        // never cause the same counter value to be reprocessed.
        self.snapshot.counter = counter;

        if self.suppress_next {
            self.suppress_next = false;
            tracing::debug!("clipboard change was self-inflicted, suppressing");
            return TickOutcome::Suppressed;
        }

        let text = match clipboard.read_text() {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("clipboard unavailable this tick: {e}");
                return TickOutcome::Unavailable;
            }
        };

        match text {
            Some(text) if !text.is_empty() => {
                if self.snapshot.text.as_deref() == Some(text.as_str()) {
                    tracing::debug!("skipping duplicate clipboard content");
                    return TickOutcome::Duplicate;
                }
                self.snapshot.text = Some(text.clone());
                TickOutcome::Changed(text)
            }
            _ => TickOutcome::NoText,
        }
    }
}
