pub mod memory;
#[cfg(target_os = "windows")]
pub mod windows;

pub use memory::MemoryClipboard;
#[cfg(target_os = "windows")]
pub use windows::SystemClipboard;

use crate::error::Result;

/// Scoped, exclusive access to the single system-global clipboard.
///
/// Implementations own the acquisition discipline (open, operate, release on
/// every exit path) and never hand raw OS handles to callers. The change
/// counter is an opaque monotonic value bumped by the OS on every clipboard
/// mutation by any process; it is only ever compared for (in)equality.
pub trait Clipboard: Send + Sync {
    /// Current value of the OS change counter. Cheap; does not acquire the
    /// clipboard.
    fn change_count(&self) -> u64;

    /// Read the clipboard as text. `Ok(None)` means the clipboard holds no
    /// text payload (empty, or a non-text format such as an image); that is a
    /// normal outcome, not a failure. A transient error means the clipboard
    /// could not be acquired this time; the caller retries on its next cycle.
    fn read_text(&self) -> Result<Option<String>>;

    /// Replace the clipboard content with `text`, encoded the way the OS
    /// expects for interchange with arbitrary applications. A successful
    /// write advances the change counter.
    fn write_text(&self, text: &str) -> Result<()>;
}
