use std::sync::Mutex;

use crate::clipboard::Clipboard;
use crate::error::Result;

/// In-memory clipboard with the same counter semantics as the OS one.
///
/// Used for deterministic tests and as the accessor on platforms without a
/// system clipboard backend. The extra `copy_*` constructors below stand in
/// for clipboard mutations made by other processes.
pub struct MemoryClipboard {
    inner: Mutex<Inner>,
}

struct Inner {
    count: u64,
    text: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                count: 0,
                text: None,
            }),
        }
    }

    /// Simulate another application copying `text`: bumps the counter and
    /// replaces the content, exactly like a foreign `write_text`.
    pub fn copy_from_elsewhere(&self, text: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.count += 1;
        inner.text = Some(text.to_string());
    }

    /// Simulate another application copying non-text content (an image, a
    /// file list): bumps the counter but leaves no text payload behind.
    pub fn copy_non_text(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.count += 1;
        inner.text = None;
    }
}

impl Default for MemoryClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for MemoryClipboard {
    fn change_count(&self) -> u64 {
        self.inner.lock().unwrap().count
    }

    fn read_text(&self) -> Result<Option<String>> {
        Ok(self.inner.lock().unwrap().text.clone())
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.count += 1;
        inner.text = Some(text.to_string());
        Ok(())
    }
}
