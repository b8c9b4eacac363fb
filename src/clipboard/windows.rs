use windows::Win32::Foundation::{HANDLE, HGLOBAL};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, GetClipboardData, GetClipboardSequenceNumber,
    IsClipboardFormatAvailable, OpenClipboard, SetClipboardData,
};
use windows::Win32::System::Memory::{GMEM_MOVEABLE, GlobalAlloc, GlobalLock, GlobalUnlock};
use windows::Win32::System::Ole::CF_UNICODETEXT;

use crate::clipboard::Clipboard;
use crate::error::{ClipboardError, Result};

/// The real Windows clipboard.
///
/// Every read/write opens the clipboard, performs the operation, and closes it
/// again; the OS serializes open/close across processes. The change counter
/// comes from `GetClipboardSequenceNumber`, which Windows bumps on every
/// clipboard mutation by any process.
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard that opens the clipboard on creation and closes it on drop,
/// so the clipboard is released on every exit path.
struct ClipboardGuard {
    _private: (),
}

impl ClipboardGuard {
    fn open() -> Result<Self> {
        unsafe {
            OpenClipboard(None).map_err(ClipboardError::OpenFailed)?;
        }
        Ok(Self { _private: () })
    }

    fn read_text(&self) -> Result<String> {
        unsafe {
            let handle: HANDLE = GetClipboardData(CF_UNICODETEXT.0 as u32)
                .map_err(|_| ClipboardError::DataUnavailable(CF_UNICODETEXT.0 as u32))?;

            let hglobal = HGLOBAL(handle.0);
            let ptr = GlobalLock(hglobal) as *const u16;
            if ptr.is_null() {
                return Err(ClipboardError::GlobalLockFailed);
            }

            // Find null terminator
            let mut len = 0;
            while *ptr.add(len) != 0 {
                len += 1;
            }
            let slice = std::slice::from_raw_parts(ptr, len);
            let text = String::from_utf16_lossy(slice);

            let _ = GlobalUnlock(hglobal);

            Ok(text)
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        unsafe {
            let _ = EmptyClipboard();

            // Convert to UTF-16 with null terminator
            let wide: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
            let byte_len = wide.len() * 2;

            let hmem = GlobalAlloc(GMEM_MOVEABLE, byte_len).map_err(ClipboardError::AllocFailed)?;

            let ptr = GlobalLock(hmem);
            if ptr.is_null() {
                return Err(ClipboardError::GlobalLockFailed);
            }

            std::ptr::copy_nonoverlapping(wide.as_ptr() as *const u8, ptr as *mut u8, byte_len);
            let _ = GlobalUnlock(hmem);

            // On success the system owns the memory; do not free it here.
            SetClipboardData(CF_UNICODETEXT.0 as u32, Some(HANDLE(hmem.0)))
                .map_err(ClipboardError::WriteFailed)?;
            Ok(())
        }
    }
}

impl Drop for ClipboardGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseClipboard();
        }
    }
}

impl Clipboard for SystemClipboard {
    fn change_count(&self) -> u64 {
        // No clipboard acquisition needed; this is a plain counter read.
        u64::from(unsafe { GetClipboardSequenceNumber() })
    }

    fn read_text(&self) -> Result<Option<String>> {
        let guard = ClipboardGuard::open()?;

        if unsafe { IsClipboardFormatAvailable(CF_UNICODETEXT.0 as u32).is_err() } {
            // Empty clipboard or a non-text format (image, files): not a failure.
            return Ok(None);
        }

        match guard.read_text() {
            Ok(text) if text.is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                tracing::warn!("failed to read CF_UNICODETEXT: {e}");
                Ok(None)
            }
        }
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let guard = ClipboardGuard::open()?;
        guard.write_text(text)
    }
}
