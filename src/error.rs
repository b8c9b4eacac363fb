use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    /// The clipboard is held by another process. Transient: callers skip the
    /// current tick/apply and retry on the next cycle.
    #[error("clipboard is held by another process")]
    Busy,

    #[cfg(target_os = "windows")]
    #[error("failed to open clipboard: {0}")]
    OpenFailed(windows::core::Error),

    #[error("clipboard data unavailable for format {0}")]
    DataUnavailable(u32),

    #[error("failed to lock global memory")]
    GlobalLockFailed,

    #[cfg(target_os = "windows")]
    #[error("failed to allocate global memory: {0}")]
    AllocFailed(windows::core::Error),

    #[cfg(target_os = "windows")]
    #[error("failed to set clipboard data: {0}")]
    WriteFailed(windows::core::Error),
}

impl ClipboardError {
    /// Whether this failure is expected to clear on its own (clipboard briefly
    /// held by another process). Transient errors are logged and skipped, not
    /// surfaced to the session layer.
    pub fn is_transient(&self) -> bool {
        if matches!(self, Self::Busy) {
            return true;
        }
        #[cfg(target_os = "windows")]
        if matches!(self, Self::OpenFailed(_)) {
            return true;
        }
        false
    }
}

pub type Result<T> = std::result::Result<T, ClipboardError>;
