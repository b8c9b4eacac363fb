//! Clipboard synchronization engine for remote-support sessions.
//!
//! Keeps the operator's and the end-user's clipboards in sync: a background
//! task polls the OS clipboard change counter, broadcasts genuine local
//! changes over a channel, and applies remote content without echoing it
//! straight back to the peer.
//!
//! The session transport is an external collaborator: it consumes the
//! outbound event channel and feeds received content into
//! [`SyncEngine::apply_remote`].

pub mod clipboard;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;

pub use clipboard::{Clipboard, MemoryClipboard};
#[cfg(target_os = "windows")]
pub use clipboard::SystemClipboard;
pub use config::{Config, SyncConfig};
pub use detector::{ChangeDetector, TickOutcome};
pub use engine::{EngineState, SyncEngine, DEFAULT_POLL_INTERVAL};
pub use error::{ClipboardError, Result};
