use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use syncboard::clipboard::Clipboard;
use syncboard::config::{Cli, Config};
use syncboard::engine::SyncEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref());
    // Only write a default config if no custom path was specified
    if cli.config.is_none() {
        Config::write_default_if_missing(&Config::config_path());
    }
    if let Some(interval) = cli.interval {
        config.sync.poll_interval_ms = interval;
    }

    let clipboard = make_clipboard();
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let engine = Arc::new(SyncEngine::new(
        clipboard,
        event_tx,
        config.sync.poll_interval(),
    ));
    engine.start();
    tracing::info!("syncboard running; stdin lines are applied as remote content");

    // Stand-in for the session transport: outbound changes are logged, and
    // each stdin line is applied as if the remote peer had sent it.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            maybe = event_rx.recv() => {
                match maybe {
                    Some(text) => {
                        tracing::info!("local change: {}", preview(&text));
                    }
                    None => break,
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(text)) if !text.is_empty() => {
                        if engine.apply_remote(&text).is_ok() {
                            tracing::info!("applied remote: {}", preview(&text));
                        }
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        stdin_open = false;
                    }
                    Err(e) => {
                        tracing::warn!("stdin read error: {e}");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    engine.stop();
    tracing::info!("syncboard shutdown complete");
    Ok(())
}

/// Single-line preview for log output.
fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > 60 {
        let cut: String = line.chars().take(60).collect();
        format!("{cut}... ({} bytes)", text.len())
    } else {
        line.to_string()
    }
}

#[cfg(target_os = "windows")]
fn make_clipboard() -> Arc<dyn Clipboard> {
    Arc::new(syncboard::clipboard::SystemClipboard::new())
}

#[cfg(not(target_os = "windows"))]
fn make_clipboard() -> Arc<dyn Clipboard> {
    tracing::warn!("no system clipboard backend on this platform, using in-memory clipboard");
    Arc::new(syncboard::clipboard::MemoryClipboard::new())
}
