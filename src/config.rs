use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "syncboard", about = "Clipboard synchronization engine for remote sessions")]
pub struct Cli {
    /// Path to config file (overrides default location)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Poll interval in milliseconds (overrides config file)
    #[arg(short, long)]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How often to poll the clipboard change counter, in milliseconds.
    /// Lower values reduce copy-to-paste latency at the cost of more
    /// clipboard traffic alongside other clipboard consumers.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    crate::engine::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    /// Load config from the given path (or the standard path if `None`).
    /// Returns defaults if the file does not exist or cannot be parsed.
    pub fn load(override_path: Option<&Path>) -> Self {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path(),
        };
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        tracing::warn!("failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("failed to read config at {}: {e}", path.display());
                }
            }
        }
        Self::default()
    }

    /// The standard config file path, e.g. %APPDATA%/syncboard/config.toml.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "syncboard")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Write the default config to disk if it doesn't exist.
    pub fn write_default_if_missing(path: &Path) {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let default_toml = toml::to_string_pretty(&Config::default()).unwrap_or_default();
            let _ = std::fs::write(path, default_toml);
        }
    }
}
