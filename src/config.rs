//! Engine configuration loaded from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 300;
pub const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;

/// Where per-game state documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// One JSON document per game under `data_dir`
    File,
    /// Process-local only, lost on restart
    Memory,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Messages longer than this (in chars) are never scanned for kills
    pub max_message_chars: usize,
    /// Upper bound for delivering a single announcement or notification
    pub notify_timeout: Duration,
    pub storage: StorageKind,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Bearer token the chat bridge must present (None = open)
    pub bridge_token: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
            notify_timeout: Duration::from_millis(DEFAULT_NOTIFY_TIMEOUT_MS),
            storage: StorageKind::File,
            data_dir: PathBuf::from("data"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            bridge_token: None,
        }
    }
}

impl EngineConfig {
    /// In-memory config for tests and embedding
    pub fn in_memory() -> Self {
        Self {
            storage: StorageKind::Memory,
            ..Self::default()
        }
    }

    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_message_chars = std::env::var("WA_MAX_MESSAGE_CHARS")
            .ok()
            .and_then(|v| parse_or_warn("WA_MAX_MESSAGE_CHARS", &v))
            .unwrap_or(defaults.max_message_chars);

        let notify_timeout = std::env::var("WA_NOTIFY_TIMEOUT_MS")
            .ok()
            .and_then(|v| parse_or_warn::<u64>("WA_NOTIFY_TIMEOUT_MS", &v))
            .map(Duration::from_millis)
            .unwrap_or(defaults.notify_timeout);

        let storage = match std::env::var("WA_STORAGE").ok().as_deref() {
            Some("memory") => StorageKind::Memory,
            Some("file") | None => StorageKind::File,
            Some(other) => {
                tracing::warn!("Unknown WA_STORAGE value '{}', using file storage", other);
                StorageKind::File
            }
        };

        let data_dir = std::env::var("WA_DATA_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let bind_addr = std::env::var("WA_BIND_ADDR")
            .ok()
            .and_then(|v| parse_or_warn("WA_BIND_ADDR", &v))
            .unwrap_or(defaults.bind_addr);

        let bridge_token = std::env::var("WA_BRIDGE_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if bridge_token.is_none() {
            tracing::warn!("WA_BRIDGE_TOKEN not set - bridge endpoint is unauthenticated!");
        }

        Self {
            max_message_chars,
            notify_timeout,
            storage,
            data_dir,
            bind_addr,
            bridge_token,
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}='{}'", key, value);
            None
        }
    }
}
