//! Client configuration, read from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Admin notification bell refresh period
pub const DEFAULT_NOTIFY_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    /// None resolves to ~/.tilestore/session.redb
    pub session_path: Option<PathBuf>,
    pub connect_timeout_secs: u64,
    pub notify_interval_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_path: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            notify_interval_secs: DEFAULT_NOTIFY_INTERVAL_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (env in production, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("TILESTORE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        Self {
            api_url,
            session_path: lookup("TILESTORE_SESSION_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            connect_timeout_secs: parse_secs(
                &lookup,
                "TILESTORE_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            notify_interval_secs: parse_secs(
                &lookup,
                "TILESTORE_NOTIFY_INTERVAL_SECS",
                defaults.notify_interval_secs,
            ),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_secs)
    }
}

fn parse_secs<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(v) if v > 0 => v,
            _ => {
                warn!("Invalid {}='{}' - using default {}", key, raw, default);
                default
            }
        },
        None => default,
    }
}
