use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::models::{DEFAULT_MODEL_ID, DEFAULT_OLLAMA_URL};
use crate::core::reveal::DEFAULT_REVEAL_DELAY;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
/// Environment override for the backend base URL.
pub const BASE_URL_ENV: &str = "CHATGAUGE_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Where the `/ask` backend is served from
    pub base_url: Option<String>,
    /// Model selected at startup (e.g., "openai")
    pub default_model: Option<String>,
    /// Local Ollama endpoint probed to enable the local model
    pub ollama_url: Option<String>,
    /// Delay between revealed characters, in milliseconds
    pub reveal_delay_ms: Option<u64>,
    /// Give up on a turn after this many seconds (no limit when unset)
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Resolve the backend URL: explicit override, then environment, then file, then default.
    pub fn resolve_base_url(&self, cli_override: Option<&str>) -> String {
        cli_override
            .map(str::to_string)
            .or_else(|| {
                std::env::var(BASE_URL_ENV)
                    .ok()
                    .filter(|value| !value.trim().is_empty())
            })
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn resolve_model<'a>(&'a self, cli_override: Option<&'a str>) -> &'a str {
        cli_override
            .or(self.default_model.as_deref())
            .unwrap_or(DEFAULT_MODEL_ID)
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    pub fn reveal_delay(&self) -> Duration {
        self.reveal_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REVEAL_DELAY)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/chatgauge/config.toml` → `~/.config/chatgauge/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
