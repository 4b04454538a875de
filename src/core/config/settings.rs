//! `chatgauge set` / `chatgauge unset` support.

use std::fmt;
use std::str::FromStr;

use crate::core::config::data::Config;
use crate::core::models::{find_model, MODELS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BaseUrl,
    DefaultModel,
    OllamaUrl,
    RevealDelayMs,
    RequestTimeoutSecs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::BaseUrl,
        ConfigKey::DefaultModel,
        ConfigKey::OllamaUrl,
        ConfigKey::RevealDelayMs,
        ConfigKey::RequestTimeoutSecs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::DefaultModel => "default-model",
            ConfigKey::OllamaUrl => "ollama-url",
            ConfigKey::RevealDelayMs => "reveal-delay-ms",
            ConfigKey::RequestTimeoutSecs => "request-timeout-secs",
        }
    }
}

impl FromStr for ConfigKey {
    type Err = SettingError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase().replace('_', "-");
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| SettingError::UnknownKey(input.to_string()))
    }
}

/// Errors that can occur when modifying configuration settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The provided model identifier is not in the catalog.
    UnknownModel(String),
    /// The value could not be used for this key.
    InvalidValue {
        key: ConfigKey,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.name()).collect();
                write!(f, "Unknown config key: {key} (known keys: {})", known.join(", "))
            }
            SettingError::UnknownModel(model) => {
                let known: Vec<&str> = MODELS.iter().map(|m| m.id).collect();
                write!(f, "Unknown model: {model} (available: {})", known.join(", "))
            }
            SettingError::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "Invalid value for {}: {value} (expected {expected})", key.name()),
        }
    }
}

impl std::error::Error for SettingError {}

impl Config {
    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), SettingError> {
        let value = value.trim();
        match key {
            ConfigKey::BaseUrl | ConfigKey::OllamaUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(SettingError::InvalidValue {
                        key,
                        value: value.to_string(),
                        expected: "an http:// or https:// URL",
                    });
                }
                let slot = if key == ConfigKey::BaseUrl {
                    &mut self.base_url
                } else {
                    &mut self.ollama_url
                };
                *slot = Some(value.to_string());
            }
            ConfigKey::DefaultModel => {
                let model = find_model(value)
                    .ok_or_else(|| SettingError::UnknownModel(value.to_string()))?;
                self.default_model = Some(model.id.to_string());
            }
            ConfigKey::RevealDelayMs | ConfigKey::RequestTimeoutSecs => {
                let parsed = value.parse::<u64>().map_err(|_| SettingError::InvalidValue {
                    key,
                    value: value.to_string(),
                    expected: "a non-negative whole number",
                })?;
                if key == ConfigKey::RevealDelayMs {
                    self.reveal_delay_ms = Some(parsed);
                } else {
                    self.request_timeout_secs = Some(parsed);
                }
            }
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::DefaultModel => self.default_model = None,
            ConfigKey::OllamaUrl => self.ollama_url = None,
            ConfigKey::RevealDelayMs => self.reveal_delay_ms = None,
            ConfigKey::RequestTimeoutSecs => self.request_timeout_secs = None,
        }
    }

    pub fn display_value(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::BaseUrl => self.base_url.clone(),
            ConfigKey::DefaultModel => self.default_model.clone(),
            ConfigKey::OllamaUrl => self.ollama_url.clone(),
            ConfigKey::RevealDelayMs => self.reveal_delay_ms.map(|v| v.to_string()),
            ConfigKey::RequestTimeoutSecs => self.request_timeout_secs.map(|v| v.to_string()),
        }
    }
}
