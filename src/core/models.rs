//! The fixed set of backend models and the local-model reachability check.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

pub const LOCAL_MODEL_ID: &str = "llama3";
pub const DEFAULT_MODEL_ID: &str = LOCAL_MODEL_ID;
/// Selected when the local model turns out to be unreachable.
pub const FALLBACK_MODEL_ID: &str = "openai";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Served by the local Ollama instance rather than a hosted API.
    pub local: bool,
}

pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "llama3",
        display_name: "Llama3 (Ollama)",
        local: true,
    },
    ModelSpec {
        id: "groq",
        display_name: "Groq (Llama3-8b)",
        local: false,
    },
    ModelSpec {
        id: "openai",
        display_name: "OpenAI (GPT-4o-mini)",
        local: false,
    },
    ModelSpec {
        id: "gemini-flash",
        display_name: "Gemini Flash",
        local: false,
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|model| model.id.eq_ignore_ascii_case(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
    /// The probe could not tell either way. Treated as available.
    Unknown,
}

impl Availability {
    pub fn is_usable(self) -> bool {
        !matches!(self, Availability::Unavailable)
    }
}

/// Availability of the local model as shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Checking,
    Done(Availability),
}

impl ProbeStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProbeStatus::Checking => "Ollama: checking…",
            ProbeStatus::Done(availability) if availability.is_usable() => "Ollama: Online ✅",
            ProbeStatus::Done(_) => "Ollama: Offline ❌",
        }
    }
}

#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn check(&self) -> Availability;
}

/// Probes the local Ollama endpoint with a plain GET. Any HTTP answer counts.
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn check(&self) -> Availability {
        match self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "local model endpoint answered");
                Availability::Available
            }
            Err(err) if err.is_timeout() => {
                debug!(url = %self.url, "local model probe timed out");
                Availability::Unknown
            }
            Err(err) => {
                warn!(url = %self.url, error = %err, "local model endpoint is not reachable");
                Availability::Unavailable
            }
        }
    }
}

/// Selector state: the catalog, which entries are enabled, and the current pick.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    selected: usize,
    local_availability: Option<Availability>,
}

impl ModelSelector {
    /// Start on `id`, or on the default model when `id` is unknown.
    pub fn new(id: Option<&str>) -> Self {
        let selected = id
            .and_then(|id| MODELS.iter().position(|model| model.id.eq_ignore_ascii_case(id)))
            .or_else(|| MODELS.iter().position(|model| model.id == DEFAULT_MODEL_ID))
            .unwrap_or(0);
        Self {
            selected,
            local_availability: None,
        }
    }

    pub fn current(&self) -> &'static ModelSpec {
        &MODELS[self.selected]
    }

    pub fn probe_status(&self) -> ProbeStatus {
        match self.local_availability {
            None => ProbeStatus::Checking,
            Some(availability) => ProbeStatus::Done(availability),
        }
    }

    pub fn is_enabled(&self, model: &ModelSpec) -> bool {
        !model.local
            || self
                .local_availability
                .map(Availability::is_usable)
                .unwrap_or(true)
    }

    /// Returns true when `id` names an enabled model and the selection changed.
    pub fn select(&mut self, id: &str) -> bool {
        let Some(index) = MODELS
            .iter()
            .position(|model| model.id.eq_ignore_ascii_case(id))
        else {
            return false;
        };
        if index == self.selected || !self.is_enabled(&MODELS[index]) {
            return false;
        }
        self.selected = index;
        true
    }

    /// Move to the next enabled model, wrapping around.
    pub fn cycle(&mut self) -> bool {
        for step in 1..MODELS.len() {
            let index = (self.selected + step) % MODELS.len();
            if self.is_enabled(&MODELS[index]) {
                self.selected = index;
                return true;
            }
        }
        false
    }

    /// Record a probe result. An unreachable local model that is currently
    /// selected is swapped for [`FALLBACK_MODEL_ID`] without announcement.
    pub fn apply_probe(&mut self, availability: Availability) {
        self.local_availability = Some(availability);
        if !self.is_enabled(self.current()) {
            if let Some(index) = MODELS.iter().position(|m| m.id == FALLBACK_MODEL_ID) {
                self.selected = index;
            }
        }
    }
}
