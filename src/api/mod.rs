//! Wire payloads exchanged with the `/ask` backend.

use serde::{Deserialize, Serialize};

/// Body of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub message: String,
    pub model_type: String,
}

/// Successful `/ask` reply. Token fields the backend leaves out count as zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub response: String,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Error body a failing backend may attach to a non-2xx status.
#[derive(Debug, Deserialize)]
pub struct AskErrorBody {
    #[serde(default)]
    pub response: Option<String>,
}

/// Pull a human readable message out of a non-2xx response body.
///
/// The backend usually sends `{"response": "..."}`. Anything else (HTML error
/// pages, empty bodies, JSON without a usable `response`) falls back to a
/// message built from the status code.
pub fn server_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<AskErrorBody>(body.trim())
        .ok()
        .and_then(|parsed| parsed.response)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
