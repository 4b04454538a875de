use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranscriptRole {
    User,
    Assistant,
    System,
}

/// Where an assistant entry is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Waiting on the backend.
    Waiting,
    /// Reply received, characters still appearing.
    Revealing,
    Done,
    /// Network or server failure; rendered with error styling.
    Failed,
    /// Stopped by the user; informational, not an error.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub role: TranscriptRole,
    pub content: String,
    /// Display name of the model that answered (assistant entries only).
    pub model: Option<&'static str>,
    pub status: ReplyStatus,
    pub at: DateTime<Local>,
}

impl TranscriptEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self::settled(TranscriptRole::User, content.into())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::settled(TranscriptRole::System, content.into())
    }

    pub fn waiting_reply(model: &'static str) -> Self {
        Self {
            role: TranscriptRole::Assistant,
            content: String::new(),
            model: Some(model),
            status: ReplyStatus::Waiting,
            at: Local::now(),
        }
    }

    fn settled(role: TranscriptRole, content: String) -> Self {
        Self {
            role,
            content,
            model: None,
            status: ReplyStatus::Done,
            at: Local::now(),
        }
    }

    /// First letter of the answering model, used as the assistant avatar.
    pub fn avatar(&self) -> String {
        match self.role {
            TranscriptRole::User => "You".to_string(),
            TranscriptRole::System => "•".to_string(),
            TranscriptRole::Assistant => self
                .model
                .and_then(|name| name.chars().next())
                .map(String::from)
                .unwrap_or_else(|| "AI".to_string()),
        }
    }
}
