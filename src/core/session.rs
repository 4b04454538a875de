//! The chat session: one transcript, one prompt history, one token series and
//! one request controller, wired together.
//!
//! The UI owns a single [`ChatSession`] and calls into it from its event
//! handlers. Network work happens elsewhere: [`ChatSession::submit_input`]
//! returns a [`PendingRequest`] for the caller to drive, and the outcome comes
//! back through [`ChatSession::apply_outcome`].

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::core::history::{HistoryView, PromptHistoryStore};
use crate::core::message::{ReplyStatus, TranscriptEntry};
use crate::core::models::{Availability, ModelSelector, ModelSpec};
use crate::core::request::{
    PendingRequest, RequestController, RequestState, TurnError, TurnId, TurnOutcome,
};
use crate::core::reveal::Reveal;
use crate::core::tokens::{TokenSeries, TokenUsage};

pub const STOPPED_MESSAGE: &str = "AI response stopped by user.";
pub const NETWORK_ERROR_PREFIX: &str = "Error: Could not get a response.";
pub const HISTORY_CLEARED_MESSAGE: &str = "Chat history cleared.";
pub const CLEAR_HISTORY_QUESTION: &str =
    "Are you sure you want to clear all previous prompts? This cannot be undone.";

/// Text shown in place of a reply whose request failed.
pub fn failure_text(err: TurnError) -> String {
    match err {
        TurnError::Server { message, .. } => message,
        TurnError::Network(detail) => format!("{NETWORK_ERROR_PREFIX} {detail}"),
    }
}

/// What the submit and stop controls should look like right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub can_submit: bool,
    pub can_cancel: bool,
    pub stop_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    ClearHistory,
}

impl Confirmation {
    pub fn question(self) -> &'static str {
        match self {
            Confirmation::ClearHistory => CLEAR_HISTORY_QUESTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Older,
    Newer,
}

struct ActiveReveal {
    entry: usize,
    reveal: Reveal,
}

pub struct ChatSession {
    history: PromptHistoryStore,
    tokens: TokenSeries,
    requests: RequestController,
    models: ModelSelector,
    transcript: Vec<TranscriptEntry>,
    input: String,
    history_cursor: Option<usize>,
    /// Turn currently on the wire and the transcript entry its reply goes to.
    awaiting: Option<(TurnId, usize)>,
    reveal: Option<ActiveReveal>,
    reveal_delay: Duration,
    confirmation: Option<Confirmation>,
    pin_to_bottom: bool,
}

impl ChatSession {
    pub fn new(
        history: PromptHistoryStore,
        requests: RequestController,
        models: ModelSelector,
        reveal_delay: Duration,
    ) -> Self {
        Self {
            history,
            tokens: TokenSeries::new(),
            requests,
            models,
            transcript: Vec::new(),
            input: String::new(),
            history_cursor: None,
            awaiting: None,
            reveal: None,
            reveal_delay,
            confirmation: None,
            pin_to_bottom: true,
        }
    }

    /// Load stored prompts, zero the token display and greet the user.
    pub fn start(&mut self) {
        self.history.refresh();
        self.tokens.reset();
        let welcome = format!(
            "Welcome! Chatting with {}. This is Prompt 0.",
            self.models.current().display_name
        );
        self.push_system(welcome);
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn tokens(&self) -> &TokenSeries {
        &self.tokens
    }

    pub fn history(&self) -> &HistoryView {
        self.history.view()
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history_cursor
    }

    pub fn current_model(&self) -> &'static ModelSpec {
        self.models.current()
    }

    pub fn models(&self) -> &ModelSelector {
        &self.models
    }

    pub fn request_state(&self) -> RequestState {
        self.requests.state()
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.is_some()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn controls(&self) -> Controls {
        let state = self.requests.state();
        Controls {
            can_submit: state == RequestState::Idle
                && self.reveal.is_none()
                && self.confirmation.is_none(),
            can_cancel: state == RequestState::Pending,
            stop_label: if state == RequestState::Stopping {
                "Stopping…"
            } else {
                "Stop"
            },
        }
    }

    /// Consume the request to scroll the transcript to its end.
    pub fn take_pin_to_bottom(&mut self) -> bool {
        std::mem::take(&mut self.pin_to_bottom)
    }

    /// Send the input buffer as a new turn. Blank input and input submitted
    /// while the controls are disabled are ignored.
    pub fn submit_input(&mut self) -> Option<PendingRequest> {
        let text = self.input.trim().to_string();
        if text.is_empty() || !self.controls().can_submit {
            return None;
        }

        self.transcript.push(TranscriptEntry::user(text.clone()));
        self.history.append(&text);
        self.history_cursor = None;
        self.input.clear();

        let model = self.models.current();
        match self.requests.submit(&text, model.id) {
            Ok(pending) => {
                self.transcript
                    .push(TranscriptEntry::waiting_reply(model.display_name));
                self.awaiting = Some((pending.id(), self.transcript.len() - 1));
                self.pin_to_bottom = true;
                Some(pending)
            }
            Err(err) => {
                warn!(error = %err, "submission rejected");
                None
            }
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.requests.cancel()
    }

    /// Fold a finished turn into the transcript and return to idle.
    pub fn apply_outcome(&mut self, id: TurnId, outcome: TurnOutcome, now: Instant) {
        self.requests.settle(id);
        let entry_index = match self.awaiting {
            Some((awaiting, entry)) if awaiting == id => entry,
            _ => {
                warn!(turn = id, "dropping outcome for a turn that is no longer awaited");
                return;
            }
        };
        self.awaiting = None;

        match outcome {
            TurnOutcome::Completed(response) => {
                self.tokens.record(TokenUsage::from(&response));
                let entry = &mut self.transcript[entry_index];
                entry.content.clear();
                entry.status = ReplyStatus::Revealing;
                self.reveal = Some(ActiveReveal {
                    entry: entry_index,
                    reveal: Reveal::new(response.response, self.reveal_delay, now),
                });
                self.tick(now);
            }
            TurnOutcome::Failed(err) => {
                let entry = &mut self.transcript[entry_index];
                entry.content = failure_text(err);
                entry.status = ReplyStatus::Failed;
            }
            TurnOutcome::Cancelled => {
                let entry = &mut self.transcript[entry_index];
                entry.content = STOPPED_MESSAGE.to_string();
                entry.status = ReplyStatus::Stopped;
            }
        }
        self.pin_to_bottom = true;
    }

    /// Advance the running reveal. Returns true when visible text changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(active) = self.reveal.as_mut() else {
            return false;
        };

        let stepped = active.reveal.advance(now);
        let finished = active.reveal.is_finished();
        let entry = &mut self.transcript[active.entry];
        if stepped > 0 || finished {
            entry.content = active.reveal.visible().to_string();
        }
        if finished {
            entry.status = ReplyStatus::Done;
            self.reveal = None;
        }
        if stepped > 0 {
            self.pin_to_bottom = true;
        }
        stepped > 0 || finished
    }

    /// Time until the next reveal step is due, if one is running.
    pub fn next_tick_in(&self) -> Option<Duration> {
        self.reveal.as_ref().map(|_| self.reveal_delay)
    }

    pub fn select_model(&mut self, id: &str) -> bool {
        if !self.models.select(id) {
            return false;
        }
        self.announce_model();
        true
    }

    pub fn cycle_model(&mut self) -> bool {
        if !self.models.cycle() {
            return false;
        }
        self.announce_model();
        true
    }

    fn announce_model(&mut self) {
        let model = self.models.current();
        info!(model = model.id, "model changed");
        self.push_system(format!("Model changed to {}.", model.display_name));
    }

    pub fn apply_probe(&mut self, availability: Availability) {
        let before = self.models.current().id;
        self.models.apply_probe(availability);
        let after = self.models.current().id;
        if before != after {
            info!(from = before, to = after, "local model unavailable, switched selection");
        }
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        self.confirmation
    }

    pub fn request_clear_history(&mut self) {
        self.confirmation = Some(Confirmation::ClearHistory);
    }

    pub fn resolve_confirmation(&mut self, accepted: bool) {
        let Some(confirmation) = self.confirmation.take() else {
            return;
        };
        if !accepted {
            return;
        }
        match confirmation {
            Confirmation::ClearHistory => {
                self.history.clear();
                self.history_cursor = None;
                self.push_system(HISTORY_CLEARED_MESSAGE);
                self.tokens.reset();
            }
        }
    }

    /// Copy history entry `index` (0 = most recent) into the input buffer.
    pub fn select_history(&mut self, index: usize) -> bool {
        let Some(prompt) = self.history.recent(index).map(str::to_string) else {
            return false;
        };
        self.history_cursor = Some(index);
        self.input = prompt;
        true
    }

    pub fn recall_history(&mut self, direction: HistoryDirection) -> bool {
        let len = self.history.view().entries().len();
        if len == 0 {
            return false;
        }
        let target = match (direction, self.history_cursor) {
            (HistoryDirection::Older, None) => 0,
            (HistoryDirection::Older, Some(index)) => (index + 1).min(len - 1),
            (HistoryDirection::Newer, None) => return false,
            (HistoryDirection::Newer, Some(0)) => {
                self.history_cursor = None;
                return true;
            }
            (HistoryDirection::Newer, Some(index)) => index - 1,
        };
        self.select_history(target)
    }

    fn push_system(&mut self, content: impl Into<String>) {
        self.transcript.push(TranscriptEntry::system(content));
        self.pin_to_bottom = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::HISTORY_LIMIT;
    use crate::core::message::TranscriptRole;
    use crate::core::models::FALLBACK_MODEL_ID;
    use crate::core::request::AskClient;
    use crate::core::store::MemoryStore;
    use crate::core::tokens::TokenField;
    use crate::utils::test_utils::{closed_port_url, spawn_backend, CannedResponse};

    const STEP: Duration = Duration::from_millis(10);

    fn session_for(base_url: String, model: &str) -> ChatSession {
        let mut session = ChatSession::new(
            PromptHistoryStore::new(Box::new(MemoryStore::new())),
            RequestController::new(AskClient::new(reqwest::Client::new(), base_url)),
            ModelSelector::new(Some(model)),
            STEP,
        );
        session.start();
        session
    }

    fn last_entry(session: &ChatSession) -> &TranscriptEntry {
        session.transcript().last().expect("transcript entry")
    }

    fn finish_reveal(session: &mut ChatSession, start: Instant) {
        session.tick(start + Duration::from_secs(3600));
        assert!(!session.is_revealing());
    }

    #[test]
    fn start_greets_with_model_and_zeroed_tokens() {
        let session = session_for(closed_port_url(), "openai");
        assert_eq!(
            last_entry(&session).content,
            "Welcome! Chatting with OpenAI (GPT-4o-mini). This is Prompt 0."
        );
        assert!(session.tokens().is_empty());
        assert_eq!(session.tokens().current(), TokenUsage::default());
        assert!(session.history().is_empty());
        assert!(session.controls().can_submit);
        assert!(!session.controls().can_cancel);
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut session = session_for(closed_port_url(), "openai");
        let before = session.transcript().len();
        session.set_input("   \n\t ");
        assert!(session.submit_input().is_none());
        assert_eq!(session.transcript().len(), before);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn hello_turn_reveals_reply_and_records_tokens() {
        let backend = spawn_backend(vec![CannedResponse::json(
            200,
            r#"{"response":"Hi there","prompt_tokens":5,"completion_tokens":3,"total_tokens":8}"#,
        )])
        .await;
        let mut session = session_for(backend.base_url(), "openai");

        session.set_input("  Hello ");
        let pending = session.submit_input().expect("turn submitted");
        assert_eq!(pending.request().message, "Hello");
        assert_eq!(pending.request().model_type, "openai");
        assert_eq!(session.input(), "");
        assert!(!session.controls().can_submit);
        assert!(session.controls().can_cancel);
        assert_eq!(last_entry(&session).status, ReplyStatus::Waiting);

        let id = pending.id();
        let outcome = pending.resolve().await;
        let start = Instant::now();
        session.apply_outcome(id, outcome, start);

        assert_eq!(session.request_state(), RequestState::Idle);
        assert!(session.is_revealing());
        assert!(!session.controls().can_submit, "submit waits for the reveal");
        assert_eq!(last_entry(&session).content, "");

        session.tick(start + STEP * 2);
        assert_eq!(last_entry(&session).content, "Hi");

        finish_reveal(&mut session, start);
        let reply = last_entry(&session);
        assert_eq!(reply.content, "Hi there");
        assert_eq!(reply.status, ReplyStatus::Done);
        assert_eq!(reply.model, Some("OpenAI (GPT-4o-mini)"));

        assert_eq!(session.tokens().len(), 1);
        assert_eq!(session.tokens().current(), TokenUsage::new(5, 3, 8));
        assert_eq!(session.tokens().series(TokenField::Total), &[8]);
        assert_eq!(session.history().entries(), ["Hello".to_string()]);
        assert!(session.controls().can_submit);
    }

    #[tokio::test]
    async fn cancelled_turn_shows_stop_message_without_tokens() {
        let backend = spawn_backend(vec![CannedResponse::json(
            200,
            r#"{"response":"late","total_tokens":4}"#,
        )
        .delayed(Duration::from_secs(30))])
        .await;
        let mut session = session_for(backend.base_url(), "openai");

        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        let id = pending.id();
        let task = tokio::spawn(pending.resolve());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(session.cancel());
        let controls = session.controls();
        assert!(!controls.can_cancel);
        assert_eq!(controls.stop_label, "Stopping…");
        assert!(!session.cancel());

        let outcome = task.await.expect("task");
        assert_eq!(outcome, TurnOutcome::Cancelled);
        session.apply_outcome(id, outcome, Instant::now());

        let reply = last_entry(&session);
        assert_eq!(reply.content, STOPPED_MESSAGE);
        assert_eq!(reply.status, ReplyStatus::Stopped);
        assert!(!session.is_revealing());
        assert!(session.tokens().is_empty());
        assert_eq!(session.request_state(), RequestState::Idle);
        assert!(session.controls().can_submit);
        assert_eq!(session.controls().stop_label, "Stop");
    }

    #[tokio::test]
    async fn server_error_is_shown_inline_without_tokens() {
        let backend = spawn_backend(vec![CannedResponse::json(
            500,
            r#"{"response":"internal error"}"#,
        )])
        .await;
        let mut session = session_for(backend.base_url(), "groq");

        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        let id = pending.id();
        let outcome = pending.resolve().await;
        session.apply_outcome(id, outcome, Instant::now());

        let reply = last_entry(&session);
        assert_eq!(reply.content, "internal error");
        assert_eq!(reply.status, ReplyStatus::Failed);
        assert!(session.tokens().is_empty());
        assert!(session.controls().can_submit);
    }

    #[tokio::test]
    async fn network_failure_is_prefixed() {
        let mut session = session_for(closed_port_url(), "openai");
        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        let id = pending.id();
        let outcome = pending.resolve().await;
        session.apply_outcome(id, outcome, Instant::now());

        let reply = last_entry(&session);
        assert!(reply.content.starts_with(NETWORK_ERROR_PREFIX));
        assert_eq!(reply.status, ReplyStatus::Failed);
        assert!(session.controls().can_submit);
    }

    #[test]
    fn eleven_prompts_keep_the_last_ten() {
        let mut session = session_for(closed_port_url(), "openai");
        for i in 1..=11 {
            session.set_input(format!("prompt {i}"));
            let pending = session.submit_input().expect("turn submitted");
            session.apply_outcome(pending.id(), TurnOutcome::Cancelled, Instant::now());
        }

        let entries = session.history().entries();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert_eq!(entries.first().map(String::as_str), Some("prompt 11"));
        assert_eq!(entries.last().map(String::as_str), Some("prompt 2"));
    }

    #[test]
    fn submission_is_refused_while_a_turn_is_pending() {
        let mut session = session_for(closed_port_url(), "openai");
        session.set_input("first");
        let _pending = session.submit_input().expect("turn submitted");

        session.set_input("second");
        assert!(session.submit_input().is_none());
        assert_eq!(session.input(), "second");
        assert_eq!(session.history().entries().len(), 1);
    }

    #[test]
    fn cancel_without_a_turn_changes_nothing() {
        let mut session = session_for(closed_port_url(), "openai");
        let before = session.transcript().len();
        assert!(!session.cancel());
        assert_eq!(session.transcript().len(), before);
        assert_eq!(
            session.controls(),
            Controls {
                can_submit: true,
                can_cancel: false,
                stop_label: "Stop",
            }
        );
    }

    #[test]
    fn stale_outcome_is_dropped() {
        let mut session = session_for(closed_port_url(), "openai");
        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");

        session.apply_outcome(pending.id() + 100, TurnOutcome::Cancelled, Instant::now());
        assert_eq!(last_entry(&session).status, ReplyStatus::Waiting);
        assert_eq!(session.request_state(), RequestState::Pending);
    }

    #[test]
    fn model_change_is_announced() {
        let mut session = session_for(closed_port_url(), "openai");
        assert!(session.select_model("gemini-flash"));
        let entry = last_entry(&session);
        assert_eq!(entry.role, TranscriptRole::System);
        assert_eq!(entry.content, "Model changed to Gemini Flash.");

        let before = session.transcript().len();
        assert!(!session.select_model("gemini-flash"));
        assert_eq!(session.transcript().len(), before);
    }

    #[test]
    fn model_change_leaves_pending_turn_alone() {
        let mut session = session_for(closed_port_url(), "openai");
        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        assert!(session.cycle_model());
        assert_eq!(pending.request().model_type, "openai");
        assert_eq!(session.request_state(), RequestState::Pending);
    }

    #[test]
    fn clear_history_requires_confirmation() {
        let mut session = session_for(closed_port_url(), "openai");
        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        session.apply_outcome(
            pending.id(),
            TurnOutcome::Completed(crate::api::AskResponse {
                response: "Hi".to_string(),
                prompt_tokens: 1,
                completion_tokens: 1,
                total_tokens: 2,
            }),
            Instant::now(),
        );
        finish_reveal(&mut session, Instant::now());

        session.request_clear_history();
        assert_eq!(session.confirmation(), Some(Confirmation::ClearHistory));
        assert!(!session.controls().can_submit);
        session.resolve_confirmation(false);
        assert!(!session.history().is_empty());
        assert_eq!(session.tokens().len(), 1);

        session.request_clear_history();
        session.resolve_confirmation(true);
        assert!(session.history().is_empty());
        assert!(session.tokens().is_empty());
        assert_eq!(session.tokens().current(), TokenUsage::default());
        assert_eq!(last_entry(&session).content, HISTORY_CLEARED_MESSAGE);
        assert!(session.confirmation().is_none());
    }

    #[test]
    fn history_recall_copies_without_submitting() {
        let mut session = session_for(closed_port_url(), "openai");
        for text in ["older", "newer"] {
            session.set_input(text);
            let pending = session.submit_input().expect("turn submitted");
            session.apply_outcome(pending.id(), TurnOutcome::Cancelled, Instant::now());
        }
        let before = session.transcript().len();

        assert!(session.recall_history(HistoryDirection::Older));
        assert_eq!(session.input(), "newer");
        assert!(session.recall_history(HistoryDirection::Older));
        assert_eq!(session.input(), "older");
        assert!(session.recall_history(HistoryDirection::Older));
        assert_eq!(session.history_cursor(), Some(1));
        assert!(session.recall_history(HistoryDirection::Newer));
        assert_eq!(session.input(), "newer");
        assert!(session.recall_history(HistoryDirection::Newer));
        assert_eq!(session.history_cursor(), None);

        assert_eq!(session.transcript().len(), before);
        assert!(!session.select_history(5));
    }

    #[test]
    fn offline_probe_moves_selection_to_fallback() {
        let mut session = session_for(closed_port_url(), "llama3");
        session.apply_probe(Availability::Unavailable);
        assert_eq!(session.current_model().id, FALLBACK_MODEL_ID);
        assert!(!session.select_model("llama3"));
    }

    #[test]
    fn reveal_pins_transcript_to_bottom() {
        let mut session = session_for(closed_port_url(), "openai");
        session.take_pin_to_bottom();
        session.set_input("Hello");
        let pending = session.submit_input().expect("turn submitted");
        assert!(session.take_pin_to_bottom());

        let start = Instant::now();
        session.apply_outcome(
            pending.id(),
            TurnOutcome::Completed(crate::api::AskResponse {
                response: "abc".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
            }),
            start,
        );
        session.take_pin_to_bottom();
        assert!(session.tick(start + STEP));
        assert!(session.take_pin_to_bottom());
        assert!(!session.tick(start + STEP));
        assert!(!session.take_pin_to_bottom());
        assert_eq!(session.next_tick_in(), Some(STEP));
    }
}
