//! Bounded log of recently submitted prompts.

use tracing::{debug, warn};

use crate::core::store::{encode_value, KeyValueStore, StoreError};

/// Storage key holding the JSON array of prompts.
pub const HISTORY_KEY: &str = "chatPrompts";
/// Maximum number of prompts kept; older ones are evicted first.
pub const HISTORY_LIMIT: usize = 10;
pub const EMPTY_HISTORY_PLACEHOLDER: &str = "No previous prompts.";

/// What the history panel should show after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Empty,
    /// Most recent prompt first.
    Entries(Vec<String>),
}

impl HistoryView {
    fn from_chronological(prompts: &[String]) -> Self {
        if prompts.is_empty() {
            HistoryView::Empty
        } else {
            HistoryView::Entries(prompts.iter().rev().cloned().collect())
        }
    }

    pub fn entries(&self) -> &[String] {
        match self {
            HistoryView::Empty => &[],
            HistoryView::Entries(entries) => entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, HistoryView::Empty)
    }

    /// Lines for display, using the placeholder when nothing is stored.
    pub fn display_lines(&self) -> Vec<&str> {
        match self {
            HistoryView::Empty => vec![EMPTY_HISTORY_PLACEHOLDER],
            HistoryView::Entries(entries) => entries.iter().map(String::as_str).collect(),
        }
    }
}

pub struct PromptHistoryStore {
    store: Box<dyn KeyValueStore>,
    view: HistoryView,
}

impl PromptHistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let mut history = Self {
            store,
            view: HistoryView::Empty,
        };
        history.refresh();
        history
    }

    /// Stored prompts in submission order. Missing or malformed state reads as empty.
    pub fn load(&self) -> Vec<String> {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "could not read prompt history");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(prompts) => prompts,
            Err(err) => {
                debug!(error = %err, "discarding malformed prompt history");
                Vec::new()
            }
        }
    }

    /// Read-modify-write: push `prompt`, trim to [`HISTORY_LIMIT`], persist the whole list.
    pub fn append(&mut self, prompt: &str) -> &HistoryView {
        let mut prompts = self.load();
        prompts.push(prompt.to_string());
        if prompts.len() > HISTORY_LIMIT {
            let overflow = prompts.len() - HISTORY_LIMIT;
            prompts.drain(..overflow);
        }

        if let Err(err) = self.persist(&prompts) {
            warn!(error = %err, "could not save prompt history");
        }
        self.view = HistoryView::from_chronological(&prompts);
        &self.view
    }

    pub fn clear(&mut self) -> &HistoryView {
        if let Err(err) = self.store.remove(HISTORY_KEY) {
            warn!(error = %err, "could not clear prompt history");
        }
        self.view = HistoryView::Empty;
        &self.view
    }

    /// Re-read persisted state into the cached view.
    pub fn refresh(&mut self) -> &HistoryView {
        self.view = HistoryView::from_chronological(&self.load());
        &self.view
    }

    pub fn view(&self) -> &HistoryView {
        &self.view
    }

    /// Entry `index` counted from the most recent prompt.
    pub fn recent(&self, index: usize) -> Option<&str> {
        self.view.entries().get(index).map(String::as_str)
    }

    fn persist(&mut self, prompts: &[String]) -> Result<(), StoreError> {
        let encoded = encode_value(HISTORY_KEY, prompts)?;
        self.store.set(HISTORY_KEY, &encoded)
    }
}
