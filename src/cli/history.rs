//! `chatgauge history`: print or clear the stored prompts.

use crate::core::history::{HistoryView, PromptHistoryStore};
use crate::core::session::HISTORY_CLEARED_MESSAGE;

pub fn run_history(mut history: PromptHistoryStore, clear: bool) {
    if clear {
        history.clear();
        println!("✅ {HISTORY_CLEARED_MESSAGE}");
        return;
    }
    for line in history_lines(history.view()) {
        println!("{line}");
    }
}

/// Numbered lines, most recent first. An empty history yields the placeholder.
pub fn history_lines(view: &HistoryView) -> Vec<String> {
    match view {
        HistoryView::Empty => view
            .display_lines()
            .into_iter()
            .map(str::to_string)
            .collect(),
        HistoryView::Entries(entries) => entries
            .iter()
            .enumerate()
            .map(|(i, prompt)| format!("{:>2}. {prompt}", i + 1))
            .collect(),
    }
}
