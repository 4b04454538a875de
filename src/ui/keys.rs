//! Key and paste handling for the chat screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::core::session::{ChatSession, HistoryDirection};
use crate::core::turn_service::TurnService;
use crate::ui::renderer::ViewState;

const MOUSE_SCROLL_LINES: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

pub fn handle_key(
    session: &mut ChatSession,
    view: &mut ViewState,
    key: KeyEvent,
    turns: &TurnService,
) -> LoopControl {
    if is_ctrl_c(&key) {
        return LoopControl::Quit;
    }

    if session.confirmation().is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                session.resolve_confirmation(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                session.resolve_confirmation(false)
            }
            _ => {}
        }
        return LoopControl::Continue;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => session.push_char('\n'),
        KeyCode::Enter => {
            if let Some(pending) = session.submit_input() {
                debug!(turn = pending.id(), "dispatching turn");
                turns.spawn_turn(pending);
            }
        }
        KeyCode::Esc => {
            session.cancel();
        }
        KeyCode::Tab => {
            session.cycle_model();
        }
        KeyCode::Up if ctrl => {
            session.recall_history(HistoryDirection::Older);
        }
        KeyCode::Down if ctrl => {
            session.recall_history(HistoryDirection::Newer);
        }
        KeyCode::Char('l') | KeyCode::Char('L') if ctrl => session.request_clear_history(),
        KeyCode::PageUp => view.scroll_up(view.page),
        KeyCode::PageDown => view.scroll_down(view.page),
        KeyCode::Backspace => session.backspace(),
        KeyCode::Char(c) if !ctrl => session.push_char(c),
        _ => {}
    }
    LoopControl::Continue
}

/// Insert pasted text at the end of the input buffer.
pub fn handle_paste(session: &mut ChatSession, text: &str) {
    if session.confirmation().is_some() {
        return;
    }
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut input = session.input().to_string();
    input.push_str(&normalized);
    session.set_input(input);
}

pub fn handle_mouse_scroll(view: &mut ViewState, up: bool) {
    if up {
        view.scroll_up(MOUSE_SCROLL_LINES);
    } else {
        view.scroll_down(MOUSE_SCROLL_LINES);
    }
}
