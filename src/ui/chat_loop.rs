//! Event loop for the full-screen chat.
//!
//! Terminal input arrives from a reader task over a channel, turn outcomes
//! arrive from [`TurnService`], and the local-model probe reports once over a
//! oneshot. The loop redraws after every wake-up.

use std::{
    error::Error,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind, MouseEventKind};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::core::models::{Availability, ReachabilityProbe};
use crate::core::session::ChatSession;
use crate::core::turn_service::TurnService;
use crate::ui::keys::{handle_key, handle_mouse_scroll, handle_paste, LoopControl};
use crate::ui::lifecycle::{restore_terminal, setup_terminal, AppTerminal};
use crate::ui::renderer::{ui, ViewState};

/// Upper bound on how long the loop sleeps with nothing to do.
const IDLE_WAKE: Duration = Duration::from_millis(250);

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<Event>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn spawn_probe(probe: Box<dyn ReachabilityProbe>) -> oneshot::Receiver<Availability> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let availability = probe.check().await;
        let _ = tx.send(availability);
    });
    rx
}

pub async fn run_chat(
    mut session: ChatSession,
    probe: Box<dyn ReachabilityProbe>,
) -> Result<(), Box<dyn Error>> {
    session.start();
    let probe_rx = spawn_probe(probe);

    let mut terminal = setup_terminal()?;
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
    let event_reader = spawn_event_reader(event_tx);

    let result = event_loop(&mut terminal, &mut session, event_rx, probe_rx).await;

    event_reader.abort();
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut AppTerminal,
    session: &mut ChatSession,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    mut probe_rx: oneshot::Receiver<Availability>,
) -> Result<(), Box<dyn Error>> {
    let (turns, mut outcome_rx) = TurnService::new();
    let mut view = ViewState::default();
    let mut probe_pending = true;

    loop {
        if session.take_pin_to_bottom() {
            view.follow = true;
        }
        terminal.draw(|f| ui(f, &mut view, session))?;

        let wait = session.next_tick_in().unwrap_or(IDLE_WAKE);
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(ev) = maybe_event else {
                    debug!("terminal event reader stopped");
                    return Ok(());
                };
                if handle_event(session, &mut view, ev, &turns) == LoopControl::Quit {
                    info!("quitting chat");
                    return Ok(());
                }
                // Drain whatever else queued up before the next draw.
                while let Ok(ev) = event_rx.try_recv() {
                    if handle_event(session, &mut view, ev, &turns) == LoopControl::Quit {
                        return Ok(());
                    }
                }
            }
            Some((outcome, id)) = outcome_rx.recv() => {
                session.apply_outcome(id, outcome, Instant::now());
            }
            probed = &mut probe_rx, if probe_pending => {
                probe_pending = false;
                session.apply_probe(probed.unwrap_or(Availability::Unknown));
            }
            _ = tokio::time::sleep(wait) => {}
        }

        session.tick(Instant::now());
    }
}

fn handle_event(
    session: &mut ChatSession,
    view: &mut ViewState,
    ev: Event,
    turns: &TurnService,
) -> LoopControl {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(session, view, key, turns),
        Event::Paste(text) => {
            handle_paste(session, &text);
            LoopControl::Continue
        }
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => handle_mouse_scroll(view, true),
                MouseEventKind::ScrollDown => handle_mouse_scroll(view, false),
                _ => {}
            }
            LoopControl::Continue
        }
        _ => LoopControl::Continue,
    }
}
