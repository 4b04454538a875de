use tokio::sync::mpsc;

use crate::core::request::{PendingRequest, TurnId, TurnOutcome};

/// Drives submitted turns on background tasks and reports their outcomes
/// back to the event loop.
#[derive(Clone)]
pub struct TurnService {
    tx: mpsc::UnboundedSender<(TurnOutcome, TurnId)>,
}

impl TurnService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(TurnOutcome, TurnId)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_turn(&self, pending: PendingRequest) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let id = pending.id();
            let outcome = pending.resolve().await;
            let _ = tx.send((outcome, id));
        });
    }
}
