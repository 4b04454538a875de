//! TUI-less "ask" command

use std::error::Error;
use std::future::Future;
use std::io;

use tracing::{info, warn};

use crate::core::history::PromptHistoryStore;
use crate::core::models::ModelSpec;
use crate::core::request::{RequestController, RequestError, TurnOutcome};
use crate::core::session::{failure_text, STOPPED_MESSAGE};
use crate::core::tokens::TokenUsage;

pub async fn run_ask(
    prompt: String,
    model: &'static ModelSpec,
    mut requests: RequestController,
    mut history: PromptHistoryStore,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.trim().to_string();
    if prompt.is_empty() {
        eprintln!("Usage: chatgauge ask <prompt>");
        std::process::exit(1);
    }

    let interrupt = interrupt_signal(tokio::signal::ctrl_c());
    let outcome = ask_once(&mut requests, &mut history, &prompt, model, interrupt).await?;

    match render_outcome(outcome) {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(text) => {
            eprintln!("❌ {text}");
            std::process::exit(1);
        }
    }
}

/// Resolve when `signal` reports an interrupt. If the listener could not be
/// installed the error is logged and this never resolves.
async fn interrupt_signal<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal.await {
        warn!(error = %err, "could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Record `prompt` in history and run one turn. When `interrupt` completes
/// first the request is cancelled and the outcome is `Cancelled`.
pub async fn ask_once<F>(
    requests: &mut RequestController,
    history: &mut PromptHistoryStore,
    prompt: &str,
    model: &ModelSpec,
    interrupt: F,
) -> Result<TurnOutcome, RequestError>
where
    F: Future<Output = ()>,
{
    history.append(prompt);
    let pending = requests.submit(prompt, model.id)?;
    let id = pending.id();

    let resolving = pending.resolve();
    tokio::pin!(resolving);
    tokio::pin!(interrupt);

    let outcome = tokio::select! {
        outcome = &mut resolving => outcome,
        _ = &mut interrupt => {
            info!(turn = id, "interrupted from the terminal");
            requests.cancel();
            resolving.await
        }
    };
    requests.settle(id);
    Ok(outcome)
}

/// Text to print for a finished turn: `Ok` for stdout, `Err` for stderr.
pub fn render_outcome(outcome: TurnOutcome) -> Result<String, String> {
    match outcome {
        TurnOutcome::Completed(response) => {
            let usage = TokenUsage::from(&response);
            Ok(format!(
                "{}\n\nTokens: prompt {}, completion {}, total {}",
                response.response, usage.prompt, usage.completion, usage.total
            ))
        }
        TurnOutcome::Failed(err) => Err(failure_text(err)),
        TurnOutcome::Cancelled => Err(STOPPED_MESSAGE.to_string()),
    }
}
