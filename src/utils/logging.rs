//! Diagnostic logging setup.
//!
//! The full-screen UI owns the terminal, so its diagnostics only go to a file
//! when `--log` is given. One-shot commands log to stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive string.
pub const LOG_ENV: &str = "CHATGAUGE_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    /// Write to the given file, appending.
    File(&'a Path),
    Stderr,
    Disabled,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Calling this more than once is harmless.
pub fn init_tracing(target: LogTarget<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true);

    let result = match target {
        LogTarget::Disabled => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };

    if let Err(err) = result {
        // A subscriber is already installed (tests, repeated init); keep it.
        tracing::debug!(error = %err, "tracing already initialised");
    }
    Ok(())
}
