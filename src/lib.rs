//! chatgauge is a terminal chat client for an `/ask` backend that charts the
//! token usage of every reply.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the chat session: prompt history persistence, the token
//!   series, model selection and the cancellable request controller.
//! - [`ui`] renders the terminal dashboard and runs the interactive event loop.
//! - [`api`] defines the `/ask` request and response payloads.
//! - [`cli`] parses arguments and dispatches one-shot commands.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
