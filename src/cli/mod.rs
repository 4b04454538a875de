//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod history;
pub mod models;

use std::error::Error;
use std::path::Path;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::ask::run_ask;
use crate::cli::history::run_history;
use crate::cli::models::run_models;
use crate::core::config::{Config, ConfigKey, SettingError};
use crate::core::history::PromptHistoryStore;
use crate::core::models::{find_model, HttpProbe, ModelSelector, ModelSpec};
use crate::core::request::{AskClient, RequestController};
use crate::core::session::ChatSession;
use crate::core::store::{FileStore, KeyValueStore, MemoryStore};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LogTarget};

static LONG_VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}\ncommit: {}\nbuilt: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"),
    )
});

#[derive(Parser)]
#[command(name = "chatgauge")]
#[command(about = "A terminal chat client that charts token usage per prompt")]
#[command(version, long_version = LONG_VERSION.as_str())]
#[command(
    long_about = "chatgauge is a full-screen terminal chat client for an /ask backend. \
Each reply's prompt, completion and total token counts are charted next to the \
conversation, and the last ten prompts are kept for quick recall.\n\n\
Environment Variables:\n\
  CHATGAUGE_BASE_URL   Backend base URL (overrides the config file)\n\
  CHATGAUGE_LOG        Log filter directive, e.g. debug or chatgauge=trace\n\n\
Controls:\n\
  Enter             Send the message\n\
  Esc               Stop waiting for the current reply\n\
  Tab               Switch to the next available model\n\
  Ctrl+Up/Down      Recall previous prompts into the input\n\
  Ctrl+L            Clear prompt history (asks first)\n\
  PgUp/PgDn/Mouse   Scroll the conversation\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to start with (llama3, groq, openai, gemini-flash)
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Backend base URL
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Enable logging to specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,

    /// Keep prompt history in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one prompt without the full-screen interface
    Ask {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Show stored prompts, most recent first
    History {
        /// Remove all stored prompts
        #[arg(long)]
        clear: bool,
    },
    /// List models and whether the local one is reachable
    Models,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    let log_target = match (&command, args.log.as_deref()) {
        (_, Some(path)) => LogTarget::File(Path::new(path)),
        (Commands::Chat, None) => LogTarget::Disabled,
        _ => LogTarget::Stderr,
    };
    init_tracing(log_target)?;

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let value = value.map(|parts| parts.join(" ")).filter(|v| !v.is_empty());
            match (key, value) {
                (Some(key), Some(value)) => {
                    let key: ConfigKey = key.parse()?;
                    config.set_value(key, &value)?;
                    config.save()?;
                    println!("✅ Set {} to: {value}", key.name());
                }
                _ => config.print_all(),
            }
            Ok(())
        }
        Commands::Unset { key } => {
            let key: ConfigKey = key.parse()?;
            let mut config = Config::load()?;
            config.unset_value(key);
            config.save()?;
            println!("✅ Unset {}", key.name());
            Ok(())
        }
        Commands::History { clear } => {
            let history = open_history(args.ephemeral)?;
            run_history(history, clear);
            Ok(())
        }
        Commands::Models => {
            let config = Config::load()?;
            let model = resolve_model(&config, args.model.as_deref())?;
            let probe = HttpProbe::new(reqwest::Client::new(), config.ollama_url());
            run_models(&probe, model).await;
            Ok(())
        }
        Commands::Ask { prompt } => {
            let config = Config::load()?;
            let model = resolve_model(&config, args.model.as_deref())?;
            let requests = RequestController::new(ask_client(&config, args.base_url.as_deref()));
            let history = open_history(args.ephemeral)?;
            run_ask(prompt.join(" "), model, requests, history).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let model = resolve_model(&config, args.model.as_deref())?;
            let client = reqwest::Client::new();
            let session = ChatSession::new(
                open_history(args.ephemeral)?,
                RequestController::new(ask_client(&config, args.base_url.as_deref())),
                ModelSelector::new(Some(model.id)),
                config.reveal_delay(),
            );
            let probe = HttpProbe::new(client, config.ollama_url());
            run_chat(session, Box::new(probe)).await
        }
    }
}

fn resolve_model(
    config: &Config,
    cli_override: Option<&str>,
) -> Result<&'static ModelSpec, SettingError> {
    let id = config.resolve_model(cli_override);
    find_model(id).ok_or_else(|| SettingError::UnknownModel(id.to_string()))
}

fn ask_client(config: &Config, base_url_override: Option<&str>) -> AskClient {
    let base_url = config.resolve_base_url(base_url_override);
    debug!(base_url = %base_url, "using backend");
    AskClient::new(reqwest::Client::new(), base_url).with_timeout(config.request_timeout())
}

fn open_history(ephemeral: bool) -> Result<PromptHistoryStore, Box<dyn Error>> {
    let store: Box<dyn KeyValueStore> = if ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::in_data_dir()?)
    };
    Ok(PromptHistoryStore::new(store))
}
