//! litechat cli definition and entrypoint.
mod chat;
mod models;
mod run;
pub mod ux;

use std::io::{Write, stdout};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use litechat_core::config::{Config, get_config};
use litechat_core::get_completion_llm;
use litechat_core::registry::{ModelKey, RegistryError};
use tracing::debug;

use crate::cli::models::write_model_list;
use crate::cli::ux::{ChatMessageType, format_model_line, style_chat_text};
use crate::log::setup_logging;

/// litechat - chat with hosted large language models from the terminal.
///
/// Answers PROMPT and exits, or starts an interactive chat when no prompt is
/// given.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Prompt to answer. When present, even if empty, litechat answers it and
    /// exits.
    prompt: Option<String>,

    /// Model key as <provider>/<model>, e.g. openai/gpt-4.1-nano.
    #[arg(short, long)]
    model: Option<String>,

    /// List available models and exit.
    #[arg(long)]
    list_models: bool,

    /// Path to the config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write debug logs to the data directory.
    #[arg(short, long)]
    verbose: bool,
}

/// Picks the startup model: `--model` if given, else the configured default.
fn startup_model(config: &Config, requested: Option<&str>) -> Result<ModelKey, RegistryError> {
    let key = requested.unwrap_or(&config.default_model);
    config.registry.model_key(key)
}

/// Runs the CLI and returns the process exit code.
pub async fn run() -> Result<i32> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    // Credentials may come from a .env file, which is optional.
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env loaded: {e}");
    }

    let config = get_config(cli.config.clone()).context("Failed to load configuration")?;
    let mut out = stdout();

    if cli.list_models {
        write_model_list(&config.registry, &mut out)?;
        return Ok(0);
    }

    let model = match startup_model(&config, cli.model.as_deref()) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("{}", style_chat_text(&e.to_string(), ChatMessageType::Error));
            eprintln!(
                "{}",
                style_chat_text(
                    "Use --list-models to see available models.",
                    ChatMessageType::Footer
                )
            );
            return Ok(1);
        }
    };
    writeln!(
        out,
        "{}",
        format_model_line("Using model:", model.display_name(), model.as_str())
    )?;

    let completion_model = get_completion_llm(&config.gateway)
        .context("Failed to initialize completion provider")?;

    match cli.prompt.as_deref() {
        Some(prompt) => {
            run::execute(prompt, &model, completion_model.as_ref(), &config).await?
        }
        None => chat::execute(&config, model, completion_model.as_ref()).await?,
    }
    Ok(0)
}
