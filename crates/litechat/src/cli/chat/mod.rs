use crate::cli::ux::{ChatMessageType, TerminalRenderer, style_chat_text};
use anyhow::{Context, Result};
use litechat_core::completion::CompletionModel;
use litechat_core::config::Config;
use litechat_core::registry::ModelKey;
use repl::{ChatContext, ChatState, Interrupt, RustylineReader};
use std::io::stdout;

mod commands;
mod compl;
mod prompt;
mod repl;

/// Starts an interactive chat session with `model`.
pub async fn execute(
    config: &Config,
    model: ModelKey,
    completion_model: &dyn CompletionModel,
) -> Result<()> {
    println!(
        "{}",
        style_chat_text(
            "Type /models to list models, /model <key> to switch, /exit to quit.",
            ChatMessageType::Footer
        )
    );

    let mut reader = RustylineReader::new(config.registry.keys())
        .context("Failed to initialize line editor")?;
    let mut renderer = TerminalRenderer::stdout(config.theme);
    let interrupt = Interrupt::listen();
    let ctx = ChatContext {
        registry: &config.registry,
        completion_model,
        refresh_per_second: config.refresh_per_second,
        interrupt: &interrupt,
    };
    let mut state = ChatState::new(model);

    repl::run(&mut state, &ctx, &mut reader, &mut renderer, &mut stdout()).await
}
