use crate::cli::ux::{ChatMessageType, TerminalRenderer, style_chat_text};
use anyhow::Result;
use litechat_core::completion::{ChatHistory, CompletionModel};
use litechat_core::config::Config;
use litechat_core::registry::ModelKey;
use litechat_core::session::{ResponseRenderer, StreamingSession};

/// Answers a single prompt and returns.
///
/// Provider failures are reported by the renderer and are not errors here.
pub async fn execute(
    prompt: &str,
    model: &ModelKey,
    completion_model: &dyn CompletionModel,
    config: &Config,
) -> Result<()> {
    let session = StreamingSession::new(completion_model, config.refresh_per_second);
    let mut renderer = TerminalRenderer::stdout(config.theme);

    tokio::select! {
        result = answer(&session, prompt, model, &mut renderer) => result.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n{}", style_chat_text("Interrupted", ChatMessageType::Footer));
            Ok(())
        }
    }
}

async fn answer(
    session: &StreamingSession<'_>,
    prompt: &str,
    model: &ModelKey,
    renderer: &mut dyn ResponseRenderer,
) -> Result<ChatHistory> {
    session
        .stream(prompt, model.provider_model_id(), ChatHistory::new(), renderer)
        .await
}
