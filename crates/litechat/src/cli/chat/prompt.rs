use crate::cli::ux::{ChatMessageType, style_chat_text};
use litechat_core::registry::ModelKey;

/// Formats the REPL prompt: `(<display name>) You: `.
pub fn format_status_prompt(model: &ModelKey) -> String {
    format!(
        "{}{}{}{} ",
        style_chat_text("(", ChatMessageType::Footer),
        style_chat_text(model.display_name(), ChatMessageType::Model),
        style_chat_text(") ", ChatMessageType::Footer),
        style_chat_text("You:", ChatMessageType::Prompt),
    )
}
