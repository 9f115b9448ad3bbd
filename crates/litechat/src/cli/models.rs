use crate::cli::ux::{ChatMessageType, style_chat_text};
use litechat_core::registry::ModelRegistry;
use std::io::Write;

/// Writes every registry entry, grouped by provider.
pub fn write_model_list(registry: &ModelRegistry, out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        out,
        "{}",
        style_chat_text("Available Models:", ChatMessageType::Info)
    )?;
    for provider in registry.providers() {
        writeln!(
            out,
            "  {}:",
            style_chat_text(&provider.name, ChatMessageType::Model)
        )?;
        for model in &provider.models {
            let key = format!("{}/{}", provider.name, model.name);
            writeln!(
                out,
                "    - {} {}",
                style_chat_text(&key, ChatMessageType::Key),
                style_chat_text(
                    &format!("({} tokens)", model.capabilities.max_tokens),
                    ChatMessageType::Footer
                ),
            )?;
        }
    }
    Ok(())
}
