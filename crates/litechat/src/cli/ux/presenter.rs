use console::{Style, StyledObject};

/// Represents the type of a chat message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    /// Status lines such as "Using model:".
    Info,
    /// A model or provider name.
    Model,
    /// A full `<provider>/<model>` key.
    Key,
    /// Hints and other secondary output.
    Footer,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().blue().bold(),
        ChatMessageType::Info => Style::new().green(),
        ChatMessageType::Model => Style::new().magenta(),
        ChatMessageType::Key => Style::new().cyan(),
        ChatMessageType::Footer => Style::new().white().dim(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// Formats `<label> <display name> (Key: <key>)`, used whenever the active
/// model is announced.
pub fn format_model_line(label: &str, display_name: &str, key: &str) -> String {
    format!(
        "{} {} (Key: {})",
        style_chat_text(label, ChatMessageType::Info),
        style_chat_text(display_name, ChatMessageType::Model),
        style_chat_text(key, ChatMessageType::Key),
    )
}
