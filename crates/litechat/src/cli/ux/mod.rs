mod highlight;
mod presenter;
mod render;

pub use presenter::{ChatMessageType, format_model_line, style_chat_text};
pub use render::TerminalRenderer;

use console::style;

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
