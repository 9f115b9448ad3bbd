use crate::cli::ux::highlight::{MarkdownHighlighter, get_theme};
use crate::cli::ux::{ChatMessageType, style_chat_text};
use anyhow::Result;
use console::{Term, measure_text_width};
use indicatif::{ProgressBar, ProgressStyle};
use litechat_core::config::Theme;
use litechat_core::session::ResponseRenderer;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn generation_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(SPINNER_TICKS);
    spinner.set_style(style);
    spinner.set_message("Generating...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Draws a streamed response on a terminal.
///
/// Every update carries the whole response so far. Only the new suffix is
/// written; with highlighting on, the trailing partial line is erased and
/// redrawn so its styling can change once more text arrives.
pub struct TerminalRenderer {
    term: Term,
    // None renders raw text.
    highlighter: Option<MarkdownHighlighter>,
    spinner: Option<ProgressBar>,
    show_spinner: bool,
    // Terminal width, used to erase partial lines that wrapped.
    width: Option<usize>,
    rendered_len: usize,
    partial_width: usize,
}

impl TerminalRenderer {
    /// A renderer for stdout with a spinner on stderr while waiting.
    pub fn stdout(theme: Theme) -> Self {
        let mut renderer = Self::new(Term::stdout(), theme);
        renderer.show_spinner = Term::stderr().is_term();
        renderer.width = renderer
            .term
            .size_checked()
            .map(|(_, cols)| cols as usize);
        renderer
    }

    pub fn new(term: Term, theme: Theme) -> Self {
        let highlighter = match theme {
            Theme::Ansi => match get_theme() {
                Ok(theme) => Some(MarkdownHighlighter::new(theme)),
                Err(e) => {
                    warn!("Falling back to plain output, theme failed to load: {e}");
                    None
                }
            },
            Theme::Plain => None,
        };
        Self {
            term,
            highlighter,
            spinner: None,
            show_spinner: false,
            width: None,
            rendered_len: 0,
            partial_width: 0,
        }
    }

    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Erases the partial line drawn by the previous update.
    fn clear_partial_line(&mut self) -> Result<()> {
        if self.partial_width == 0 {
            return Ok(());
        }
        let wrapped_rows = match self.width {
            Some(width) if width > 0 => (self.partial_width - 1) / width,
            _ => 0,
        };
        self.term.clear_line()?;
        for _ in 0..wrapped_rows {
            self.term.move_cursor_up(1)?;
            self.term.clear_line()?;
        }
        self.partial_width = 0;
        Ok(())
    }

    fn draw(&mut self, text: &str) -> Result<()> {
        // Responses only grow; anything that is not an extension of what is
        // already on screen is ignored.
        let delta = text.get(self.rendered_len..).unwrap_or_default();
        if delta.is_empty() {
            return Ok(());
        }
        self.rendered_len = text.len();

        if self.highlighter.is_none() {
            self.term.write_str(delta)?;
            return self.term.flush().map_err(Into::into);
        }

        self.clear_partial_line()?;
        if let Some(highlighter) = self.highlighter.as_mut() {
            let output = highlighter.highlight(delta);
            self.term.write_str(&output)?;
            self.partial_width = measure_text_width(highlighter.pending());
        }
        self.term.flush()?;
        Ok(())
    }

    /// Terminates the last line of a non-empty response.
    fn end_response(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.clear_partial_line()?;
        match self.highlighter.as_mut() {
            Some(highlighter) if !highlighter.pending().is_empty() => {
                let output = highlighter.highlight("\n");
                self.term.write_str(&output)?;
            }
            None if !text.ends_with('\n') => self.term.write_str("\n")?,
            _ => {}
        }
        self.term.flush()?;
        Ok(())
    }
}

impl ResponseRenderer for TerminalRenderer {
    fn start(&mut self) -> Result<()> {
        self.rendered_len = 0;
        self.partial_width = 0;
        if let Some(highlighter) = self.highlighter.as_mut() {
            highlighter.new_session();
        }
        if self.show_spinner {
            self.spinner = Some(generation_spinner());
        }
        Ok(())
    }

    fn update(&mut self, text: &str) -> Result<()> {
        self.clear_spinner();
        self.draw(text)
    }

    fn finish(&mut self, text: &str) -> Result<()> {
        self.clear_spinner();
        self.draw(text)?;
        self.end_response(text)
    }

    fn report_failure(&mut self, error: &anyhow::Error) -> Result<()> {
        self.clear_spinner();
        writeln!(
            self.term,
            "{} {error}",
            style_chat_text("Provider error:", ChatMessageType::Error)
        )?;
        self.term.flush()?;
        Ok(())
    }
}
