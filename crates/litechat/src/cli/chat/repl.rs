use crate::cli::chat::commands::{Command, interpret};
use crate::cli::chat::compl::Repl;
use crate::cli::chat::prompt::format_status_prompt;
use crate::cli::models::write_model_list;
use crate::cli::ux::{ChatMessageType, format_model_line, style_chat_text};
use anyhow::{Context, Result};
use async_trait::async_trait;
use litechat_core::completion::{ChatHistory, CompletionModel};
use litechat_core::registry::{ModelKey, ModelRegistry};
use litechat_core::session::{ResponseRenderer, StreamingSession};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Editor};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

/// Source of REPL input lines.
#[async_trait]
pub trait LineReader: Send {
    /// Reads one line. `None` means end of input or a user interrupt.
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Reads lines from the terminal with history and tab completion.
pub struct RustylineReader {
    // Lent to the blocking read task while a line is being read.
    editor: Option<Editor<Repl, DefaultHistory>>,
}

impl RustylineReader {
    pub fn new(model_keys: Vec<String>) -> Result<Self> {
        let config = rustyline::Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(Repl::new(model_keys)));
        Ok(Self {
            editor: Some(editor),
        })
    }
}

#[async_trait]
impl LineReader for RustylineReader {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut editor = self
            .editor
            .take()
            .context("Line editor was lost by an interrupted read")?;
        let prompt = prompt.to_string();
        // Off the runtime threads so an interrupt can end the session mid-read.
        let (editor, line) = tokio::task::spawn_blocking(move || {
            let line = editor.readline(&prompt);
            (editor, line)
        })
        .await?;

        let editor = self.editor.insert(editor);
        match line {
            Ok(line) => {
                editor.add_history_entry(line.as_str())?;
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Ctrl-C delivered to a running chat session.
///
/// A signal that arrives while nothing is waiting is kept until the next
/// wait, so an interrupt between two reads still ends the session.
#[derive(Debug, Default)]
pub struct Interrupt {
    notify: Notify,
}

impl Interrupt {
    /// Forwards process interrupts to a new `Interrupt`.
    pub fn listen() -> Arc<Self> {
        let interrupt = Arc::new(Self::default());
        let forward = Arc::clone(&interrupt);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Received interrupt");
                forward.trigger();
            }
        });
        interrupt
    }

    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    async fn wait(&self) {
        self.notify.notified().await
    }
}

/// Mutable state of an interactive session.
#[derive(Debug, Clone)]
pub struct ChatState {
    /// Always a key that resolved against the registry.
    pub model: ModelKey,
    pub history: ChatHistory,
}

impl ChatState {
    pub fn new(model: ModelKey) -> Self {
        Self {
            model,
            history: ChatHistory::new(),
        }
    }
}

/// Read-only collaborators of the session loop.
pub struct ChatContext<'a> {
    pub registry: &'a ModelRegistry,
    pub completion_model: &'a dyn CompletionModel,
    pub refresh_per_second: u32,
    pub interrupt: &'a Interrupt,
}

fn write_exiting(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "{}", style_chat_text("Exiting...", ChatMessageType::Footer))
}

/// Runs the interactive loop until `/exit`, end of input or an interrupt.
///
/// Invalid switches and provider failures are reported and the loop goes on;
/// only I/O errors on the terminal end it with an `Err`.
pub async fn run(
    state: &mut ChatState,
    ctx: &ChatContext<'_>,
    reader: &mut dyn LineReader,
    renderer: &mut dyn ResponseRenderer,
    out: &mut dyn Write,
) -> Result<()> {
    let session = StreamingSession::new(ctx.completion_model, ctx.refresh_per_second);

    loop {
        out.flush()?;
        let prompt = format_status_prompt(&state.model);
        let line = tokio::select! {
            line = reader.read_line(&prompt) => line?,
            _ = ctx.interrupt.wait() => {
                writeln!(out)?;
                None
            }
        };
        let Some(line) = line else {
            write_exiting(out)?;
            return Ok(());
        };

        let command = interpret(&line, ctx.registry);
        debug!(?command, "Dispatching input");
        match command {
            Command::NoOp => {}
            Command::Exit => return Ok(()),
            Command::ListModels => write_model_list(ctx.registry, out)?,
            Command::ShowModel => {
                writeln!(
                    out,
                    "{}",
                    format_model_line(
                        "Current model:",
                        state.model.display_name(),
                        state.model.as_str()
                    )
                )?;
            }
            Command::SwitchModel(model) => {
                writeln!(
                    out,
                    "{}",
                    format_model_line("Switched model to:", model.display_name(), model.as_str())
                )?;
                state.model = model;
            }
            Command::InvalidSwitch(key) => {
                let message = format!("Invalid model key: {key}. Use /models.");
                writeln!(out, "{}", style_chat_text(&message, ChatMessageType::Error))?;
            }
            Command::Prompt(prompt) => {
                let history = std::mem::take(&mut state.history);
                let turn = tokio::select! {
                    result = session.stream(
                        &prompt,
                        state.model.provider_model_id(),
                        history,
                        &mut *renderer,
                    ) => Some(result),
                    _ = ctx.interrupt.wait() => None,
                };
                match turn {
                    Some(history) => {
                        state.history = history?;
                        writeln!(out)?;
                    }
                    None => {
                        writeln!(out)?;
                        write_exiting(out)?;
                        return Ok(());
                    }
                }
            }
        }
    }
}
