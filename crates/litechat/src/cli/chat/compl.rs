use crate::cli::chat::commands::{COMMAND_NAMES, MODEL_COMMAND};
use crate::cli::ux::{ChatMessageType, style_chat_text};
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{Helper, Highlighter, Validator};

/// Completion candidate for the REPL.
#[derive(Debug)]
pub struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            display_string: style_chat_text(text, ChatMessageType::Footer).to_string(),
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

/// Line editing helper: completes command tokens and model keys.
#[derive(Helper, Validator, Highlighter)]
pub struct Repl {
    pub command_names: Vec<String>,
    pub model_keys: Vec<String>,
}

impl Repl {
    pub fn new(model_keys: Vec<String>) -> Self {
        Self {
            command_names: COMMAND_NAMES.iter().map(|c| c.to_string()).collect(),
            model_keys,
        }
    }
}

impl Completer for Repl {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        let line_to_pos = &line[..pos];
        if !line_to_pos.starts_with('/') {
            return Ok((0, Vec::new()));
        }

        if let Some((token, _)) = line_to_pos.split_once(' ') {
            if token.eq_ignore_ascii_case(MODEL_COMMAND) {
                return Ok(model_compl(line_to_pos, &self.model_keys));
            }
            return Ok((0, Vec::new()));
        }

        let candidates = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line_to_pos))
            .map(|name| CompletionCandidate::new(name))
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for Repl {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.is_empty() || pos < line.len() || !line.starts_with('/') {
            return None;
        }
        self.command_names
            .iter()
            .find(|name| name.starts_with(line))
            .map(|name| name[line.len()..].into())
    }
}

// Completes the key after `/model `.
fn model_compl(line_to_pos: &str, model_keys: &[String]) -> (usize, Vec<CompletionCandidate>) {
    let Some(space_pos) = line_to_pos.rfind(' ') else {
        return (0, Vec::new());
    };
    let prefix_start = space_pos + 1;
    let prefix = &line_to_pos[prefix_start..];
    let candidates = model_keys
        .iter()
        .filter(|key| key.starts_with(prefix))
        .map(|key| CompletionCandidate::new(key))
        .collect();
    (prefix_start, candidates)
}
