//! Interpretation of REPL input lines.
//!
//! Interpretation has no side effects; the session loop acts on the returned
//! [`Command`].
use litechat_core::registry::{ModelKey, ModelRegistry};

pub const EXIT_COMMAND: &str = "/exit";
pub const LIST_MODELS_COMMAND: &str = "/models";
pub const MODEL_COMMAND: &str = "/model";

/// Command tokens offered by tab completion.
pub const COMMAND_NAMES: &[&str] = &[EXIT_COMMAND, MODEL_COMMAND, LIST_MODELS_COMMAND];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// End the session.
    Exit,
    /// Print the registry listing.
    ListModels,
    /// `/model` without a key: show the current model.
    ShowModel,
    /// `/model <key>` with a key that resolved.
    SwitchModel(ModelKey),
    /// `/model <key>` with a key that did not resolve.
    InvalidSwitch(String),
    /// Text to send to the model.
    Prompt(String),
    /// Blank input.
    NoOp,
}

/// Interprets one line of user input.
///
/// Tokens are matched case-insensitively after trimming, and take priority
/// over treating the line as a prompt.
pub fn interpret(line: &str, registry: &ModelRegistry) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::NoOp;
    }
    if line.eq_ignore_ascii_case(EXIT_COMMAND) {
        return Command::Exit;
    }
    if line.eq_ignore_ascii_case(LIST_MODELS_COMMAND) {
        return Command::ListModels;
    }

    let (token, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    if token.eq_ignore_ascii_case(MODEL_COMMAND) {
        let key = rest.trim();
        if key.is_empty() {
            return Command::ShowModel;
        }
        return match registry.model_key(key) {
            Ok(model_key) => Command::SwitchModel(model_key),
            Err(_) => Command::InvalidSwitch(key.to_string()),
        };
    }

    Command::Prompt(line.to_string())
}
