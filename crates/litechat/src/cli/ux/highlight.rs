use std::io::Cursor;

use console::Style;
use syntect::{
    LoadingError,
    highlighting::{
        FontStyle, HighlightIterator, HighlightState, Highlighter, Style as SyntectStyle, Theme,
        ThemeSet,
    },
    parsing::{ParseState, ScopeStack, SyntaxSet},
};

/// Returns the syntect theme used for response rendering.
///
/// The ANSI theme encodes terminal palette indices instead of RGB values, so
/// output follows the user's terminal colors.
pub fn get_theme() -> Result<Theme, LoadingError> {
    let ansi_theme = include_str!("../../../data/ansi.tmTheme");
    ThemeSet::load_from_reader(&mut Cursor::new(ansi_theme.as_bytes()))
}

/// A stateful markdown highlighter for streaming terminal output.
///
/// Complete lines advance the parser state; the trailing partial line is
/// highlighted on a scratch copy of that state so it can be redrawn as more
/// text arrives.
pub struct MarkdownHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    parser: ParseState,
    scope_stack: ScopeStack,
    // Current, incomplete line of text.
    line_buffer: String,
}

impl MarkdownHighlighter {
    pub fn new(theme: Theme) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let parser = Self::markdown_parser(&syntax_set);

        Self {
            syntax_set,
            theme,
            parser,
            scope_stack: ScopeStack::new(),
            line_buffer: String::new(),
        }
    }

    fn markdown_parser(syntax_set: &SyntaxSet) -> ParseState {
        let syntax = syntax_set
            .find_syntax_by_extension("md")
            .unwrap_or_else(|| syntax_set.find_syntax_plain_text());
        ParseState::new(syntax)
    }

    /// Resets the highlighter state for a new response.
    pub fn new_session(&mut self) {
        self.parser = Self::markdown_parser(&self.syntax_set);
        self.scope_stack = ScopeStack::new();
        self.line_buffer.clear();
    }

    /// The buffered partial line, as last drawn by [`Self::highlight`].
    pub fn pending(&self) -> &str {
        &self.line_buffer
    }

    /// Highlights a chunk of text.
    ///
    /// Returns every line completed by `text` followed by the current partial
    /// line. The caller must erase the previously drawn partial line before
    /// writing the output, since it is repeated at the start.
    pub fn highlight(&mut self, text: &str) -> String {
        self.line_buffer.push_str(text);
        let highlighter = Highlighter::new(&self.theme);
        let mut output = String::new();

        while let Some(i) = self.line_buffer.find('\n') {
            let line: String = self.line_buffer.drain(..=i).collect();
            let ranges = highlight_line(
                &mut self.parser,
                &mut self.scope_stack,
                &highlighter,
                &self.syntax_set,
                &line,
            );
            output.push_str(&to_ansi_terminal_escaped(&ranges));
        }

        if !self.line_buffer.is_empty() {
            let mut parser = self.parser.clone();
            let mut scope_stack = self.scope_stack.clone();
            let ranges = highlight_line(
                &mut parser,
                &mut scope_stack,
                &highlighter,
                &self.syntax_set,
                &self.line_buffer,
            );
            output.push_str(&to_ansi_terminal_escaped(&ranges));
        }

        output
    }
}

fn highlight_line<'l>(
    parser: &mut ParseState,
    scope_stack: &mut ScopeStack,
    highlighter: &Highlighter<'_>,
    syntax_set: &SyntaxSet,
    line: &'l str,
) -> Vec<(SyntectStyle, &'l str)> {
    let Ok(ops) = parser.parse_line(line, syntax_set) else {
        return vec![(SyntectStyle::default(), line)];
    };
    let mut state = HighlightState::new(highlighter, scope_stack.clone());
    let ranges = HighlightIterator::new(&mut state, &ops[..], line, highlighter).collect();
    *scope_stack = state.path;
    ranges
}

/// Converts syntect's styled ranges to an ANSI-escaped string for terminals.
fn to_ansi_terminal_escaped(v: &[(SyntectStyle, &str)]) -> String {
    let mut s = String::new();

    for &(ref hl_style, text) in v.iter() {
        let mut style = Style::new().force_styling(true);
        if hl_style.font_style.contains(FontStyle::BOLD) {
            style = style.bold();
        }
        if hl_style.font_style.contains(FontStyle::ITALIC) {
            style = style.italic();
        }
        if hl_style.font_style.contains(FontStyle::UNDERLINE) {
            style = style.underlined();
        }

        // ANSI themes keep the palette index in `r` and set alpha to zero.
        if hl_style.foreground.a == 0 {
            style = match hl_style.foreground.r {
                0x00 => style.black(),
                0x01 => style.red(),
                0x02 => style.green(),
                0x03 => style.yellow(),
                0x04 => style.blue(),
                0x05 => style.magenta(),
                0x06 => style.cyan(),
                0x07 => style.white(),
                c => style.color256(c),
            };
        }

        // Keep the newline outside the escape codes so resets land on the
        // same line.
        match text.strip_suffix('\n') {
            Some(body) => {
                s.push_str(&style.apply_to(body).to_string());
                s.push('\n');
            }
            None => s.push_str(&style.apply_to(text).to_string()),
        }
    }

    s
}
