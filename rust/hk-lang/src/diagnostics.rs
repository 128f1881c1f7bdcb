//! Rich error diagnostics with source snippets, colors, and suggestions.

use hk_core::colors::{bold, cyan, gray, red};

use crate::compiler::error_codes::{error_doc, lex_error_code, parse_error_code, runtime_error_code};
use crate::compiler::lexer::LexError;
use crate::compiler::parser::ParseError;
use crate::error::{Raised, RuntimeError};
use crate::HkError;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A rendered diagnostic with source context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
    pub col: Option<usize>,
    pub source_line: Option<String>,
    pub underline: Option<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Render with ANSI colors for terminal display (Elm-style).
    pub fn render_ansi(&self) -> String {
        let mut out = String::new();

        let severity_label = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Note => "NOTE",
        };
        let category = self
            .code
            .as_deref()
            .map(|c| format!("{severity_label} {c}"))
            .unwrap_or_else(|| severity_label.to_string());

        let location_str = if let (Some(ref file), Some(line), Some(col)) = (&self.file, self.line, self.col) {
            format!(" {file}:{line}:{col} ")
        } else if let (Some(ref file), Some(line)) = (&self.file, self.line) {
            format!(" {file}:{line} ")
        } else {
            String::from(" ")
        };

        let title_width: usize = 80;
        let dashes_width = title_width.saturating_sub(category.len() + location_str.len() + 6);

        out.push_str(&cyan(&format!("── {} {}", category, "─".repeat(dashes_width))));
        out.push_str(&cyan(&location_str));
        out.push_str(&cyan("──\n"));
        out.push('\n');

        out.push_str(&format!("{}\n", self.message));
        if let Some(code) = &self.code {
            out.push_str(&format!("{}\n", gray(error_doc(code))));
        }
        out.push('\n');

        if let (Some(line_num), Some(ref line_text), Some(ref underline)) = (self.line, &self.source_line, &self.underline) {
            let line_str = format!("{line_num}");
            out.push_str(&format!("  {} │ {}\n", gray(&line_str), line_text));
            let spaces = " ".repeat(line_str.len());
            out.push_str(&format!("  {} │ {}\n", spaces, red(underline)));
        }
        out.push('\n');

        if !self.suggestions.is_empty() {
            for suggestion in &self.suggestions {
                out.push_str(&format!("  {}: {}\n", bold("hint"), suggestion));
            }
            out.push('\n');
        }

        out
    }

    /// Render without colors (for tests and non-terminal output).
    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        let severity_label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        };
        match &self.code {
            Some(code) => out.push_str(&format!("{severity_label}[{code}]: ")),
            None => out.push_str(&format!("{severity_label}: ")),
        }
        out.push_str(&self.message);
        out.push('\n');

        if let (Some(ref file), Some(line), Some(col)) = (&self.file, self.line, self.col) {
            out.push_str(&format!("  --> {file}:{line}:{col}\n"));
        } else if let (Some(ref file), Some(line)) = (&self.file, self.line) {
            out.push_str(&format!("  --> {file}:{line}\n"));
        }

        if let (Some(line_num), Some(ref line_text), Some(ref underline)) = (self.line, &self.source_line, &self.underline) {
            out.push_str("   |\n");
            out.push_str(&format!("{line_num:>3} | {line_text}\n"));
            out.push_str(&format!("   | {underline}\n"));
        }

        if !self.suggestions.is_empty() {
            out.push_str("   |\n");
            for suggestion in &self.suggestions {
                out.push_str(&format!("   = help: {suggestion}\n"));
            }
        }

        out
    }
}

fn get_source_line(source: &str, line: usize) -> Option<String> {
    source.lines().nth(line.saturating_sub(1)).map(|s| s.to_string())
}

fn make_underline(col: usize, len: usize) -> String {
    format!("{}{}", " ".repeat(col.saturating_sub(1)), "^".repeat(len.max(1)))
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (a_len, b_len) = (a_chars.len(), b_chars.len());
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }
    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];
    #[allow(clippy::needless_range_loop)]
    for i in 0..=a_len {
        matrix[i][0] = i;
    }
    #[allow(clippy::needless_range_loop)]
    for j in 0..=b_len {
        matrix[0][j] = j;
    }
    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = (matrix[i - 1][j] + 1).min(matrix[i][j - 1] + 1).min(matrix[i - 1][j - 1] + cost);
        }
    }
    matrix[a_len][b_len]
}

fn suggest_similar(name: &str, candidates: &[&str], max_distance: usize) -> Vec<String> {
    let mut matches: Vec<(usize, String)> = candidates
        .iter()
        .filter_map(|c| {
            let d = edit_distance(name, c);
            if d <= max_distance {
                Some((d, c.to_string()))
            } else {
                None
            }
        })
        .collect();
    matches.sort_by_key(|(d, _)| *d);
    matches.into_iter().map(|(_, s)| s).take(3).collect()
}

/// Keywords a typo'd identifier might have meant to be.
const KEYWORDS: &[&str] = &[
    "if", "else", "while", "for", "in", "continue", "pass", "del", "and", "or", "not", "fn", "infix", "return", "True", "False", "None",
];

/// Builtin names a typo'd identifier might have meant to call.
const BUILTINS: &[&str] = &[
    "print", "len", "str", "slice", "eq", "zeros", "ones", "eye", "transpose", "trace", "diagonal", "det", "inv", "rank", "reshape", "max",
    "min", "norm", "dot", "cross", "real", "imag", "conj", "phase", "polar", "sqrt", "abs", "exp", "log", "sin", "cos", "tan", "asin",
    "acos", "atan", "sinh", "cosh", "tanh", "asinh", "acosh", "atanh",
];

/// Converts an [`HkError`] (plus the source it came from) into a list of
/// renderable diagnostics — a list since `Multiple` can carry several.
pub fn format_hk_error(error: &HkError, source: &str, filename: &str) -> Vec<Diagnostic> {
    match error {
        HkError::Lex(e) => vec![format_lex_error(e, source, filename)],
        HkError::Parse(e) => vec![format_parse_error(e, source, filename)],
        HkError::Runtime(e) => vec![format_runtime_error(e, source, filename)],
        HkError::Multiple(errors) => errors.iter().flat_map(|e| format_hk_error(e, source, filename)).collect(),
    }
}

fn format_lex_error(error: &LexError, source: &str, filename: &str) -> Diagnostic {
    let line = error.line();
    let (col, len) = match error {
        LexError::UnexpectedChar(_, _, col) => (*col, 1),
        LexError::UnterminatedString(_, col) => (*col, 1),
        LexError::InconsistentIndent(_) | LexError::MixedIndent(_) => (1, 1),
    };
    let suggestions = if let LexError::UnexpectedChar(ch, ..) = error {
        suggest_similar(&ch.to_string(), KEYWORDS, 1)
    } else {
        Vec::new()
    };
    Diagnostic {
        severity: Severity::Error,
        code: Some(lex_error_code(error).to_string()),
        message: error.to_string(),
        file: Some(filename.to_string()),
        line: Some(line),
        col: Some(col),
        source_line: get_source_line(source, line),
        underline: Some(make_underline(col, len)),
        suggestions,
    }
}

fn format_parse_error(error: &ParseError, source: &str, filename: &str) -> Diagnostic {
    let line = error.line();
    let col = match error {
        ParseError::UnexpectedToken { col, .. } => *col,
        _ => 1,
    };
    let suggestions = match error {
        ParseError::UnexpectedToken { found, .. } => suggest_similar(found, KEYWORDS, 2),
        _ => Vec::new(),
    };
    Diagnostic {
        severity: Severity::Error,
        code: Some(parse_error_code(error).to_string()),
        message: error.to_string(),
        file: Some(filename.to_string()),
        line: Some(line),
        col: Some(col),
        source_line: get_source_line(source, line),
        underline: Some(make_underline(col, 1)),
        suggestions,
    }
}

fn format_runtime_error(error: &Raised, source: &str, filename: &str) -> Diagnostic {
    let line = error.span.line;
    let col = error.span.col;
    let suggestions = match &error.error {
        RuntimeError::UndefinedName(name) => {
            let mut s = suggest_similar(name, BUILTINS, 2);
            s.extend(suggest_similar(name, KEYWORDS, 2));
            s
        }
        _ => Vec::new(),
    };
    Diagnostic {
        severity: Severity::Error,
        code: Some(runtime_error_code(&error.error).to_string()),
        message: error.error.to_string(),
        file: Some(filename.to_string()),
        line: Some(line),
        col: Some(col),
        source_line: get_source_line(source, line),
        underline: Some(make_underline(col.max(1), 1)),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_the_closest_keyword() {
        let hits = suggest_similar("whille", KEYWORDS, 2);
        assert!(hits.contains(&"while".to_string()));
    }

    #[test]
    fn undefined_name_renders_with_its_error_code() {
        let err = HkError::Runtime(Raised::new(RuntimeError::UndefinedName("foo".to_string()), hk_core::Span::new(0, 3, 1, 1)));
        let diags = format_hk_error(&err, "foo\n", "<test>");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some("E0200"));
    }
}
