//! Indentation-aware lexer for `.hk` source.
//!
//! Indentation is measured in hard tabs only: each leading tab one level
//! deeper than the last emits `Indent`, each level shallower emits one
//! `Dedent` per level given up. Mixing spaces into leading whitespace, or
//! landing on a depth that doesn't match an entry already on the stack, is
//! an error.

use hk_core::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::tokens::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character '{0}' at line {1}, column {2}")]
    UnexpectedChar(char, usize, usize),
    #[error("unterminated string starting at line {0}, column {1}")]
    UnterminatedString(usize, usize),
    #[error("inconsistent indentation at line {0}: expected a dedent to an enclosing level")]
    InconsistentIndent(usize),
    #[error("leading whitespace on line {0} mixes spaces with tabs")]
    MixedIndent(usize),
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedChar(_, line, _) => *line,
            LexError::UnterminatedString(line, _) => *line,
            LexError::InconsistentIndent(line) => *line,
            LexError::MixedIndent(line) => *line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    indent_stack: Vec<usize>,
    pending: Vec<Token>,
    at_line_start: bool,
    paren_depth: i32,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            pending: Vec::new(),
            at_line_start: true,
            paren_depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn span_here(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.col)
    }

    fn span_from(&self, start: usize, start_line: usize, start_col: usize) -> Span {
        Span::new(start, self.pos, start_line, start_col)
    }

    /// Measures and emits Indent/Dedent tokens for one line's leading
    /// whitespace. Returns `true` if the line is blank or a comment-only
    /// line (in which case it produces no indentation tokens at all).
    fn handle_indentation(&mut self) -> Result<bool, LexError> {
        let line_no = self.line;
        let mut depth = 0usize;
        let mut saw_space = false;
        loop {
            match self.peek() {
                Some('\t') => {
                    depth += 1;
                    self.advance();
                }
                Some(' ') => {
                    saw_space = true;
                    self.advance();
                }
                _ => break,
            }
        }
        if saw_space {
            return Err(LexError::MixedIndent(line_no));
        }
        match self.peek() {
            None | Some('\n') | Some('#') => return Ok(true),
            _ => {}
        }
        let current = *self.indent_stack.last().unwrap();
        if depth > current {
            self.indent_stack.push(depth);
            self.pending.push(Token::new(TokenKind::Indent, self.span_here()));
        } else if depth < current {
            while *self.indent_stack.last().unwrap() > depth {
                self.indent_stack.pop();
                self.pending.push(Token::new(TokenKind::Dedent, self.span_here()));
            }
            if *self.indent_stack.last().unwrap() != depth {
                return Err(LexError::InconsistentIndent(line_no));
            }
        }
        Ok(false)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while self.pos <= self.source.len() {
            if !self.pending.is_empty() {
                tokens.append(&mut self.pending);
                continue;
            }

            if self.at_line_start && self.paren_depth == 0 {
                self.at_line_start = false;
                let blank = self.handle_indentation()?;
                if !blank {
                    continue;
                }
            }

            let Some(c) = self.peek() else { break };

            if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if c == '\n' {
                self.advance();
                if self.paren_depth == 0 {
                    tokens.push(Token::new(TokenKind::Newline, self.span_here()));
                    self.at_line_start = true;
                }
                continue;
            }

            if c == ' ' || c == '\t' || c == '\r' {
                self.advance();
                continue;
            }

            if c == '"' {
                tokens.push(self.read_string()?);
                continue;
            }

            if c.is_ascii_digit() {
                tokens.push(self.read_number());
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                tokens.push(self.read_ident());
                continue;
            }

            tokens.push(self.read_operator()?);
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, self.span_here()));
        }
        tokens.push(Token::new(TokenKind::Eof, self.span_here()));
        Ok(tokens)
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let (start_line, start_col) = (self.line, self.col);
        self.advance(); // opening quote
        let mut s = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(LexError::UnterminatedString(start_line, start_col)),
                Some('"') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::new(
            TokenKind::StringLit(s),
            self.span_from(start, start_line, start_col),
        ))
    }

    fn read_number(&mut self) -> Token {
        let start = self.pos;
        let (start_line, start_col) = (self.line, self.col);
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !is_float && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.source[start..self.pos].iter().collect();
        let span = self.span_from(start, start_line, start_col);

        if self.peek() == Some('i') && !self.peek_at(1).is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
            let value: f64 = text.parse().unwrap_or(0.0);
            return Token::new(TokenKind::ImaginaryLit(value), self.span_from(start, start_line, start_col));
        }

        if is_float {
            Token::new(TokenKind::FloatLit(text.parse().unwrap_or(0.0)), span)
        } else {
            Token::new(TokenKind::IntLit(text.parse().unwrap_or(0)), span)
        }
    }

    fn read_ident(&mut self) -> Token {
        let start = self.pos;
        let (start_line, start_col) = (self.line, self.col);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.source[start..self.pos].iter().collect();
        let span = self.span_from(start, start_line, start_col);
        let kind = match text.as_str() {
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "continue" => TokenKind::Continue,
            "pass" => TokenKind::Pass,
            "del" => TokenKind::Del,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "fn" => TokenKind::Fn,
            "return" => TokenKind::Return,
            "infix" => TokenKind::Infix,
            "True" => TokenKind::BoolLit(true),
            "False" => TokenKind::BoolLit(false),
            "None" => TokenKind::NoneLit,
            _ => TokenKind::Ident(text),
        };
        Token::new(kind, span)
    }

    fn read_operator(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let (start_line, start_col) = (self.line, self.col);
        let c = self.advance().unwrap();
        let kind = match c {
            '(' => {
                self.paren_depth += 1;
                TokenKind::LParen
            }
            ')' => {
                self.paren_depth -= 1;
                TokenKind::RParen
            }
            '[' => {
                self.paren_depth += 1;
                TokenKind::LBracket
            }
            ']' => {
                self.paren_depth -= 1;
                TokenKind::RBracket
            }
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '\'' => TokenKind::Apostrophe,
            '%' => TokenKind::Percent,
            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    TokenKind::PlusPlus
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    TokenKind::MinusMinus
                } else if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '^' => TokenKind::Caret,
            '.' => {
                if self.peek() == Some('*') {
                    self.advance();
                    TokenKind::DotStar
                } else if self.peek() == Some('^') {
                    self.advance();
                    TokenKind::DotCaret
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Eq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError::UnexpectedChar('!', start_line, start_col));
                }
            }
            '<' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            other => return Err(LexError::UnexpectedChar(other, start_line, start_col)),
        };
        Ok(Token::new(kind, self.span_from(start, start_line, start_col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_assignment() {
        let ks = kinds("x = 3\n");
        assert_eq!(
            ks,
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::IntLit(3),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_indent_and_dedent() {
        let src = "if x:\n\ty = 1\nz = 2\n";
        let ks = kinds(src);
        assert!(ks.contains(&TokenKind::Indent));
        assert!(ks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn rejects_mixed_indentation() {
        let src = "if x:\n \ty = 1\n";
        let err = Lexer::new(src).tokenize().unwrap_err();
        assert!(matches!(err, LexError::MixedIndent(_)));
    }

    #[test]
    fn reads_imaginary_literal() {
        let ks = kinds("4i\n");
        assert_eq!(ks[0], TokenKind::ImaginaryLit(4.0));
    }

    #[test]
    fn comment_only_line_produces_no_indent_tokens() {
        let ks = kinds("# comment\nx = 1\n");
        assert_eq!(
            ks,
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Assign,
                TokenKind::IntLit(1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = Lexer::new("\"abc\n").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString(_, _)));
    }
}
