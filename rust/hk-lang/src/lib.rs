//! `.hk`: a tree-walking interpreter for a small, indentation-sensitive
//! scripting language built around matrix computation.
//!
//! [`run_source`] is the whole pipeline: lex, parse, seed the builtin
//! environment, and walk the program. The CLI and REPL both sit on top of
//! this and [`run_in`], which reuses an already-seeded [`Environment`] so a
//! REPL session accumulates bindings across lines.

pub mod builtins;
pub mod compiler;
pub mod complex;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod matrix;
pub mod value;

use thiserror::Error;

use compiler::lexer::{LexError, Lexer};
use compiler::parser::{ParseError, Parser};
use environment::Environment;
use error::Raised;

/// Any error the pipeline can produce, from a bad character in the source
/// text down to a failed matrix inverse at runtime.
#[derive(Debug, Error)]
pub enum HkError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Runtime(#[from] Raised),
    #[error("multiple errors: {0:?}")]
    Multiple(Vec<HkError>),
}

impl HkError {
    /// Collapses a list of errors: empty becomes `None`, a single error is
    /// unwrapped, and nested `Multiple`s are flattened rather than nested.
    pub fn from_multiple(errors: Vec<HkError>) -> Option<HkError> {
        let flattened: Vec<HkError> = errors
            .into_iter()
            .flat_map(|e| match e {
                HkError::Multiple(inner) => inner,
                other => vec![other],
            })
            .collect();
        match flattened.len() {
            0 => None,
            1 => Some(flattened.into_iter().next().unwrap()),
            _ => Some(HkError::Multiple(flattened)),
        }
    }
}

/// Lexes and parses `source` without executing it. Used by `--dump-tokens`
/// and `--dump-ast`.
pub fn parse_source(source: &str) -> Result<compiler::ast::Program, HkError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse_program()?)
}

/// Runs a complete `.hk` program from source in a freshly seeded
/// environment, returning that environment so a caller can inspect the
/// bindings a script left behind.
pub fn run_source(source: &str) -> Result<Environment, HkError> {
    let mut env = Environment::new();
    builtins::seed(&mut env);
    run_in(source, &mut env)?;
    Ok(env)
}

/// Lexes, parses, and walks `source` against an already-seeded
/// environment — the REPL's per-line entry point.
pub fn run_in(source: &str, env: &mut Environment) -> Result<(), HkError> {
    let tokens = Lexer::new(source).tokenize()?;
    let program = Parser::new(tokens).parse_program()?;
    interpreter::run(&program, env)?;
    Ok(())
}

/// Renders an [`HkError`] as a list of human-facing, Elm-style diagnostics
/// with ANSI colors, ready to print to a terminal.
pub fn format_error(error: &HkError, source: &str, filename: &str) -> String {
    diagnostics::format_hk_error(error, source, filename)
        .iter()
        .map(|d| d.render_ansi())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn runs_a_small_program_end_to_end() {
        let env = run_source("x = 2 + 3\ny = x * 4\n").unwrap();
        assert!(matches!(env.get("y"), Some(Value::Integer(20))));
    }

    #[test]
    fn lex_errors_surface_through_hk_error() {
        let err = run_source("x = $\n").unwrap_err();
        assert!(matches!(err, HkError::Lex(_)));
    }

    #[test]
    fn runtime_errors_surface_through_hk_error() {
        let err = run_source("A = [1,2;3,4]\nB = [1,2,3]\nC = A + B\n").unwrap_err();
        assert!(matches!(err, HkError::Runtime(_)));
    }

    #[test]
    fn run_in_accumulates_bindings_across_calls() {
        let mut env = Environment::new();
        builtins::seed(&mut env);
        run_in("x = 10\n", &mut env).unwrap();
        run_in("y = x + 1\n", &mut env).unwrap();
        assert!(matches!(env.get("y"), Some(Value::Integer(11))));
    }
}
