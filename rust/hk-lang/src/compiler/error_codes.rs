//! Stable error codes for every [`crate::HkError`] variant.
//!
//! Code ranges:
//!   E0001–E0099  Lex errors
//!   E0100–E0199  Parse errors
//!   E0200–E0299  Runtime errors

use crate::compiler::lexer::LexError;
use crate::compiler::parser::ParseError;
use crate::error::RuntimeError;

pub fn lex_error_code(e: &LexError) -> &'static str {
    match e {
        LexError::UnexpectedChar(..) => "E0001",
        LexError::UnterminatedString(..) => "E0002",
        LexError::InconsistentIndent(_) => "E0003",
        LexError::MixedIndent(_) => "E0004",
    }
}

pub fn parse_error_code(e: &ParseError) -> &'static str {
    match e {
        ParseError::UnexpectedToken { .. } => "E0100",
        ParseError::UnexpectedEof { .. } => "E0101",
        ParseError::InvalidAssignTarget(..) => "E0102",
    }
}

pub fn runtime_error_code(e: &RuntimeError) -> &'static str {
    match e {
        RuntimeError::UndefinedName(_) => "E0200",
        RuntimeError::ArityTooMany(..) => "E0201",
        RuntimeError::ArityTooFew(..) => "E0202",
        RuntimeError::PostCondition(_) => "E0203",
        RuntimeError::MatrixDimension(_) => "E0204",
        RuntimeError::MatrixExponent(_) => "E0205",
        RuntimeError::IndexArity(_) => "E0206",
        RuntimeError::NotCallable(_) => "E0207",
        RuntimeError::TypeMismatch(_) => "E0208",
        RuntimeError::Message(_) => "E0209",
        RuntimeError::NotApplicable => "E0210",
    }
}

/// A short, human-facing description of what an error code category means —
/// shown in `--help` output and the REPL's `:codes` listing.
pub fn error_doc(code: &str) -> &'static str {
    match code {
        "E0001" => "an unrecognized character appears in the source",
        "E0002" => "a string literal is missing its closing quote",
        "E0003" => "a dedent doesn't match any enclosing indentation level",
        "E0004" => "a line mixes tabs and spaces for leading whitespace",
        "E0100" => "a token appears where the grammar doesn't allow it",
        "E0101" => "the source ends mid-construct",
        "E0102" => "an expression to the left of `=` isn't assignable",
        "E0200" => "a name has no binding in the environment",
        "E0201" => "a call passed more arguments than the function accepts",
        "E0202" => "a call passed fewer arguments than the function needs",
        "E0203" => "an infix-position call targets a non-infix function",
        "E0204" => "a matrix operation's operand shapes don't line up",
        "E0205" => "a `^` exponent isn't a whole number",
        "E0206" => "an index expression supplied the wrong number of indices",
        "E0207" => "a value that isn't a function or matrix was called",
        "E0208" => "an operator or builtin received the wrong kind of value",
        "E0209" => "a miscellaneous runtime failure",
        "E0210" => "an operator has no rule for this operand order",
        _ => "an unclassified error",
    }
}
