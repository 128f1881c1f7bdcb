//! Errors raised while walking a parsed program.

use std::fmt;

use hk_core::Span;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("'{0}' is not defined")]
    UndefinedName(String),
    #[error("{0} takes at most {1} argument(s), got {2}")]
    ArityTooMany(String, usize, usize),
    #[error("{0} takes at least {1} argument(s), got {2}")]
    ArityTooFew(String, usize, usize),
    #[error("{0}")]
    PostCondition(String),
    #[error("{0}")]
    MatrixDimension(String),
    #[error("matrix exponent must be an integer: {0}")]
    MatrixExponent(String),
    #[error("{0}")]
    IndexArity(String),
    #[error("'{0}' is not callable")]
    NotCallable(String),
    #[error("{0}")]
    TypeMismatch(String),
    #[error("{0}")]
    Message(String),
    /// Internal sentinel: signals that a binary operator's first-order
    /// dispatch `calc(lhs, op, rhs)` doesn't apply, so the caller should
    /// retry the commutative form `calc(rhs, op, lhs)` before giving up.
    #[error("operator not applicable in this operand order")]
    NotApplicable,
}

#[derive(Debug, Clone)]
pub struct Raised {
    pub error: RuntimeError,
    pub span: Span,
}

impl Raised {
    pub fn new(error: RuntimeError, span: Span) -> Self {
        Self { error, span }
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.error, self.span.line)
    }
}

impl std::error::Error for Raised {}

/// Non-local control flow threaded up through the walker via `Result::Err`:
/// an ordinary runtime error, or a `return` unwinding to its call frame.
#[derive(Debug, Clone)]
pub enum Signal {
    Error(Raised),
    Return(crate::value::Value),
    Continue,
}

impl From<Raised> for Signal {
    fn from(r: Raised) -> Self {
        Signal::Error(r)
    }
}
