//! Evaluation errors.
//!
//! Every variant except [`EvalError::InFunction`] carries the span of the
//! offending node in the text that was being evaluated. Errors raised inside
//! a function body are wrapped so that the outer span points at the call.

use crate::number::DomainError;
use crate::parser::{ParseError, Span};
use crate::symbols::SymbolKind;
use core::fmt;
use thiserror::Error;

/// Number of arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown symbol '{name}'")]
    UnknownSymbol { name: String, span: Span },

    #[error("'{name}' expects {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: Arity,
        found: usize,
        span: Span,
    },

    #[error("{kind} '{name}' cannot be called")]
    NotCallable {
        name: String,
        kind: SymbolKind,
        span: Span,
    },

    #[error("{kind} '{name}' must be called with arguments")]
    NotAValue {
        name: String,
        kind: SymbolKind,
        span: Span,
    },

    #[error("cannot assign to {kind} '{name}'")]
    ReadOnly {
        name: String,
        kind: SymbolKind,
        span: Span,
    },

    #[error("{source}")]
    Domain { source: DomainError, span: Span },

    #[error("script '{name}' failed: {message}")]
    Script {
        name: String,
        message: String,
        span: Span,
    },

    #[error("in function '{name}': {source}")]
    InFunction {
        name: String,
        source: Box<EvalError>,
        span: Span,
    },

    /// Evaluation recursion depth exceeded.
    #[error("evaluation depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow {
        depth: usize,
        max_depth: usize,
        span: Span,
    },
}

impl EvalError {
    /// Span of the error in the text passed to `evaluate`.
    pub fn span(&self) -> &Span {
        match self {
            EvalError::Parse(err) => &err.span,
            EvalError::UnknownSymbol { span, .. }
            | EvalError::Arity { span, .. }
            | EvalError::NotCallable { span, .. }
            | EvalError::NotAValue { span, .. }
            | EvalError::ReadOnly { span, .. }
            | EvalError::Domain { span, .. }
            | EvalError::Script { span, .. }
            | EvalError::InFunction { span, .. }
            | EvalError::StackOverflow { span, .. } => span,
        }
    }

    /// The innermost error, looking through function call wrappers.
    pub fn root_cause(&self) -> &EvalError {
        match self {
            EvalError::InFunction { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_resource_exceeded(&self) -> bool {
        matches!(self.root_cause(), EvalError::StackOverflow { .. })
    }
}
