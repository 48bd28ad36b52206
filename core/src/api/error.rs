//! Public error types for the calculator API.
//!
//! Errors from the parser, evaluator, addon manager and serializer are
//! converted into [`Error`] at the [`Calculator`](super::Calculator)
//! boundary. Every error can be rendered as a [`Diagnostic`].

use crate::addons::AddonError;
use crate::evaluator::EvalError;
use crate::parser::{ParseError, Span};
use crate::serialization::SerializationError;
use crate::symbols::NameError;
use core::fmt;
use thiserror::Error;

/// Public error type for all calculator operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed expression text or numeral.
    #[error("{}", .0.to_diagnostic().message)]
    Parse(ParseError),

    /// Evaluation failed after parsing succeeded.
    #[error(transparent)]
    Evaluation(EvalError),

    /// A name could not be defined.
    #[error(transparent)]
    Definition(#[from] NameError),

    #[error(transparent)]
    Addon(#[from] AddonError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    UnknownSymbol,
    Arity,
    /// Symbol used as the wrong kind, e.g. a function read as a value.
    Kind,
    Domain,
    Script,
    /// Evaluation nested deeper than allowed.
    ResourceExceeded,
    Definition,
    Addon,
    Serialization,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::Evaluation(err) => match err.root_cause() {
                EvalError::Parse(_) => ErrorKind::Parse,
                EvalError::UnknownSymbol { .. } => ErrorKind::UnknownSymbol,
                EvalError::Arity { .. } => ErrorKind::Arity,
                EvalError::NotCallable { .. }
                | EvalError::NotAValue { .. }
                | EvalError::ReadOnly { .. } => ErrorKind::Kind,
                EvalError::Domain { .. } => ErrorKind::Domain,
                EvalError::Script { .. } => ErrorKind::Script,
                EvalError::StackOverflow { .. } => ErrorKind::ResourceExceeded,
                EvalError::InFunction { .. } => unreachable!("root_cause unwraps function frames"),
            },
            Error::Definition(_) => ErrorKind::Definition,
            Error::Addon(_) => ErrorKind::Addon,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Convert to a Diagnostic for display. Spans refer to the text passed
    /// to `evaluate`; errors without a source location use an empty span.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Error::Parse(err) => err.to_diagnostic(),
            Error::Evaluation(err) => eval_diagnostic(err),
            Error::Definition(err) => Diagnostic::error(err.to_string(), Span(0..0), "D001"),
            Error::Addon(err) => Diagnostic::error(err.to_string(), Span(0..0), "A001"),
            Error::Serialization(err) => Diagnostic::error(err.to_string(), Span(0..0), "S001"),
        }
    }
}

fn eval_diagnostic(err: &EvalError) -> Diagnostic {
    if let EvalError::Parse(parse) = err {
        return parse.to_diagnostic();
    }
    let (code, help) = match err.root_cause() {
        EvalError::UnknownSymbol { .. } => ("E001", None),
        EvalError::Arity { .. } => ("E002", None),
        EvalError::NotCallable { .. } => ("E003", None),
        EvalError::NotAValue { name, .. } => ("E004", Some(format!("call it as {}(...)", name))),
        EvalError::ReadOnly { .. } => ("E005", Some("only variables can be assigned".to_string())),
        EvalError::Domain { .. } => ("E006", None),
        EvalError::Script { .. } => ("E007", None),
        EvalError::StackOverflow { .. } => {
            ("E008", Some("check for functions that call themselves".to_string()))
        }
        EvalError::Parse(_) => ("E009", None),
        EvalError::InFunction { .. } => ("E999", None),
    };

    let mut diagnostic = Diagnostic::error(err.to_string(), err.span().clone(), code);
    diagnostic.help = help;
    if let EvalError::InFunction { name, source, .. } = err {
        diagnostic.message = err.root_cause().to_string();
        diagnostic.related.push(RelatedInfo {
            span: err.span().clone(),
            message: format!("while evaluating '{}': {}", name, source),
        });
    }
    diagnostic
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<EvalError> for Error {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Parse(parse) => Error::Parse(parse),
            other => Error::Evaluation(other),
        }
    }
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Optional error code (e.g., "E001").
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span, code: &str) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            related: Vec::new(),
            help: None,
            code: Some(code.to_string()),
        }
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g. "while evaluating 'f'").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}
