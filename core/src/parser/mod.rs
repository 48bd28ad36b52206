mod ast;
pub mod error;
pub mod parser;
mod syntax;

// Re-export the parser and rule enum for external use
pub use parser::ExpressionParser;
pub use parser::Rule;
pub use parser::{DEFAULT_MAX_DEPTH, parse, parse_expression, parse_with_max_depth};

pub use ast::{Expr, ExprKind, Program, Statement};
pub use error::{ParseError, ParseErrorKind};
pub use syntax::{BinaryOp, Span, UnaryOp};

#[cfg(test)]
mod parse_test;

#[cfg(test)]
mod rule_valid_test;
