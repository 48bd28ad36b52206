//! User-defined functions and references to addon-provided scripts.

use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a symbol definition is rejected before it reaches the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("symbol names must not be empty")]
    EmptyName,

    #[error("'{0}' is not a valid name (use letters, digits and '_', not starting with a digit)")]
    InvalidName(String),

    #[error("argument '{0}' is declared more than once")]
    DuplicateArgument(String),
}

/// Returns `true` when `name` can be written as an identifier in an
/// expression.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Checks that `name` is non-empty and a valid identifier.
pub fn validate_name(name: &str) -> Result<(), DefinitionError> {
    if name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    if !is_valid_name(name) {
        return Err(DefinitionError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A pure expression over named arguments, e.g. `f(a, b) = a * a + b`.
///
/// The body is stored as text and parsed on every call, so a function may
/// refer to symbols that are defined later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    expression: String,
    arguments: Vec<String>,
}

impl Function {
    pub fn new<S: Into<String>>(
        expression: impl Into<String>,
        arguments: impl IntoIterator<Item = S>,
    ) -> Result<Self, DefinitionError> {
        let arguments: Vec<String> = arguments.into_iter().map(Into::into).collect();
        for (i, argument) in arguments.iter().enumerate() {
            validate_name(argument)?;
            if arguments[..i].contains(argument) {
                return Err(DefinitionError::DuplicateArgument(argument.clone()));
            }
        }
        Ok(Self {
            expression: expression.into(),
            arguments,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) = {}", self.arguments.join(", "), self.expression)
    }
}

/// Reference to a callable registered by an addon with the script handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptRef {
    pub addon: String,
    pub callable: String,
    pub arity: usize,
}

impl ScriptRef {
    pub fn new(addon: impl Into<String>, callable: impl Into<String>, arity: usize) -> Self {
        Self {
            addon: addon.into(),
            callable: callable.into(),
            arity,
        }
    }

    /// `addon::callable`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.addon, self.callable)
    }
}

impl fmt::Display for ScriptRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}/{}", self.addon, self.callable, self.arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_rejects_duplicate_arguments() {
        assert_eq!(
            Function::new("a + a", ["a", "a"]),
            Err(DefinitionError::DuplicateArgument("a".to_string()))
        );
    }

    #[test]
    fn test_function_rejects_invalid_argument_names() {
        assert_eq!(
            Function::new("1", ["1x"]),
            Err(DefinitionError::InvalidName("1x".to_string()))
        );
        assert_eq!(Function::new("1", [""]), Err(DefinitionError::EmptyName));
    }

    #[test]
    fn test_function_without_arguments() {
        let f = Function::new("42", Vec::<String>::new()).unwrap();
        assert_eq!(f.arity(), 0);
        assert_eq!(f.to_string(), "() = 42");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("x"));
        assert!(is_valid_name("_tmp2"));
        assert!(!is_valid_name("2x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name(""));
    }

    #[test]
    fn test_script_ref_names() {
        let script = ScriptRef::new("stats", "mean", 2);
        assert_eq!(script.qualified_name(), "stats::mean");
        assert_eq!(script.to_string(), "stats::mean/2");
    }
}
