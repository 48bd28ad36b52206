//! Tree-walking evaluator for calculator programs.
//!
//! A program is parsed, then evaluated against a read-only view of the
//! [`SymbolTable`]. Assignments are staged while evaluating and committed
//! only when every statement succeeded, so a failing program never leaves
//! partial writes behind.
//!
//! ## Example
//!
//! ```
//! use qcalc_core::evaluator::{EvaluationOptions, evaluate};
//! use qcalc_core::scripts::ScriptHandler;
//! use qcalc_core::symbols::SymbolTable;
//!
//! let mut table = SymbolTable::new();
//! let scripts = ScriptHandler::new();
//! let options = EvaluationOptions::default();
//!
//! let value = evaluate("x := 3.5; x * 2", &mut table, &scripts, &options).unwrap();
//! assert_eq!(value.to_string(), "7");
//! assert!(table.has_variable("x"));
//! ```

pub mod builtins;
mod error;
mod eval;
mod operators;


pub use error::{Arity, EvalError};

use crate::number::{Number, PrecisionContext};
use crate::parser::parse;
use crate::scripts::ScriptHandler;
use crate::symbols::SymbolTable;
use eval::Evaluator;

/// Default limit on evaluation depth, counting nested nodes and function
/// invocations.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Configuration for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Precision and rounding of every intermediate result, literals
    /// included.
    pub precision: PrecisionContext,

    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 256
    pub max_depth: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            precision: PrecisionContext::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Evaluates `text` and returns the value of its last statement.
///
/// Top-level assignments (`name := value`) are written to `table` as
/// variables once the whole program has succeeded.
#[tracing::instrument(level = "debug", skip(table, scripts, options), err)]
pub fn evaluate(
    text: &str,
    table: &mut SymbolTable,
    scripts: &ScriptHandler,
    options: &EvaluationOptions,
) -> Result<Number, EvalError> {
    let program = parse(text)?;

    let (value, assignments) = {
        let mut evaluator = Evaluator::new(table, scripts, options, text);
        let value = evaluator.eval_program(&program)?;
        (value, evaluator.into_assignments())
    };

    for (name, value) in assignments {
        tracing::debug!(%name, %value, "assigning variable");
        table.set_variable(name, value, None);
    }
    Ok(value)
}
