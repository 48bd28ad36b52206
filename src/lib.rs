//! qcalc - An extensible arbitrary-precision calculator
//!
//! # Overview
//!
//! qcalc evaluates arithmetic expressions over binary floating-point
//! numbers whose precision and rounding are chosen at run time. On top of
//! the built-in functions, a session holds:
//!
//! - Variables assigned with `name := value`
//! - User functions defined over named arguments
//! - Constants, functions and scripts contributed by addons
//!
//! # Quick Start
//!
//! ```
//! use qcalc::{Calculator, DirectorySource, Settings};
//!
//! let mut calc = Calculator::new(DirectorySource::new("addons"), Settings::default());
//! calc.evaluate("r := 2").unwrap();
//! calc.define_function("area", &["r"], "pi * r ^ 2").unwrap();
//! assert_eq!(calc.evaluate_to_string("round(area(r))").unwrap(), "13");
//! ```
//!
//! # Errors
//!
//! Every failure is an [`Error`]. Errors raised while evaluating text can
//! be rendered against that text with [`render_error`] and friends.

mod error_renderer;

// Re-export public API from qcalc_core
pub use qcalc_core::api::{
    Calculator, Diagnostic, Error, ErrorKind, RelatedInfo, Settings, Severity,
};

// Re-export commonly used types
pub use qcalc_core::addons::{AddonFailure, AddonSource, DirectorySource};
pub use qcalc_core::number::{self, Number, PrecisionContext, RoundingMode};
pub use qcalc_core::symbols::{self, Symbol, SymbolKind, SymbolTable};

pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
