//! Public API for the calculator.
//!
//! [`Calculator`] ties a symbol table, a script handler and an addon
//! manager to a set of [`Settings`]. Errors from every layer surface as
//! [`Error`], which renders to a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use qcalc_core::addons::DirectorySource;
//! use qcalc_core::api::{Calculator, ErrorKind, Settings};
//!
//! let mut calc = Calculator::new(DirectorySource::new("addons"), Settings::default());
//! calc.define_function("sq", &["a"], "a * a").unwrap();
//! assert_eq!(calc.evaluate_to_string("sq(1.5)").unwrap(), "2.25");
//!
//! let err = calc.evaluate("1 / 0").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Domain);
//! ```

mod calculator;
mod error;
mod settings;


pub use calculator::Calculator;
pub use error::{Diagnostic, Error, ErrorKind, RelatedInfo, Severity};
pub use settings::Settings;
