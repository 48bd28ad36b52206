//! Settings consumed by the calculator.

use crate::evaluator::{DEFAULT_MAX_DEPTH, EvaluationOptions};
use crate::number::{DEFAULT_PRECISION_BITS, PrecisionContext, RoundingMode};
use crate::serialization::SerializationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Precision, display and resource settings.
///
/// Every field has a default, so a settings document only needs to name
/// what it changes.
///
/// # Example
///
/// ```
/// use qcalc_core::api::Settings;
///
/// let settings = Settings::from_json(r#"{ "display_precision": 5 }"#).unwrap();
/// assert_eq!(settings.display_precision, 5);
/// assert_eq!(settings.precision_bits, 128);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Bits of precision for every computed value.
    ///
    /// Default: 128
    pub precision_bits: usize,

    /// Rounding of computed values.
    pub rounding: RoundingMode,

    /// Fractional digits shown for results.
    ///
    /// Default: 20
    pub display_precision: usize,

    pub display_rounding: RoundingMode,

    /// Maximum evaluation depth.
    ///
    /// Default: 256
    pub max_depth: usize,

    /// Operation budget for each script call, 0 for unlimited.
    pub script_max_operations: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precision_bits: DEFAULT_PRECISION_BITS,
            rounding: RoundingMode::Nearest,
            display_precision: 20,
            display_rounding: RoundingMode::Nearest,
            max_depth: DEFAULT_MAX_DEPTH,
            script_max_operations: 0,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SerializationError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads settings from `path`. A missing file gives the defaults
    /// silently, an unreadable or malformed one gives them with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read settings: {}", e);
                return Self::default();
            }
        };
        Self::from_json(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring settings: {}", e);
            Self::default()
        })
    }

    pub fn precision(&self) -> PrecisionContext {
        PrecisionContext::new(self.precision_bits, self.rounding)
    }

    pub fn evaluation_options(&self) -> EvaluationOptions {
        EvaluationOptions {
            precision: self.precision(),
            max_depth: self.max_depth,
        }
    }
}
