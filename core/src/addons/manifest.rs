//! The `addon.json` self-description of an addon.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Example:
///
/// ```json
/// {
///   "name": "Statistics",
///   "description": "Averages",
///   "script": "stats.rhai",
///   "constants": { "golden": "1.6180339887498948482" },
///   "functions": { "sq": { "expression": "x * x", "arguments": ["x"] } },
///   "scripts": { "mean": { "function": "mean" } }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Rhai source file, relative to the addon directory.
    #[serde(default)]
    pub script: Option<PathBuf>,

    /// Constant name to decimal text.
    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDef>,

    /// Symbol name to the Rhai function that implements it.
    #[serde(default)]
    pub scripts: BTreeMap<String, ScriptDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDef {
    pub expression: String,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptDef {
    pub function: String,
    /// Defaults to the parameter count of `function`.
    #[serde(default)]
    pub arity: Option<usize>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_manifest() {
        assert_eq!(Manifest::from_json("{}").unwrap(), Manifest::default());
    }

    #[test]
    fn test_full_manifest() {
        let manifest = Manifest::from_json(
            r#"{
                "name": "Statistics",
                "script": "stats.rhai",
                "constants": { "golden": "1.618" },
                "functions": { "sq": { "expression": "x * x", "arguments": ["x"] } },
                "scripts": { "mean": { "function": "mean", "arity": 2 } }
            }"#,
        )
        .unwrap();
        assert_eq!(manifest.name.as_deref(), Some("Statistics"));
        assert_eq!(manifest.script, Some(PathBuf::from("stats.rhai")));
        assert_eq!(manifest.constants["golden"], "1.618");
        assert_eq!(manifest.functions["sq"].arguments, vec!["x".to_string()]);
        assert_eq!(manifest.scripts["mean"].arity, Some(2));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(Manifest::from_json(r#"{ "constant": {} }"#).is_err());
        assert!(Manifest::from_json(r#"{ "scripts": { "f": {} } }"#).is_err());
    }
}
