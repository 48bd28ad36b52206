//! JSON documents for the symbol table and the enabled-addon set.
//!
//! ```json
//! {
//!   "variables": {
//!     "x": { "value": "3.5", "decimals": 1 },
//!     "half": { "value": "0.5", "bits": 64 }
//!   },
//!   "constants": { "g": { "value": "9.81", "decimals": 2 } },
//!   "functions": { "f": { "expression": "a * a + b", "arguments": ["a", "b"] } },
//!   "scripts": { "mean": { "addon": "stats", "callable": "avg", "arity": 2 } }
//! }
//! ```

use crate::number::{
    InvalidNumeral, Number, RoundingMode, from_decimal, from_decimal_stored, to_decimal,
    to_exact_decimal,
};
use crate::symbols::{
    DefinitionError, Function, NamedValue, ScriptRef, Symbol, SymbolTable, validate_name,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for '{name}': {source}")]
    Value {
        name: String,
        source: InvalidNumeral,
    },

    #[error("invalid definition of '{name}': {source}")]
    Definition {
        name: String,
        source: DefinitionError,
    },

    #[error("'{0}' is defined more than once")]
    DuplicateName(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SymbolTableDocument {
    #[serde(default)]
    variables: BTreeMap<String, ValueEntry>,
    #[serde(default)]
    constants: BTreeMap<String, ValueEntry>,
    #[serde(default)]
    functions: BTreeMap<String, FunctionEntry>,
    #[serde(default)]
    scripts: BTreeMap<String, ScriptRef>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValueEntry {
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decimals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bits: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FunctionEntry {
    expression: String,
    #[serde(default)]
    arguments: Vec<String>,
}

impl ValueEntry {
    /// Values with a known digit count are written with exactly that many
    /// fractional digits. Others are written exactly, along with the
    /// precision they are restored at.
    fn new(named: &NamedValue) -> Self {
        match named.decimals {
            Some(decimals) => Self {
                value: to_decimal(&named.value, decimals, RoundingMode::Nearest),
                decimals: Some(decimals),
                bits: None,
            },
            None => Self {
                value: to_exact_decimal(&named.value),
                decimals: None,
                bits: Some(named.value.precision()).filter(|&bits| bits > 0),
            },
        }
    }

    fn parse(&self, name: &str) -> Result<NamedValue, SerializationError> {
        let value: Number = match self.bits {
            Some(bits) if bits > 0 => from_decimal(&self.value, bits, RoundingMode::Nearest),
            _ => from_decimal_stored(&self.value, RoundingMode::Nearest),
        }
        .map_err(|source| SerializationError::Value {
            name: name.to_string(),
            source,
        })?;
        Ok(NamedValue::new(value, self.decimals))
    }
}

pub fn serialize_table(table: &SymbolTable) -> Result<String, SerializationError> {
    let mut document = SymbolTableDocument::default();
    for (name, symbol) in table.iter() {
        let name = name.to_string();
        match symbol {
            Symbol::Variable(named) => {
                document.variables.insert(name, ValueEntry::new(named));
            }
            Symbol::Constant(named) => {
                document.constants.insert(name, ValueEntry::new(named));
            }
            Symbol::Function(function) => {
                let entry = FunctionEntry {
                    expression: function.expression().to_string(),
                    arguments: function.arguments().to_vec(),
                };
                document.functions.insert(name, entry);
            }
            Symbol::Script(script) => {
                document.scripts.insert(name, script.clone());
            }
        }
    }
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn deserialize_table(text: &str) -> Result<SymbolTable, SerializationError> {
    let document: SymbolTableDocument = serde_json::from_str(text)?;
    let mut symbols: Vec<(String, Symbol)> = Vec::new();

    for (name, entry) in &document.variables {
        symbols.push((name.clone(), Symbol::Variable(entry.parse(name)?)));
    }
    for (name, entry) in &document.constants {
        symbols.push((name.clone(), Symbol::Constant(entry.parse(name)?)));
    }
    for (name, entry) in document.functions {
        let function = Function::new(entry.expression, entry.arguments).map_err(|source| {
            SerializationError::Definition {
                name: name.clone(),
                source,
            }
        })?;
        symbols.push((name, Symbol::Function(function)));
    }
    for (name, script) in document.scripts {
        symbols.push((name, Symbol::Script(script)));
    }

    let mut table = SymbolTable::new();
    for (name, symbol) in symbols {
        validate_name(&name).map_err(|source| SerializationError::Definition {
            name: name.clone(),
            source,
        })?;
        if table.contains(&name) {
            return Err(SerializationError::DuplicateName(name));
        }
        table.set(name, symbol);
    }
    Ok(table)
}

pub fn serialize_addon_set(addons: &BTreeSet<String>) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(addons)?)
}

pub fn deserialize_addon_set(text: &str) -> Result<BTreeSet<String>, SerializationError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::PrecisionContext;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn num(text: &str) -> Number {
        from_decimal_stored(text, RoundingMode::Nearest).unwrap()
    }

    fn sample() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.set_variable("x", num("3.50"), Some(2));
        table.set_constant("g", num("9.81"), Some(2));
        table.set_function("f", Function::new("a * a + b", ["a", "b"]).unwrap());
        table.set_script("mean", ScriptRef::new("stats", "avg", 2));
        table
    }

    #[test]
    fn test_round_trip() {
        let table = sample();
        let text = serialize_table(&table).unwrap();
        assert_eq!(deserialize_table(&text).unwrap(), table);
    }

    #[test]
    fn test_document_layout() {
        let text = serialize_table(&sample()).unwrap();
        assert_eq!(
            text,
            indoc! {r#"
                {
                  "variables": {
                    "x": {
                      "value": "3.50",
                      "decimals": 2
                    }
                  },
                  "constants": {
                    "g": {
                      "value": "9.81",
                      "decimals": 2
                    }
                  },
                  "functions": {
                    "f": {
                      "expression": "a * a + b",
                      "arguments": [
                        "a",
                        "b"
                      ]
                    }
                  },
                  "scripts": {
                    "mean": {
                      "addon": "stats",
                      "callable": "avg",
                      "arity": 2
                    }
                  }
                }"#}
        );
    }

    #[test]
    fn test_computed_values_are_restored_exactly() {
        let ctx = PrecisionContext::new(128, RoundingMode::Nearest);
        let third = num("1").div(&num("3"), ctx).unwrap();
        let mut table = SymbolTable::new();
        table.set_variable("third", third.clone(), None);
        table.set_constant("e", Number::e(ctx), None);

        let text = serialize_table(&table).unwrap();
        assert!(text.contains(r#""bits": 128"#));
        let restored = deserialize_table(&text).unwrap();
        assert_eq!(restored, table);

        let value = &restored.get_variable("third").unwrap().value;
        assert_eq!(value, &third);
        assert_eq!(value.precision(), 128);
        assert_eq!(restored.get_variable("third").unwrap().decimals, None);
    }

    #[test]
    fn test_entries_without_bits_use_the_stored_floor() {
        let table = deserialize_table(r#"{ "constants": { "c": { "value": "0.1" } } }"#).unwrap();
        assert_eq!(table.get_constant("c").unwrap().value, num("0.1"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let table = deserialize_table(r#"{ "variables": { "x": { "value": "2" } } }"#).unwrap();
        assert_eq!(
            table.get_variable("x"),
            Some(&NamedValue::new(from_decimal("2", 64, RoundingMode::Nearest).unwrap(), None))
        );
        assert!(deserialize_table("{}").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            deserialize_table("[1, 2]"),
            Err(SerializationError::Json(_))
        ));
        assert!(matches!(
            deserialize_table(r#"{ "variables": { "x": { "value": "abc" } } }"#),
            Err(SerializationError::Value { .. })
        ));
        assert!(matches!(
            deserialize_table(r#"{ "functions": { "f": { "expression": "a", "arguments": ["a", "a"] } } }"#),
            Err(SerializationError::Definition { .. })
        ));
        assert!(matches!(
            deserialize_table(r#"{ "variables": { "1x": { "value": "1" } } }"#),
            Err(SerializationError::Definition { .. })
        ));
        assert!(matches!(
            deserialize_table(
                r#"{ "variables": { "x": { "value": "1" } }, "constants": { "x": { "value": "2" } } }"#
            ),
            Err(SerializationError::DuplicateName(name)) if name == "x"
        ));
    }

    #[test]
    fn test_addon_set() {
        let addons: BTreeSet<String> = ["stats", "geo"].iter().map(|s| s.to_string()).collect();
        let text = serialize_addon_set(&addons).unwrap();
        assert_eq!(deserialize_addon_set(&text).unwrap(), addons);
        assert!(deserialize_addon_set("{}").is_err());
    }
}
