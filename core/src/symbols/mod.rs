//! The calculator namespace.
//!
//! Every name maps to exactly one [`Symbol`]: a variable, a constant, a
//! user-defined function or a script reference. Setting a name replaces
//! whatever it held before, regardless of kind.

mod function;


pub use function::{DefinitionError, Function, ScriptRef, is_valid_name, validate_name};

use crate::number::Number;
use core::fmt;
use std::collections::BTreeMap;
use thiserror::Error;

/// A value together with the number of fractional digits it was entered
/// with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValue {
    pub value: Number,
    /// `None` when the value was computed rather than typed in.
    pub decimals: Option<usize>,
}

impl NamedValue {
    pub fn new(value: Number, decimals: Option<usize>) -> Self {
        Self { value, decimals }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Variable(NamedValue),
    Constant(NamedValue),
    Function(Function),
    Script(ScriptRef),
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Variable(_) => SymbolKind::Variable,
            Symbol::Constant(_) => SymbolKind::Constant,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::Script(_) => SymbolKind::Script,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Script,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Function => "function",
            SymbolKind::Script => "script",
        })
    }
}

/// Why a name cannot be used for a new symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error(transparent)]
    Invalid(#[from] DefinitionError),

    #[error("a {kind} named '{name}' already exists")]
    Taken { name: String, kind: SymbolKind },
}

/// Flat namespace of variables, constants, functions and scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `symbol` under `name`, returning whatever it replaced.
    pub fn set(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Number, decimals: Option<usize>) {
        self.set(name, Symbol::Variable(NamedValue::new(value, decimals)));
    }

    pub fn set_constant(&mut self, name: impl Into<String>, value: Number, decimals: Option<usize>) {
        self.set(name, Symbol::Constant(NamedValue::new(value, decimals)));
    }

    pub fn set_function(&mut self, name: impl Into<String>, function: Function) {
        self.set(name, Symbol::Function(function));
    }

    pub fn set_script(&mut self, name: impl Into<String>, script: ScriptRef) {
        self.set(name, Symbol::Script(script));
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.get(name).map(Symbol::kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.kind_of(name) == Some(SymbolKind::Variable)
    }

    pub fn has_constant(&self, name: &str) -> bool {
        self.kind_of(name) == Some(SymbolKind::Constant)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.kind_of(name) == Some(SymbolKind::Function)
    }

    pub fn has_script(&self, name: &str) -> bool {
        self.kind_of(name) == Some(SymbolKind::Script)
    }

    pub fn get_variable(&self, name: &str) -> Option<&NamedValue> {
        match self.get(name)? {
            Symbol::Variable(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_constant(&self, name: &str) -> Option<&NamedValue> {
        match self.get(name)? {
            Symbol::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        match self.get(name)? {
            Symbol::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn get_script(&self, name: &str) -> Option<&ScriptRef> {
        match self.get(name)? {
            Symbol::Script(script) => Some(script),
            _ => None,
        }
    }

    /// Removes `name` whatever kind it is. Absent names are ignored.
    pub fn remove(&mut self, name: &str) -> Option<Symbol> {
        self.symbols.remove(name)
    }

    /// Moves the symbol under `old` to `new`, replacing anything at `new`.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.symbols.remove(old) {
            Some(symbol) => {
                self.symbols.insert(new.into(), symbol);
                true
            }
            None => false,
        }
    }

    /// Checks that `name` is a valid identifier not yet owned by any symbol.
    pub fn check_available(&self, name: &str) -> Result<(), NameError> {
        validate_name(name)?;
        match self.kind_of(name) {
            Some(kind) => Err(NameError::Taken {
                name: name.to_string(),
                kind,
            }),
            None => Ok(()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &NamedValue)> {
        self.iter().filter_map(|(name, symbol)| match symbol {
            Symbol::Variable(value) => Some((name, value)),
            _ => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &NamedValue)> {
        self.iter().filter_map(|(name, symbol)| match symbol {
            Symbol::Constant(value) => Some((name, value)),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.iter().filter_map(|(name, symbol)| match symbol {
            Symbol::Function(function) => Some((name, function)),
            _ => None,
        })
    }

    pub fn scripts(&self) -> impl Iterator<Item = (&str, &ScriptRef)> {
        self.iter().filter_map(|(name, symbol)| match symbol {
            Symbol::Script(script) => Some((name, script)),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}
