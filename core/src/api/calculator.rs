//! A calculator session: settings, symbols, scripts and addons together.

use super::{Error, Settings};
use crate::addons::{AddonFailure, AddonManager, AddonSource};
use crate::evaluator::evaluate;
use crate::number::{Number, to_decimal, trim_fraction};
use crate::scripts::ScriptHandler;
use crate::serialization::{deserialize_table, serialize_table};
use crate::symbols::{Function, SymbolKind, SymbolTable};
use std::collections::BTreeSet;

/// Owns everything an evaluation needs.
///
/// # Example
///
/// ```
/// use qcalc_core::addons::DirectorySource;
/// use qcalc_core::api::{Calculator, Settings};
///
/// let mut calc = Calculator::new(DirectorySource::new("no-addons-here"), Settings::default());
/// assert_eq!(calc.evaluate_to_string("x := 2; x ^ 10").unwrap(), "1024");
/// assert_eq!(calc.evaluate_to_string("x + 1").unwrap(), "3");
/// ```
pub struct Calculator<S> {
    settings: Settings,
    symbols: SymbolTable,
    scripts: ScriptHandler,
    addons: AddonManager<S>,
}

impl<S: AddonSource> Calculator<S> {
    pub fn new(source: S, settings: Settings) -> Self {
        Self {
            settings,
            symbols: SymbolTable::new(),
            scripts: ScriptHandler::new(),
            addons: AddonManager::new(source),
        }
    }

    /// Evaluates `text`, committing its assignments only if it succeeds.
    pub fn evaluate(&mut self, text: &str) -> Result<Number, Error> {
        let options = self.settings.evaluation_options();
        Ok(evaluate(text, &mut self.symbols, &self.scripts, &options)?)
    }

    /// Evaluates `text` and formats the result for display.
    pub fn evaluate_to_string(&mut self, text: &str) -> Result<String, Error> {
        let value = self.evaluate(text)?;
        Ok(self.format(&value))
    }

    /// Formats `value` with the display precision, without trailing zeros.
    pub fn format(&self, value: &Number) -> String {
        let text = to_decimal(
            value,
            self.settings.display_precision,
            self.settings.display_rounding,
        );
        trim_fraction(&text).to_string()
    }

    /// Defines or replaces a user function. Names owned by anything other
    /// than a function are refused.
    pub fn define_function(
        &mut self,
        name: &str,
        arguments: &[&str],
        expression: &str,
    ) -> Result<(), Error> {
        if !self.symbols.has_function(name) {
            self.symbols.check_available(name)?;
        }
        let function = Function::new(expression, arguments.iter().copied())
            .map_err(|e| Error::Definition(e.into()))?;
        self.symbols.set_function(name, function);
        Ok(())
    }

    /// Removes a variable or function. Addon-owned constants and scripts
    /// are left to the addon manager.
    pub fn undefine(&mut self, name: &str) -> bool {
        match self.symbols.kind_of(name) {
            Some(SymbolKind::Variable | SymbolKind::Function) => self.symbols.remove(name).is_some(),
            _ => false,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn scripts(&self) -> &ScriptHandler {
        &self.scripts
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn addons(&self) -> &AddonManager<S> {
        &self.addons
    }

    pub fn available_addons(&self) -> Result<BTreeSet<String>, Error> {
        Ok(self.addons.available_addons()?)
    }

    pub fn active_addons(&self) -> BTreeSet<String> {
        self.addons.active_addons()
    }

    /// Makes the active addon set equal `requested`, returning the steps
    /// that failed.
    pub fn set_active_addons(&mut self, requested: &BTreeSet<String>) -> Vec<AddonFailure> {
        let mut failures = Vec::new();
        self.addons.set_active_addons(
            requested,
            &mut self.symbols,
            &mut self.scripts,
            |failure| failures.push(failure),
        );
        failures
    }

    /// Activates the saved addon set, skipping ids that are no longer
    /// available.
    pub fn restore_addons(&mut self, saved: &BTreeSet<String>) -> Result<Vec<AddonFailure>, Error> {
        let available = self.available_addons()?;
        let (present, missing): (BTreeSet<String>, BTreeSet<String>) =
            saved.iter().cloned().partition(|id| available.contains(id));
        for id in &missing {
            tracing::info!(addon = %id, "saved addon is no longer available");
        }
        Ok(self.set_active_addons(&present))
    }

    /// Replaces the symbol table with the one in `text`.
    ///
    /// Active addons are deactivated against the old table and activated
    /// again against the new one. An addon whose names are taken by
    /// imported symbols stays inactive and is reported as failed. A
    /// malformed document leaves the session untouched.
    pub fn import_symbol_table(&mut self, text: &str) -> Result<Vec<AddonFailure>, Error> {
        let table = deserialize_table(text)?;
        let active = self.active_addons();
        let mut failures = Vec::new();
        self.addons
            .deactivate_all(&mut self.symbols, &mut self.scripts, |f| failures.push(f));
        self.symbols = table;
        failures.extend(self.set_active_addons(&active));
        Ok(failures)
    }

    /// Writes the symbol table without addon-provided symbols.
    pub fn export_symbol_table(&self) -> Result<String, Error> {
        Ok(serialize_table(&self.addons.user_symbols(&self.symbols))?)
    }

    /// Deactivates every addon, returning the steps that failed.
    pub fn shutdown(&mut self) -> Vec<AddonFailure> {
        let mut failures = Vec::new();
        self.addons
            .deactivate_all(&mut self.symbols, &mut self.scripts, |f| failures.push(f));
        failures
    }
}
