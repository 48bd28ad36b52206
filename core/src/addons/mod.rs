//! Addon discovery and lifecycle.
//!
//! An [`AddonSource`] knows how to find addons and load what they
//! contribute. The [`AddonManager`] installs those contributions into the
//! symbol table and script handler, remembers exactly what it installed, and
//! removes it again on deactivation.

mod directory;
mod manifest;


pub use directory::{DirectorySource, MANIFEST_FILE};
pub use manifest::{FunctionDef, Manifest, ScriptDef};

use crate::scripts::{Callable, ScriptHandler};
use crate::symbols::{ScriptRef, Symbol, SymbolKind, SymbolTable};
use core::fmt;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddonError {
    #[error("addon '{0}' not found")]
    NotFound(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid manifest for addon '{addon}': {message}")]
    Manifest { addon: String, message: String },

    #[error("script error in addon '{addon}': {message}")]
    Script { addon: String, message: String },

    #[error("{kind} '{name}' already exists")]
    Conflict { name: String, kind: SymbolKind },

    #[error("'{0}' is contributed more than once")]
    DuplicateName(String),
}

/// A script callable contributed by an addon.
pub struct ScriptContribution {
    /// Symbol name the script is called by in expressions.
    pub name: String,
    pub script: ScriptRef,
    pub callable: Rc<dyn Callable>,
}

/// Everything one addon installs when it is activated.
#[derive(Default)]
pub struct AddonContribution {
    /// Constants and functions, by symbol name.
    pub symbols: Vec<(String, Symbol)>,
    pub scripts: Vec<ScriptContribution>,
}

/// Where addons come from.
pub trait AddonSource {
    /// Identifiers of every addon that could be loaded.
    fn discover(&self) -> Result<BTreeSet<String>, AddonError>;

    fn load(&mut self, id: &str) -> Result<AddonContribution, AddonError>;

    fn unload(&mut self, id: &str) -> Result<(), AddonError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonOperation {
    Activate,
    Deactivate,
}

impl fmt::Display for AddonOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddonOperation::Activate => "activate",
            AddonOperation::Deactivate => "deactivate",
        })
    }
}

/// One step of a reconciliation between the active and requested sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonStep {
    pub operation: AddonOperation,
    pub addon: String,
}

/// A failed step, reported without aborting the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to {operation} addon '{addon}': {message}")]
pub struct AddonFailure {
    pub addon: String,
    pub operation: AddonOperation,
    pub message: String,
}

/// What an active addon put into the table and handler.
#[derive(Default)]
struct Installed {
    symbols: Vec<(String, Symbol)>,
    /// Entries the addon contributes that were already in the table, owned
    /// by the user or by another addon.
    adopted: Vec<(String, Symbol)>,
    scripts: Vec<ScriptRef>,
}

impl Installed {
    /// Takes over `name` from an addon that is going away, if this addon
    /// adopted the same entry.
    fn inherit(&mut self, name: &str, symbol: &Symbol) -> bool {
        match self
            .adopted
            .iter()
            .position(|(adopted, entry)| adopted == name && entry == symbol)
        {
            Some(index) => {
                let entry = self.adopted.swap_remove(index);
                self.symbols.push(entry);
                true
            }
            None => false,
        }
    }
}

pub struct AddonManager<S> {
    source: S,
    active: BTreeMap<String, Installed>,
}

impl<S: AddonSource> AddonManager<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn available_addons(&self) -> Result<BTreeSet<String>, AddonError> {
        self.source.discover()
    }

    pub fn active_addons(&self) -> BTreeSet<String> {
        self.active.keys().cloned().collect()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.contains_key(id)
    }

    /// A copy of `table` without the entries active addons installed and
    /// that are still unchanged.
    pub fn user_symbols(&self, table: &SymbolTable) -> SymbolTable {
        let mut user = table.clone();
        for installed in self.active.values() {
            for (name, symbol) in &installed.symbols {
                if user.get(name) == Some(symbol) {
                    user.remove(name);
                }
            }
        }
        user
    }

    /// Every deactivation, then every activation, needed to make the active
    /// set equal `requested`.
    pub fn plan(&self, requested: &BTreeSet<String>) -> Vec<AddonStep> {
        let deactivations = self
            .active
            .keys()
            .filter(|id| !requested.contains(*id))
            .map(|id| AddonStep {
                operation: AddonOperation::Deactivate,
                addon: id.clone(),
            });
        let activations = requested
            .iter()
            .filter(|id| !self.active.contains_key(*id))
            .map(|id| AddonStep {
                operation: AddonOperation::Activate,
                addon: id.clone(),
            });
        deactivations.chain(activations).collect()
    }

    /// Reconciles the active set with `requested`. Each failing step is
    /// passed to `on_failure` and the remaining steps still run.
    pub fn set_active_addons(
        &mut self,
        requested: &BTreeSet<String>,
        table: &mut SymbolTable,
        scripts: &mut ScriptHandler,
        mut on_failure: impl FnMut(AddonFailure),
    ) {
        for step in self.plan(requested) {
            let result = match step.operation {
                AddonOperation::Activate => self.activate(&step.addon, table, scripts),
                AddonOperation::Deactivate => self.deactivate(&step.addon, table, scripts),
            };
            if let Err(err) = result {
                tracing::warn!(addon = %step.addon, operation = %step.operation, "{}", err);
                on_failure(AddonFailure {
                    addon: step.addon,
                    operation: step.operation,
                    message: err.to_string(),
                });
            }
        }
    }

    pub fn deactivate_all(
        &mut self,
        table: &mut SymbolTable,
        scripts: &mut ScriptHandler,
        on_failure: impl FnMut(AddonFailure),
    ) {
        self.set_active_addons(&BTreeSet::new(), table, scripts, on_failure);
    }

    /// Loads `id` and installs its contribution, or nothing at all if any
    /// of its names is already owned by a different symbol.
    fn activate(
        &mut self,
        id: &str,
        table: &mut SymbolTable,
        scripts: &mut ScriptHandler,
    ) -> Result<(), AddonError> {
        let contribution = self.source.load(id)?;
        if let Err(err) = check_contribution(&contribution, table) {
            if let Err(unload) = self.source.unload(id) {
                tracing::warn!(addon = %id, "unload after failed activation: {}", unload);
            }
            return Err(err);
        }

        let mut installed = Installed::default();
        let scripted = contribution.scripts.into_iter().map(|contributed| {
            scripts.register(contributed.script.clone(), contributed.callable);
            installed.scripts.push(contributed.script.clone());
            (contributed.name, Symbol::Script(contributed.script))
        });
        let entries: Vec<(String, Symbol)> = contribution.symbols.into_iter().chain(scripted).collect();
        for (name, symbol) in entries {
            if table.get(&name) == Some(&symbol) {
                installed.adopted.push((name, symbol));
            } else {
                table.set(name.clone(), symbol.clone());
                installed.symbols.push((name, symbol));
            }
        }

        tracing::debug!(
            addon = %id,
            symbols = installed.symbols.len(),
            adopted = installed.adopted.len(),
            scripts = installed.scripts.len(),
            "activated addon"
        );
        self.active.insert(id.to_string(), installed);
        Ok(())
    }

    /// Removes what `id` installed. Entries that were changed since are left
    /// alone, and an entry another active addon also contributes passes to
    /// that addon. Adopted entries stay with their owner. The source is told
    /// to unload even when nothing was installed.
    fn deactivate(
        &mut self,
        id: &str,
        table: &mut SymbolTable,
        scripts: &mut ScriptHandler,
    ) -> Result<(), AddonError> {
        let installed = self.active.remove(id).unwrap_or_default();
        for (name, symbol) in &installed.symbols {
            if table.get(name) != Some(symbol) {
                continue;
            }
            let inherited = self
                .active
                .values_mut()
                .any(|other| other.inherit(name, symbol));
            if !inherited {
                table.remove(name);
            }
        }
        for script in &installed.scripts {
            scripts.unregister(script);
        }
        tracing::debug!(addon = %id, "deactivated addon");
        self.source.unload(id)
    }
}

impl<S> fmt::Debug for AddonManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddonManager")
            .field("active", &self.active.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Rejects contributions that repeat a name or take one owned by a
/// different symbol. Identical entries already in the table are allowed and
/// get adopted on activation.
fn check_contribution(
    contribution: &AddonContribution,
    table: &SymbolTable,
) -> Result<(), AddonError> {
    let entries = contribution
        .symbols
        .iter()
        .map(|(name, symbol)| (name.clone(), symbol.clone()))
        .chain(
            contribution
                .scripts
                .iter()
                .map(|s| (s.name.clone(), Symbol::Script(s.script.clone()))),
        );

    let mut seen = BTreeSet::new();
    for (name, symbol) in entries {
        if !seen.insert(name.clone()) {
            return Err(AddonError::DuplicateName(name));
        }
        match table.get(&name) {
            Some(existing) if *existing != symbol => {
                return Err(AddonError::Conflict {
                    kind: existing.kind(),
                    name,
                });
            }
            _ => {}
        }
    }
    Ok(())
}
