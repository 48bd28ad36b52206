//! Addons laid out as sub-directories of one addon directory.

use crate::addons::{
    AddonContribution, AddonError, AddonSource, Manifest, ScriptContribution,
};
use crate::number::{RoundingMode, from_decimal_stored, get_decimals};
use crate::scripts::{RhaiCallable, RhaiModule};
use crate::symbols::{Function, NamedValue, ScriptRef, Symbol, validate_name};
use hashbrown::HashMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Name of the manifest file inside each addon directory.
pub const MANIFEST_FILE: &str = "addon.json";

/// Finds addons under `root`: every sub-directory holding an
/// [`MANIFEST_FILE`] is one addon, identified by the directory name.
pub struct DirectorySource {
    root: PathBuf,
    max_operations: u64,
    loaded: HashMap<String, Rc<RhaiModule>>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_operations: 0,
            loaded: HashMap::new(),
        }
    }

    /// Operation budget for each script call, 0 for none.
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = max_operations;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads and parses the manifest of `id`.
    pub fn manifest(&self, id: &str) -> Result<Manifest, AddonError> {
        let path = self.addon_dir(id)?.join(MANIFEST_FILE);
        let text = read(&path)?;
        Manifest::from_json(&text).map_err(|e| AddonError::Manifest {
            addon: id.to_string(),
            message: e.to_string(),
        })
    }

    fn addon_dir(&self, id: &str) -> Result<PathBuf, AddonError> {
        let dir = self.root.join(id);
        if !is_plain_name(Path::new(id)) || !dir.join(MANIFEST_FILE).is_file() {
            return Err(AddonError::NotFound(id.to_string()));
        }
        Ok(dir)
    }

    fn compile(&self, id: &str, script: &Path) -> Result<Rc<RhaiModule>, AddonError> {
        if script.is_absolute() || !script.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(AddonError::Manifest {
                addon: id.to_string(),
                message: format!(
                    "script path {} must stay inside the addon directory",
                    script.display()
                ),
            });
        }
        let path = self.root.join(id).join(script);
        let source = read(&path)?;
        RhaiModule::compile(&source, self.max_operations).map_err(|message| AddonError::Script {
            addon: id.to_string(),
            message,
        })
    }
}

impl AddonSource for DirectorySource {
    fn discover(&self) -> Result<BTreeSet<String>, AddonError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(root = %self.root.display(), "addon directory does not exist");
                return Ok(BTreeSet::new());
            }
            Err(source) => {
                return Err(AddonError::Io {
                    path: self.root.clone(),
                    source,
                });
            }
        };

        let mut found = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| AddonError::Io {
                path: self.root.clone(),
                source,
            })?;
            if !entry.path().join(MANIFEST_FILE).is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(id) => {
                    found.insert(id);
                }
                Err(name) => tracing::warn!(?name, "skipping addon with a non UTF-8 name"),
            }
        }
        Ok(found)
    }

    fn load(&mut self, id: &str) -> Result<AddonContribution, AddonError> {
        let manifest = self.manifest(id)?;
        let invalid = |message: String| AddonError::Manifest {
            addon: id.to_string(),
            message,
        };

        let mut contribution = AddonContribution::default();
        for (name, text) in &manifest.constants {
            validate_name(name).map_err(|e| invalid(e.to_string()))?;
            let value = from_decimal_stored(text, RoundingMode::Nearest)
                .map_err(|e| invalid(format!("constant '{}': {}", name, e)))?;
            let constant = NamedValue::new(value, Some(get_decimals(text)));
            contribution
                .symbols
                .push((name.clone(), Symbol::Constant(constant)));
        }
        for (name, def) in &manifest.functions {
            validate_name(name).map_err(|e| invalid(e.to_string()))?;
            let function = Function::new(def.expression.clone(), def.arguments.iter().cloned())
                .map_err(|e| invalid(format!("function '{}': {}", name, e)))?;
            contribution
                .symbols
                .push((name.clone(), Symbol::Function(function)));
        }

        let module = match &manifest.script {
            Some(script) => Some(self.compile(id, script)?),
            None => None,
        };
        for (name, def) in &manifest.scripts {
            validate_name(name).map_err(|e| invalid(e.to_string()))?;
            let module = module
                .as_ref()
                .ok_or_else(|| invalid(format!("script '{}' needs a script file", name)))?;
            let arity = match def.arity {
                Some(arity) if module.has_function(&def.function, arity) => arity,
                Some(arity) => {
                    return Err(invalid(format!(
                        "script '{}': no function {}/{} in the script file",
                        name, def.function, arity
                    )));
                }
                None => module.arity_of(&def.function).ok_or_else(|| {
                    invalid(format!(
                        "script '{}': no function '{}' in the script file",
                        name, def.function
                    ))
                })?,
            };
            contribution.scripts.push(ScriptContribution {
                name: name.clone(),
                script: ScriptRef::new(id, def.function.clone(), arity),
                callable: Rc::new(RhaiCallable::new(module.clone(), def.function.clone())),
            });
        }

        if let Some(module) = module {
            module
                .run_entry_point("load")
                .map_err(|message| AddonError::Script {
                    addon: id.to_string(),
                    message,
                })?;
            self.loaded.insert(id.to_string(), module);
        }
        Ok(contribution)
    }

    fn unload(&mut self, id: &str) -> Result<(), AddonError> {
        match self.loaded.remove(id) {
            Some(module) => module
                .run_entry_point("unload")
                .map_err(|message| AddonError::Script {
                    addon: id.to_string(),
                    message,
                }),
            None => Ok(()),
        }
    }
}

fn is_plain_name(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn read(path: &Path) -> Result<String, AddonError> {
    fs::read_to_string(path).map_err(|source| AddonError::Io {
        path: path.to_path_buf(),
        source,
    })
}
