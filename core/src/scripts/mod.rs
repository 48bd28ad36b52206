//! The call bridge between the evaluator and addon-provided callables.
//!
//! The handler only knows the [`Callable`] trait: a callable takes its
//! arguments as doubles and returns a double or an error message. Native
//! Rust closures and functions of an embedded Rhai interpreter are the two
//! backends shipped here.

mod interpreter;

#[cfg(test)]
mod scripts_test;

pub use interpreter::{RhaiCallable, RhaiModule};

use crate::symbols::ScriptRef;
use core::fmt;
use hashbrown::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// A function with the fixed numeric calling convention of scripts.
pub trait Callable {
    fn call(&self, args: &[f64]) -> Result<f64, String>;
}

/// Adapts a Rust closure to [`Callable`].
pub struct NativeCallable<F>(F);

impl<F> NativeCallable<F>
where
    F: Fn(&[f64]) -> Result<f64, String>,
{
    pub fn new(function: F) -> Self {
        Self(function)
    }
}

impl<F> Callable for NativeCallable<F>
where
    F: Fn(&[f64]) -> Result<f64, String>,
{
    fn call(&self, args: &[f64]) -> Result<f64, String> {
        (self.0)(args)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("no callable is registered for {0}")]
    Unregistered(ScriptRef),

    #[error("{0}")]
    Failed(String),

    #[error("returned {0}, which is not a finite number")]
    NotFinite(f64),

    #[error("expects {expected} argument(s), got {found}")]
    Arity { expected: usize, found: usize },
}

/// Registry of callables keyed by the script reference that names them.
#[derive(Default)]
pub struct ScriptHandler {
    callables: HashMap<ScriptRef, Rc<dyn Callable>>,
}

impl ScriptHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callable` under `script`, returning the callable it
    /// replaced.
    pub fn register(
        &mut self,
        script: ScriptRef,
        callable: Rc<dyn Callable>,
    ) -> Option<Rc<dyn Callable>> {
        self.callables.insert(script, callable)
    }

    pub fn unregister(&mut self, script: &ScriptRef) -> bool {
        self.callables.remove(script).is_some()
    }

    pub fn contains(&self, script: &ScriptRef) -> bool {
        self.callables.contains_key(script)
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    pub fn scripts(&self) -> impl Iterator<Item = &ScriptRef> {
        self.callables.keys()
    }

    /// Calls the callable registered for `script` with `args` in order.
    pub fn run(&self, script: &ScriptRef, args: &[f64]) -> Result<f64, ScriptError> {
        let callable = self
            .callables
            .get(script)
            .ok_or_else(|| ScriptError::Unregistered(script.clone()))?;
        if args.len() != script.arity {
            return Err(ScriptError::Arity {
                expected: script.arity,
                found: args.len(),
            });
        }
        let result = callable.call(args).map_err(ScriptError::Failed)?;
        if !result.is_finite() {
            return Err(ScriptError::NotFinite(result));
        }
        Ok(result)
    }
}

impl fmt::Debug for ScriptHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scripts: Vec<String> = self.scripts().map(ToString::to_string).collect();
        scripts.sort();
        f.debug_struct("ScriptHandler")
            .field("scripts", &scripts)
            .finish()
    }
}
