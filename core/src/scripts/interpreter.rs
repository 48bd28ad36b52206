//! Scripts backed by an embedded Rhai interpreter.

use crate::scripts::Callable;
use rhai::{AST, CallFnOptions, Dynamic, Engine, Scope};
use std::rc::Rc;

/// A compiled Rhai script together with the engine that runs it.
pub struct RhaiModule {
    engine: Engine,
    ast: AST,
}

impl RhaiModule {
    /// Compiles `source`. A non-zero `max_operations` bounds the work done by
    /// each call so that a runaway script fails instead of hanging.
    pub fn compile(source: &str, max_operations: u64) -> Result<Rc<Self>, String> {
        let mut engine = Engine::new();
        if max_operations > 0 {
            engine.set_max_operations(max_operations);
        }
        let ast = engine.compile(source).map_err(|e| e.to_string())?;
        Ok(Rc::new(Self { engine, ast }))
    }

    /// Parameter count of the script function `name`.
    pub fn arity_of(&self, name: &str) -> Option<usize> {
        self.ast
            .iter_functions()
            .find(|function| function.name == name)
            .map(|function| function.params.len())
    }

    pub fn has_function(&self, name: &str, arity: usize) -> bool {
        self.ast
            .iter_functions()
            .any(|function| function.name == name && function.params.len() == arity)
    }

    /// Runs the zero-argument function `name` if the script defines it.
    pub fn run_entry_point(&self, name: &str) -> Result<(), String> {
        if !self.has_function(name, 0) {
            return Ok(());
        }
        self.call_dynamic(name, Vec::new()).map(|_| ())
    }

    fn call_dynamic(&self, name: &str, args: Vec<Dynamic>) -> Result<Dynamic, String> {
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut Scope::new(), &self.ast, name, args)
            .map_err(|e| e.to_string())
    }
}

/// One function of a [`RhaiModule`].
pub struct RhaiCallable {
    module: Rc<RhaiModule>,
    function: String,
}

impl RhaiCallable {
    pub fn new(module: Rc<RhaiModule>, function: impl Into<String>) -> Self {
        Self {
            module,
            function: function.into(),
        }
    }
}

impl Callable for RhaiCallable {
    fn call(&self, args: &[f64]) -> Result<f64, String> {
        let args = args.iter().map(|&arg| Dynamic::from_float(arg)).collect();
        let result = self.module.call_dynamic(&self.function, args)?;
        if let Ok(value) = result.as_float() {
            return Ok(value);
        }
        match result.as_int() {
            Ok(value) => Ok(value as f64),
            Err(_) => Err(format!(
                "'{}' returned {} instead of a number",
                self.function,
                result.type_name()
            )),
        }
    }
}
