//! Core evaluation logic.

use crate::{
    evaluator::{Arity, EvalError, EvaluationOptions, builtins, operators},
    number::{Number, from_decimal},
    parser::{Expr, ExprKind, ParseError, ParseErrorKind, Program, Span, Statement, parse},
    scripts::ScriptHandler,
    symbols::{Function, ScriptRef, Symbol, SymbolKind, SymbolTable},
};
use hashbrown::HashMap;
use smallvec::SmallVec;

type Arguments = SmallVec<[Number; 4]>;

/// Bindings of one function invocation.
struct Frame<'a> {
    /// Text of the function body, for literal errors.
    source: &'a str,
    bindings: HashMap<String, Number>,
}

/// Tree-walking evaluator over a read-only view of the symbol table.
///
/// Top-level assignments are collected in `pending` and only written to the
/// table by the caller once the whole program has succeeded.
pub(crate) struct Evaluator<'a> {
    table: &'a SymbolTable,
    scripts: &'a ScriptHandler,
    options: &'a EvaluationOptions,
    source: &'a str,
    frames: Vec<Frame<'a>>,
    pending: HashMap<String, Number>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        table: &'a SymbolTable,
        scripts: &'a ScriptHandler,
        options: &'a EvaluationOptions,
        source: &'a str,
    ) -> Self {
        Self {
            table,
            scripts,
            options,
            source,
            frames: Vec::new(),
            pending: HashMap::new(),
            depth: 0,
        }
    }

    /// Assignments made at the top level, to be committed by the caller.
    pub(crate) fn into_assignments(self) -> HashMap<String, Number> {
        self.pending
    }

    /// Evaluates every statement and returns the value of the last one.
    pub(crate) fn eval_program(&mut self, program: &Program) -> Result<Number, EvalError> {
        let mut last = Number::zero();
        for statement in &program.statements {
            last = self.eval_statement(statement)?;
        }
        Ok(last)
    }

    fn eval_statement(&mut self, statement: &Statement) -> Result<Number, EvalError> {
        match statement {
            Statement::Assign {
                name,
                name_span,
                value,
            } => {
                let value = self.eval_expr(value)?;
                self.assign(name, name_span, value.clone())?;
                Ok(value)
            }
            Statement::Expr(expr) => self.eval_expr(expr),
        }
    }

    fn assign(&mut self, name: &str, span: &Span, value: Number) -> Result<(), EvalError> {
        let local = self
            .frames
            .last()
            .is_some_and(|frame| frame.bindings.contains_key(name));
        if !local
            && let Some(kind) = self.table.kind_of(name)
            && kind != SymbolKind::Variable
        {
            return Err(EvalError::ReadOnly {
                name: name.to_string(),
                kind,
                span: span.clone(),
            });
        }
        let bindings = match self.frames.last_mut() {
            Some(frame) => &mut frame.bindings,
            None => &mut self.pending,
        };
        bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Evaluate an expression node.
    fn eval_expr(&mut self, expr: &Expr) -> Result<Number, EvalError> {
        // Check depth before recursing
        if self.depth >= self.options.max_depth {
            return Err(EvalError::StackOverflow {
                depth: self.depth,
                max_depth: self.options.max_depth,
                span: expr.span.clone(),
            });
        }

        self.depth += 1;
        let result = self.eval_expr_inner(expr);
        self.depth -= 1;

        result
    }

    /// Inner evaluation logic (no depth tracking).
    fn eval_expr_inner(&mut self, expr: &Expr) -> Result<Number, EvalError> {
        let ctx = self.options.precision;
        match &expr.kind {
            ExprKind::Number(text) => {
                from_decimal(text, ctx.bits(), ctx.rounding()).map_err(|_| {
                    EvalError::Parse(ParseError::new(
                        ParseErrorKind::InvalidNumber { text: text.clone() },
                        self.current_source().to_string(),
                        expr.span.clone(),
                    ))
                })
            }

            ExprKind::Ident(name) => self.lookup(name, &expr.span),

            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                Ok(operators::eval_unary(*op, value))
            }

            ExprKind::Binary { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                operators::eval_binary(*op, &left, &right, ctx).map_err(|source| {
                    EvalError::Domain {
                        source,
                        span: expr.span.clone(),
                    }
                })
            }

            ExprKind::Call { name, args, .. } => self.call(name, args, &expr.span),
        }
    }

    fn current_source(&self) -> &str {
        self.frames.last().map_or(self.source, |frame| frame.source)
    }

    /// Resolves a bare identifier: call frame, pending assignments, table,
    /// then built-in constants.
    fn lookup(&self, name: &str, span: &Span) -> Result<Number, EvalError> {
        if let Some(value) = self.local(name) {
            return Ok(value.clone());
        }
        match self.table.get(name) {
            Some(Symbol::Variable(named)) | Some(Symbol::Constant(named)) => {
                Ok(named.value.clone())
            }
            Some(symbol @ (Symbol::Function(_) | Symbol::Script(_))) => Err(EvalError::NotAValue {
                name: name.to_string(),
                kind: symbol.kind(),
                span: span.clone(),
            }),
            None => builtins::constant(name, self.options.precision).ok_or_else(|| {
                EvalError::UnknownSymbol {
                    name: name.to_string(),
                    span: span.clone(),
                }
            }),
        }
    }

    /// Values bound by the current call frame or staged at the top level.
    fn local(&self, name: &str) -> Option<&Number> {
        self.frames
            .last()
            .and_then(|frame| frame.bindings.get(name))
            .or_else(|| self.pending.get(name))
    }

    fn call(&mut self, name: &str, args: &[Expr], span: &Span) -> Result<Number, EvalError> {
        if self.local(name).is_some() {
            return Err(EvalError::NotCallable {
                name: name.to_string(),
                kind: SymbolKind::Variable,
                span: span.clone(),
            });
        }

        let table = self.table;
        match table.get(name) {
            Some(Symbol::Function(function)) => {
                let values = self.eval_args(args)?;
                self.call_function(name, function, values, span)
            }
            Some(Symbol::Script(script)) => {
                let values = self.eval_args(args)?;
                self.call_script(name, script, &values, span)
            }
            Some(symbol) => Err(EvalError::NotCallable {
                name: name.to_string(),
                kind: symbol.kind(),
                span: span.clone(),
            }),
            None => {
                let builtin = builtins::function(name).ok_or_else(|| EvalError::UnknownSymbol {
                    name: name.to_string(),
                    span: span.clone(),
                })?;
                let values = self.eval_args(args)?;
                let result = builtin
                    .call(&values, self.options.precision)
                    .ok_or_else(|| EvalError::Arity {
                        name: name.to_string(),
                        expected: builtin.arity(),
                        found: values.len(),
                        span: span.clone(),
                    })?;
                result.map_err(|source| EvalError::Domain {
                    source,
                    span: span.clone(),
                })
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Arguments, EvalError> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    /// Runs a function body in a fresh frame holding only its arguments.
    fn call_function(
        &mut self,
        name: &str,
        function: &'a Function,
        values: Arguments,
        span: &Span,
    ) -> Result<Number, EvalError> {
        if values.len() != function.arity() {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected: Arity::Exactly(function.arity()),
                found: values.len(),
                span: span.clone(),
            });
        }

        let wrap = |source: EvalError| match source {
            overflow @ EvalError::StackOverflow { .. } => overflow,
            source => EvalError::InFunction {
                name: name.to_string(),
                source: Box::new(source),
                span: span.clone(),
            },
        };

        let body = parse(function.expression()).map_err(|e| wrap(e.into()))?;
        let bindings = function
            .arguments()
            .iter()
            .cloned()
            .zip(values)
            .collect();
        self.frames.push(Frame {
            source: function.expression(),
            bindings,
        });

        // Each invocation counts against the depth limit on top of the
        // nodes it evaluates.
        self.depth += 1;
        let result = self.eval_program(&body);
        self.depth -= 1;
        self.frames.pop();

        result.map_err(wrap)
    }

    fn call_script(
        &self,
        name: &str,
        script: &ScriptRef,
        values: &[Number],
        span: &Span,
    ) -> Result<Number, EvalError> {
        if values.len() != script.arity {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected: Arity::Exactly(script.arity),
                found: values.len(),
                span: span.clone(),
            });
        }

        let arguments: SmallVec<[f64; 4]> = values.iter().map(Number::to_f64).collect();
        let failed = |message: String| EvalError::Script {
            name: name.to_string(),
            message,
            span: span.clone(),
        };
        let result = self
            .scripts
            .run(script, &arguments)
            .map_err(|e| failed(e.to_string()))?;
        let value = Number::from_f64(result).map_err(|e| failed(e.to_string()))?;
        Ok(value.round_to(self.options.precision))
    }
}
