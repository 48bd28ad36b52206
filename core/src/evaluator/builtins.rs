//! Functions and constants available without any symbol definition.
//!
//! User symbols shadow built-ins: a variable named `e` hides Euler's number.

use crate::evaluator::Arity;
use crate::number::{DomainError, Number, PrecisionContext};

type Unary = fn(&Number, PrecisionContext) -> Result<Number, DomainError>;
type Binary = fn(&Number, &Number, PrecisionContext) -> Result<Number, DomainError>;
type Variadic = fn(&[Number], PrecisionContext) -> Result<Number, DomainError>;

#[derive(Clone, Copy)]
pub enum BuiltinFunction {
    Unary(Unary),
    Binary(Binary),
    /// Takes one or more arguments.
    Variadic(Variadic),
}

impl BuiltinFunction {
    pub fn arity(self) -> Arity {
        match self {
            BuiltinFunction::Unary(_) => Arity::Exactly(1),
            BuiltinFunction::Binary(_) => Arity::Exactly(2),
            BuiltinFunction::Variadic(_) => Arity::AtLeast(1),
        }
    }

    /// Returns `None` when `args` does not match the arity.
    pub fn call(
        self,
        args: &[Number],
        ctx: PrecisionContext,
    ) -> Option<Result<Number, DomainError>> {
        match (self, args) {
            (BuiltinFunction::Unary(f), [x]) => Some(f(x, ctx)),
            (BuiltinFunction::Binary(f), [x, y]) => Some(f(x, y, ctx)),
            (BuiltinFunction::Variadic(f), args) if !args.is_empty() => Some(f(args, ctx)),
            _ => None,
        }
    }
}

pub const FUNCTIONS: &[(&str, BuiltinFunction)] = &[
    ("abs", BuiltinFunction::Unary(|x, _| Ok(x.abs()))),
    ("sqrt", BuiltinFunction::Unary(Number::sqrt)),
    ("exp", BuiltinFunction::Unary(Number::exp)),
    ("ln", BuiltinFunction::Unary(Number::ln)),
    ("log", BuiltinFunction::Unary(Number::ln)),
    ("log10", BuiltinFunction::Unary(Number::log10)),
    ("log2", BuiltinFunction::Unary(Number::log2)),
    ("floor", BuiltinFunction::Unary(|x, ctx| Ok(x.floor().round_to(ctx)))),
    ("ceil", BuiltinFunction::Unary(|x, ctx| Ok(x.ceil().round_to(ctx)))),
    ("round", BuiltinFunction::Unary(|x, ctx| Ok(x.round().round_to(ctx)))),
    ("trunc", BuiltinFunction::Unary(|x, ctx| Ok(x.trunc().round_to(ctx)))),
    ("sin", BuiltinFunction::Unary(Number::sin)),
    ("cos", BuiltinFunction::Unary(Number::cos)),
    ("tan", BuiltinFunction::Unary(Number::tan)),
    ("asin", BuiltinFunction::Unary(Number::asin)),
    ("acos", BuiltinFunction::Unary(Number::acos)),
    ("atan", BuiltinFunction::Unary(|x, ctx| Ok(x.atan(ctx)))),
    ("sinh", BuiltinFunction::Unary(Number::sinh)),
    ("cosh", BuiltinFunction::Unary(Number::cosh)),
    ("tanh", BuiltinFunction::Unary(|x, ctx| Ok(x.tanh(ctx)))),
    ("pow", BuiltinFunction::Binary(Number::pow)),
    ("hypot", BuiltinFunction::Binary(hypot)),
    ("min", BuiltinFunction::Variadic(min)),
    ("max", BuiltinFunction::Variadic(max)),
];

pub const CONSTANTS: &[&str] = &["pi", "e"];

pub fn function(name: &str) -> Option<BuiltinFunction> {
    FUNCTIONS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, function)| *function)
}

pub fn constant(name: &str, ctx: PrecisionContext) -> Option<Number> {
    match name {
        "pi" => Some(Number::pi(ctx)),
        "e" => Some(Number::e(ctx)),
        _ => None,
    }
}

fn hypot(x: &Number, y: &Number, ctx: PrecisionContext) -> Result<Number, DomainError> {
    let wide = ctx.with_bits(ctx.bits() * 2);
    let sum = x.mul(x, wide)?.add(&y.mul(y, wide)?, wide);
    sum.sqrt(ctx)
}

fn min(args: &[Number], ctx: PrecisionContext) -> Result<Number, DomainError> {
    fold(args, ctx, Number::min)
}

fn max(args: &[Number], ctx: PrecisionContext) -> Result<Number, DomainError> {
    fold(args, ctx, Number::max)
}

fn fold(
    args: &[Number],
    ctx: PrecisionContext,
    pick: for<'a> fn(&'a Number, &'a Number) -> &'a Number,
) -> Result<Number, DomainError> {
    let mut rest = args.iter();
    let first = rest.next().ok_or(DomainError::Undefined {
        function: "min/max",
        argument: "()".to_string(),
    })?;
    Ok(rest.fold(first, pick).round_to(ctx))
}
