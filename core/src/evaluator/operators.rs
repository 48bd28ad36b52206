//! Binary and unary operator implementations.

use crate::number::{DomainError, Number, PrecisionContext};
use crate::parser::{BinaryOp, UnaryOp};

/// Evaluate a binary operation, rounding the result into `ctx`.
///
/// Division and remainder by zero are domain errors rather than infinities,
/// and so are results beyond the representable magnitude.
pub(super) fn eval_binary(
    op: BinaryOp,
    left: &Number,
    right: &Number,
    ctx: PrecisionContext,
) -> Result<Number, DomainError> {
    match op {
        BinaryOp::Add => left.add(right, ctx).checked("addition"),
        BinaryOp::Sub => left.sub(right, ctx).checked("subtraction"),
        BinaryOp::Mul => left.mul(right, ctx),
        BinaryOp::Div => left.div(right, ctx),
        BinaryOp::Rem => left.rem(right, ctx),
        BinaryOp::Pow => left.pow(right, ctx),
    }
}

pub(super) fn eval_unary(op: UnaryOp, operand: Number) -> Number {
    match op {
        UnaryOp::Neg => operand.negate(),
        UnaryOp::Plus => operand,
    }
}
