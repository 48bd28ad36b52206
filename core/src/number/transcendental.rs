//! Constants and elementary functions evaluated by series at a widened
//! working precision, then rounded once into the caller's context.

use super::{BinaryFloat, DomainError, Number, PrecisionContext, rounded, with_mode};
use dashu::{
    base::Abs,
    float::{Context, round::mode::HalfEven},
    integer::IBig,
};

/// Bits added to the requested precision while summing series.
const GUARD_BITS: usize = 32;

/// Trigonometric arguments whose binary magnitude exceeds this many bits are
/// rejected instead of reducing them modulo 2π.
const MAX_REDUCTION_BITS: isize = 4096;

/// Round-to-nearest arithmetic at a fixed working precision.
#[derive(Clone, Copy)]
pub(crate) struct Work {
    context: Context<HalfEven>,
    bits: usize,
}

impl Work {
    pub(crate) fn new(bits: usize) -> Self {
        Self {
            context: Context::new(bits),
            bits,
        }
    }

    pub(crate) fn for_context(ctx: PrecisionContext) -> Self {
        Self::new(ctx.bits() + GUARD_BITS)
    }

    pub(crate) fn int(&self, value: i64) -> BinaryFloat {
        self.context.convert_int::<2>(IBig::from(value)).value()
    }

    pub(crate) fn add(&self, a: &BinaryFloat, b: &BinaryFloat) -> BinaryFloat {
        self.context.add(a.repr(), b.repr()).value()
    }

    pub(crate) fn sub(&self, a: &BinaryFloat, b: &BinaryFloat) -> BinaryFloat {
        self.context.sub(a.repr(), b.repr()).value()
    }

    pub(crate) fn mul(&self, a: &BinaryFloat, b: &BinaryFloat) -> BinaryFloat {
        self.context.mul(a.repr(), b.repr()).value()
    }

    /// Callers guarantee a non-zero divisor.
    pub(crate) fn div(&self, a: &BinaryFloat, b: &BinaryFloat) -> BinaryFloat {
        self.context.div(a.repr(), b.repr()).value()
    }

    fn div_int(&self, a: &BinaryFloat, n: i64) -> BinaryFloat {
        self.div(a, &self.int(n))
    }

    fn sqrt(&self, a: &BinaryFloat) -> BinaryFloat {
        self.context.sqrt(a.repr()).value()
    }

    fn exp_m1(&self, a: &BinaryFloat) -> BinaryFloat {
        self.context.exp_m1(a.repr()).value()
    }

    /// Callers guarantee a positive argument.
    pub(crate) fn ln(&self, a: &BinaryFloat) -> BinaryFloat {
        self.context.ln(a.repr()).value()
    }

    /// Threshold below which a series term no longer affects the sum.
    fn epsilon(&self) -> BinaryFloat {
        BinaryFloat::from_parts(IBig::ONE, -(self.bits as isize))
    }

    fn negligible(&self, term: &BinaryFloat) -> bool {
        term.clone().abs() < self.epsilon()
    }

    /// Rounds a working value into `ctx`.
    pub(crate) fn finish(&self, value: BinaryFloat, ctx: PrecisionContext) -> Number {
        with_mode!(ctx.rounding(), R => rounded(
            value.with_rounding::<R>().with_precision(ctx.bits())
        ))
    }

    /// `atan(1 / n)` for an integer `n > 1`.
    fn atan_inv(&self, n: i64) -> BinaryFloat {
        let n_squared = n * n;
        let mut power = self.div_int(&self.int(1), n);
        let mut sum = power.clone();
        let mut k = 1;
        loop {
            power = self.div_int(&power, n_squared);
            let term = self.div_int(&power, 2 * k + 1);
            if self.negligible(&term) {
                return sum;
            }
            sum = if k % 2 == 1 {
                self.sub(&sum, &term)
            } else {
                self.add(&sum, &term)
            };
            k += 1;
        }
    }

    /// π by Machin's formula.
    pub(crate) fn pi(&self) -> BinaryFloat {
        let a = self.mul(&self.int(16), &self.atan_inv(5));
        let b = self.mul(&self.int(4), &self.atan_inv(239));
        self.sub(&a, &b)
    }

    /// Reduces `x` into `[-π, π]`, widening the precision of `self` by the
    /// magnitude of `x` so the reduction stays exact enough.
    fn reduce(&self, x: &BinaryFloat) -> Option<(Work, BinaryFloat)> {
        let magnitude = x.repr().digits() as isize + x.repr().exponent();
        if magnitude > MAX_REDUCTION_BITS {
            return None;
        }
        let work = Work::new(self.bits + magnitude.max(0) as usize);
        let two_pi = work.mul(&work.int(2), &work.pi());
        let turns = work.div(x, &two_pi).round();
        let reduced = work.sub(x, &work.mul(&turns, &two_pi));
        Some((work, reduced))
    }

    /// Taylor series of sine for `|x| <= π`.
    fn sin_series(&self, x: &BinaryFloat) -> BinaryFloat {
        let x_squared = self.mul(x, x);
        let mut term = x.clone();
        let mut sum = x.clone();
        let mut n = 1;
        loop {
            term = self.mul(&term, &x_squared);
            term = self.div_int(&term, (2 * n) * (2 * n + 1));
            if self.negligible(&term) {
                return sum;
            }
            sum = if n % 2 == 1 {
                self.sub(&sum, &term)
            } else {
                self.add(&sum, &term)
            };
            n += 1;
        }
    }

    /// Taylor series of cosine for `|x| <= π`.
    fn cos_series(&self, x: &BinaryFloat) -> BinaryFloat {
        let x_squared = self.mul(x, x);
        let mut term = self.int(1);
        let mut sum = term.clone();
        let mut n = 1;
        loop {
            term = self.mul(&term, &x_squared);
            term = self.div_int(&term, (2 * n - 1) * (2 * n));
            if self.negligible(&term) {
                return sum;
            }
            sum = if n % 2 == 1 {
                self.sub(&sum, &term)
            } else {
                self.add(&sum, &term)
            };
            n += 1;
        }
    }

    /// Arctangent of any finite `x`.
    fn atan(&self, x: &BinaryFloat) -> BinaryFloat {
        if x.repr().is_zero() {
            return BinaryFloat::ZERO;
        }
        let one = self.int(1);
        let negative = *x < BinaryFloat::ZERO;
        let mut a = x.clone().abs();
        let inverted = a > one;
        if inverted {
            a = self.div(&one, &a);
        }

        // atan(a) = 2 atan(a / (1 + sqrt(1 + a^2))), applied three times.
        const HALVINGS: i64 = 3;
        for _ in 0..HALVINGS {
            let root = self.sqrt(&self.add(&one, &self.mul(&a, &a)));
            a = self.div(&a, &self.add(&one, &root));
        }

        let a_squared = self.mul(&a, &a);
        let mut power = a.clone();
        let mut sum = a;
        let mut k = 1;
        loop {
            power = self.mul(&power, &a_squared);
            let term = self.div_int(&power, 2 * k + 1);
            if self.negligible(&term) {
                break;
            }
            sum = if k % 2 == 1 {
                self.sub(&sum, &term)
            } else {
                self.add(&sum, &term)
            };
            k += 1;
        }

        let mut result = self.mul(&sum, &self.int(1 << HALVINGS));
        if inverted {
            let half_pi = self.div_int(&self.pi(), 2);
            result = self.sub(&half_pi, &result);
        }
        if negative { -result } else { result }
    }
}

impl Number {
    /// π rounded into `ctx`.
    pub fn pi(ctx: PrecisionContext) -> Number {
        let work = Work::for_context(ctx);
        work.finish(work.pi(), ctx)
    }

    /// Euler's number rounded into `ctx`.
    pub fn e(ctx: PrecisionContext) -> Number {
        let work = Work::for_context(ctx);
        let one = work.int(1);
        work.finish(work.add(&work.exp_m1(&one), &one), ctx)
    }

    pub fn sin(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        let work = Work::for_context(ctx);
        let (work, reduced) = work
            .reduce(self.float())
            .ok_or_else(|| DomainError::undefined("sin", self))?;
        Ok(work.finish(work.sin_series(&reduced), ctx))
    }

    pub fn cos(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        let work = Work::for_context(ctx);
        let (work, reduced) = work
            .reduce(self.float())
            .ok_or_else(|| DomainError::undefined("cos", self))?;
        Ok(work.finish(work.cos_series(&reduced), ctx))
    }

    pub fn tan(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        let work = Work::for_context(ctx);
        let (work, reduced) = work
            .reduce(self.float())
            .ok_or_else(|| DomainError::undefined("tan", self))?;
        // A cosine within a few units in the last place of the argument
        // means the argument is a pole rounded to `ctx`.
        let cos = work.cos_series(&reduced);
        let ulps = self.magnitude().max(1) + 2 - ctx.bits() as isize;
        if cos.clone().abs() < BinaryFloat::from_parts(IBig::ONE, ulps) {
            return Err(DomainError::undefined("tan", self));
        }
        let sin = work.sin_series(&reduced);
        Ok(work.finish(work.div(&sin, &cos), ctx))
    }

    pub fn atan(&self, ctx: PrecisionContext) -> Number {
        let work = Work::for_context(ctx);
        work.finish(work.atan(self.float()), ctx)
    }

    pub fn asin(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        let work = Work::for_context(ctx);
        Ok(work.finish(self.asin_work(&work, "asin")?, ctx))
    }

    pub fn acos(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        let work = Work::for_context(ctx);
        let asin = self.asin_work(&work, "acos")?;
        let half_pi = work.div_int(&work.pi(), 2);
        Ok(work.finish(work.sub(&half_pi, &asin), ctx))
    }

    fn asin_work(&self, work: &Work, function: &'static str) -> Result<BinaryFloat, DomainError> {
        let one = work.int(1);
        let x = self.float();
        let abs = x.clone().abs();
        if abs > one {
            return Err(DomainError::undefined(function, self));
        }
        if abs == one {
            let half_pi = work.div_int(&work.pi(), 2);
            return Ok(if self.is_negative() { -half_pi } else { half_pi });
        }
        let cos = work.sqrt(&work.sub(&one, &work.mul(x, x)));
        Ok(work.atan(&work.div(x, &cos)))
    }

    pub fn sinh(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.exceeds_exp_limit() {
            return Err(DomainError::Overflow { function: "sinh" });
        }
        let work = Work::for_context(ctx);
        let (up, down) = self.exp_pair(&work);
        work.finish(work.div_int(&work.sub(&up, &down), 2), ctx).checked("sinh")
    }

    pub fn cosh(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.exceeds_exp_limit() {
            return Err(DomainError::Overflow { function: "cosh" });
        }
        let work = Work::for_context(ctx);
        let (up, down) = self.exp_pair(&work);
        // expm1(x) + expm1(-x) + 2 = e^x + e^-x
        let sum = work.add(&work.add(&up, &down), &work.int(2));
        work.finish(work.div_int(&sum, 2), ctx).checked("cosh")
    }

    pub fn tanh(&self, ctx: PrecisionContext) -> Number {
        if self.exceeds_exp_limit() {
            return Number::from_i64(if self.is_negative() { -1 } else { 1 }, ctx);
        }
        let work = Work::for_context(ctx);
        let (up, down) = self.exp_pair(&work);
        let numerator = work.sub(&up, &down);
        let denominator = work.add(&work.add(&up, &down), &work.int(2));
        work.finish(work.div(&numerator, &denominator), ctx)
    }

    /// `(expm1(x), expm1(-x))` at working precision.
    fn exp_pair(&self, work: &Work) -> (BinaryFloat, BinaryFloat) {
        let x = self.float();
        (work.exp_m1(x), work.exp_m1(&-x))
    }
}
