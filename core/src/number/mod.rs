//! Arbitrary-precision binary floating-point numbers.
//!
//! A [`Number`] is a binary float whose precision is a property of the value,
//! not of the process. Every operation that can lose information takes an
//! explicit [`PrecisionContext`] naming the bit precision and the
//! [`RoundingMode`] of the result.
//!
//! ## Example
//!
//! ```
//! use qcalc_core::number::{Number, PrecisionContext, to_decimal, RoundingMode};
//!
//! let ctx = PrecisionContext::default();
//! let one = Number::from_i64(1, ctx);
//! let three = Number::from_i64(3, ctx);
//! let third = one.div(&three, ctx).unwrap();
//! assert_eq!(to_decimal(&third, 5, RoundingMode::Nearest), "0.33333");
//! ```

mod format;
mod transcendental;


pub use format::{
    InvalidNumeral, MAX_DECIMAL_DIGITS, STORED_VALUE_BITS, bits_to_digits, digits_to_bits,
    from_decimal, from_decimal_auto, from_decimal_stored, get_decimals, to_decimal,
    to_exact_decimal, trim_fraction,
};

use core::{f64::consts::LN_2, fmt, str::FromStr};
use dashu::{
    base::{Abs, Sign},
    float::{
        Context, FBig, Repr,
        round::{Round, Rounded, mode},
    },
    integer::IBig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Backing representation of every [`Number`].
pub(crate) type BinaryFloat = FBig<mode::HalfEven, 2>;

/// Smallest bit precision accepted by [`PrecisionContext`].
pub const MIN_PRECISION_BITS: usize = 2;

/// Largest bit precision accepted by [`PrecisionContext`].
pub const MAX_PRECISION_BITS: usize = 1 << 20;

/// Bit precision used when nothing else is configured.
pub const DEFAULT_PRECISION_BITS: usize = 128;

/// Results must satisfy `|x| < 2^MAX_MAGNITUDE_BITS`. Non-zero results
/// below `2^-MAX_MAGNITUDE_BITS` are flushed to zero.
pub const MAX_MAGNITUDE_BITS: isize = 1 << 20;

/// Largest `|x|` for which `exp(x)` stays inside the magnitude range.
const EXP_LIMIT: f64 = MAX_MAGNITUDE_BITS as f64 * LN_2;

/// Expands `$body` once per rounding mode with `$R` bound to the matching
/// `dashu` rounding type.
macro_rules! with_mode {
    ($rounding:expr, $R:ident => $body:expr) => {
        match $rounding {
            $crate::number::RoundingMode::Nearest => {
                type $R = ::dashu::float::round::mode::HalfEven;
                $body
            }
            $crate::number::RoundingMode::TowardZero => {
                type $R = ::dashu::float::round::mode::Zero;
                $body
            }
            $crate::number::RoundingMode::Up => {
                type $R = ::dashu::float::round::mode::Up;
                $body
            }
            $crate::number::RoundingMode::Down => {
                type $R = ::dashu::float::round::mode::Down;
                $body
            }
            $crate::number::RoundingMode::AwayFromZero => {
                type $R = ::dashu::float::round::mode::Away;
                $body
            }
        }
    };
}
pub(crate) use with_mode;

/// Direction in which inexact results are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    #[default]
    Nearest,
    /// Round toward zero (truncate).
    TowardZero,
    /// Round toward positive infinity.
    Up,
    /// Round toward negative infinity.
    Down,
    /// Round away from zero.
    AwayFromZero,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 5] = [
        RoundingMode::Nearest,
        RoundingMode::TowardZero,
        RoundingMode::Up,
        RoundingMode::Down,
        RoundingMode::AwayFromZero,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RoundingMode::Nearest => "nearest",
            RoundingMode::TowardZero => "toward_zero",
            RoundingMode::Up => "up",
            RoundingMode::Down => "down",
            RoundingMode::AwayFromZero => "away_from_zero",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown rounding mode '{0}' (expected one of nearest, toward_zero, up, down, away_from_zero)")]
pub struct UnknownRoundingMode(pub String);

impl FromStr for RoundingMode {
    type Err = UnknownRoundingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        RoundingMode::ALL
            .into_iter()
            .find(|mode| mode.name() == normalized)
            .ok_or_else(|| UnknownRoundingMode(s.to_string()))
    }
}

/// Bit precision and rounding direction for the results of an operation.
///
/// This is passed explicitly to every computation; there is no process-wide
/// default precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionContext {
    bits: usize,
    rounding: RoundingMode,
}

impl PrecisionContext {
    /// Creates a context, clamping `bits` into
    /// `MIN_PRECISION_BITS..=MAX_PRECISION_BITS`.
    pub fn new(bits: usize, rounding: RoundingMode) -> Self {
        Self {
            bits: bits.clamp(MIN_PRECISION_BITS, MAX_PRECISION_BITS),
            rounding,
        }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    pub fn with_bits(self, bits: usize) -> Self {
        Self::new(bits, self.rounding)
    }

    pub fn with_rounding(self, rounding: RoundingMode) -> Self {
        Self { rounding, ..self }
    }
}

impl Default for PrecisionContext {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION_BITS, RoundingMode::Nearest)
    }
}

/// Mathematical domain violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("{function} is undefined for {argument}")]
    Undefined {
        function: &'static str,
        argument: String,
    },

    #[error("{0} is not a finite number")]
    NotFinite(String),

    #[error("result of {function} is too large")]
    Overflow { function: &'static str },
}

impl DomainError {
    fn undefined(function: &'static str, argument: &Number) -> Self {
        DomainError::Undefined {
            function,
            argument: argument.to_string(),
        }
    }
}

/// An arbitrary-precision binary floating-point value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Number(BinaryFloat);

fn rounded<R: Round>(value: Rounded<FBig<R, 2>>) -> Number {
    Number(value.value().with_rounding())
}

impl Number {
    pub fn zero() -> Self {
        Number(BinaryFloat::ZERO)
    }

    pub fn one() -> Self {
        Number(BinaryFloat::ONE)
    }

    pub fn from_i64(value: i64, ctx: PrecisionContext) -> Self {
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).convert_int::<2>(IBig::from(value))
        ))
    }

    /// Converts a machine float exactly. Non-finite inputs are rejected.
    pub fn from_f64(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::NotFinite(value.to_string()));
        }
        BinaryFloat::try_from(value)
            .map(Number)
            .map_err(|_| DomainError::NotFinite(value.to_string()))
    }

    /// Nearest machine float.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().value()
    }

    /// Bit precision carried by this value.
    pub fn precision(&self) -> usize {
        self.0.precision()
    }

    pub fn is_zero(&self) -> bool {
        self.0.repr().is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.sign() == Sign::Negative
    }

    pub fn is_integer(&self) -> bool {
        self.0.repr().is_int()
    }

    pub(crate) fn repr(&self) -> &Repr<2> {
        self.0.repr()
    }

    pub(crate) fn float(&self) -> &BinaryFloat {
        &self.0
    }

    /// `m` such that `2^(m-1) <= |self| < 2^m`. Zero has magnitude 0.
    pub(crate) fn magnitude(&self) -> isize {
        if self.is_zero() {
            return 0;
        }
        self.repr().digits() as isize + self.repr().exponent()
    }

    /// Keeps `self` inside the representable magnitude range.
    pub fn checked(self, function: &'static str) -> Result<Number, DomainError> {
        let magnitude = self.magnitude();
        if magnitude > MAX_MAGNITUDE_BITS {
            Err(DomainError::Overflow { function })
        } else if magnitude < -MAX_MAGNITUDE_BITS {
            Ok(Number::zero())
        } else {
            Ok(self)
        }
    }

    /// `true` when `exp(self)` would leave the magnitude range.
    pub(crate) fn exceeds_exp_limit(&self) -> bool {
        self.magnitude() > 24 || self.to_f64().abs() > EXP_LIMIT
    }

    /// Rounds this value to the precision of `ctx`.
    pub fn round_to(&self, ctx: PrecisionContext) -> Number {
        with_mode!(ctx.rounding(), R => rounded(
            self.0.clone().with_rounding::<R>().with_precision(ctx.bits())
        ))
    }

    pub fn add(&self, rhs: &Number, ctx: PrecisionContext) -> Number {
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).add(self.repr(), rhs.repr())
        ))
    }

    pub fn sub(&self, rhs: &Number, ctx: PrecisionContext) -> Number {
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).sub(self.repr(), rhs.repr())
        ))
    }

    pub fn mul(&self, rhs: &Number, ctx: PrecisionContext) -> Result<Number, DomainError> {
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).mul(self.repr(), rhs.repr())
        ))
        .checked("multiplication")
    }

    pub fn div(&self, rhs: &Number, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if rhs.is_zero() {
            return Err(DomainError::DivisionByZero);
        }
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).div(self.repr(), rhs.repr())
        ))
        .checked("division")
    }

    /// Truncated remainder: `self - trunc(self / rhs) * rhs`, with the sign of
    /// `self`. The remainder is computed exactly and rounded once.
    pub fn rem(&self, rhs: &Number, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if rhs.is_zero() {
            return Err(DomainError::DivisionByZero);
        }
        if self.abs() < rhs.abs() {
            return Ok(self.round_to(ctx));
        }
        let (lhs, lhs_exp) = (self.repr().significand(), self.repr().exponent());
        let (rhs, rhs_exp) = (rhs.repr().significand(), rhs.repr().exponent());
        let exponent = lhs_exp.min(rhs_exp);
        let shift = (lhs_exp - exponent).max(rhs_exp - exponent);
        if shift > 2 * MAX_MAGNITUDE_BITS {
            return Err(DomainError::Overflow { function: "rem" });
        }
        let lhs = lhs << (lhs_exp - exponent) as usize;
        let rhs = rhs << (rhs_exp - exponent) as usize;
        let remainder = lhs % rhs;
        Ok(with_mode!(ctx.rounding(), R => rounded(
            FBig::<R, 2>::from_parts(remainder, exponent).with_precision(ctx.bits())
        )))
    }

    pub fn pow(&self, exponent: &Number, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.is_zero() {
            return if exponent.is_negative() {
                Err(DomainError::DivisionByZero)
            } else if exponent.is_zero() {
                Ok(Number::one())
            } else {
                Ok(Number::zero())
            };
        }
        if self.is_negative() && !exponent.is_integer() {
            return Err(DomainError::Undefined {
                function: "pow",
                argument: format!("a negative base with exponent {exponent}"),
            });
        }
        if *self == Number::one() || exponent.is_zero() {
            return Ok(Number::one());
        }

        // Binary magnitude of the result, decided before dashu builds it.
        let work = transcendental::Work::new(self.precision().max(ctx.bits()) + 64);
        let log2 = work.div(&work.ln(&self.abs().0), &work.ln(&work.int(2)));
        let size = work.mul(&log2, exponent.float());
        let limit = work.int(MAX_MAGNITUDE_BITS as i64 + 1);
        if size > limit {
            return Err(DomainError::Overflow { function: "pow" });
        }
        if size < -limit {
            return Ok(Number::zero());
        }

        let result = if exponent.is_integer() {
            let power = exponent.0.to_int().value();
            with_mode!(ctx.rounding(), R => rounded(
                Context::<R>::new(ctx.bits()).powi(self.repr(), power)
            ))
        } else {
            with_mode!(ctx.rounding(), R => rounded(
                Context::<R>::new(ctx.bits()).powf(self.repr(), exponent.repr())
            ))
        };
        result.checked("pow")
    }

    pub fn negate(&self) -> Number {
        Number(-&self.0)
    }

    pub fn abs(&self) -> Number {
        Number(self.0.clone().abs())
    }

    pub fn sqrt(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.is_negative() {
            return Err(DomainError::undefined("sqrt", self));
        }
        if self.is_zero() {
            return Ok(Number::zero());
        }
        Ok(with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).sqrt(self.repr())
        )))
    }

    pub fn exp(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.exceeds_exp_limit() {
            return if self.is_negative() {
                Ok(Number::zero())
            } else {
                Err(DomainError::Overflow { function: "exp" })
            };
        }
        with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).exp(self.repr())
        ))
        .checked("exp")
    }

    pub fn ln(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        if self.is_zero() || self.is_negative() {
            return Err(DomainError::undefined("ln", self));
        }
        Ok(with_mode!(ctx.rounding(), R => rounded(
            Context::<R>::new(ctx.bits()).ln(self.repr())
        )))
    }

    pub fn log10(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        self.log_base(10, "log10", ctx)
    }

    pub fn log2(&self, ctx: PrecisionContext) -> Result<Number, DomainError> {
        self.log_base(2, "log2", ctx)
    }

    fn log_base(
        &self,
        base: i64,
        function: &'static str,
        ctx: PrecisionContext,
    ) -> Result<Number, DomainError> {
        if self.is_zero() || self.is_negative() {
            return Err(DomainError::undefined(function, self));
        }
        let work = transcendental::Work::for_context(ctx);
        let numerator = work.ln(self.float());
        let denominator = work.ln(&work.int(base));
        Ok(work.finish(work.div(&numerator, &denominator), ctx))
    }

    /// Largest integer not greater than this value.
    pub fn floor(&self) -> Number {
        Number(self.0.floor())
    }

    /// Smallest integer not less than this value.
    pub fn ceil(&self) -> Number {
        Number(self.0.ceil())
    }

    /// Nearest integer, ties away from zero.
    pub fn round(&self) -> Number {
        Number(self.0.round())
    }

    /// Integer part, rounding toward zero.
    pub fn trunc(&self) -> Number {
        Number(self.0.trunc())
    }

    pub fn min<'a>(&'a self, other: &'a Number) -> &'a Number {
        if other < self { other } else { self }
    }

    pub fn max<'a>(&'a self, other: &'a Number) -> &'a Number {
        if other > self { other } else { self }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number::zero()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A binary fraction with exponent -k has exactly k decimal places.
        let repr = self.repr();
        let exact = usize::try_from(-repr.exponent()).unwrap_or(0);
        let digits = match self.precision() {
            0 => exact,
            precision => {
                let magnitude = self.magnitude();
                let leading = usize::try_from(-magnitude).map_or(0, bits_to_digits);
                exact.min(bits_to_digits(precision) + leading + 1)
            }
        };
        f.write_str(trim_fraction(&to_decimal(self, digits, RoundingMode::Nearest)))
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({self})")
    }
}

impl From<IBig> for Number {
    fn from(value: IBig) -> Self {
        Number(BinaryFloat::from(value))
    }
}
