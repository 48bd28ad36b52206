//! Conversion between [`Number`] and decimal text.

use super::{Number, PrecisionContext, RoundingMode, rounded, with_mode};
use core::{cmp::Ordering, f64::consts::LOG2_10, f64::consts::LOG10_2};
use dashu::{
    base::{Abs, UnsignedAbs},
    float::{Context, Repr},
    integer::IBig,
};
use thiserror::Error;

/// Extra bits granted on top of the exact digit-to-bit ratio.
const GUARD_BITS: usize = 2;

/// Minimum precision of values read back from stored text, such as addon
/// manifests and symbol table documents. A short numeral like `0.21` would
/// otherwise be held at the few bits its digit count implies.
pub const STORED_VALUE_BITS: usize = 1024;

/// Decimal exponents beyond this magnitude are rejected when parsing.
const MAX_DECIMAL_EXPONENT: usize = 100_000;

/// Most fractional digits [`to_decimal`] will render.
pub const MAX_DECIMAL_DIGITS: usize = 1 << 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{text}' is not a valid decimal number")]
pub struct InvalidNumeral {
    pub text: String,
}

/// Bits needed to hold `digits` significant decimal digits.
pub fn digits_to_bits(digits: usize) -> usize {
    ((digits as f64) * LOG2_10).ceil() as usize + GUARD_BITS
}

/// Decimal digits that `bits` binary digits can faithfully represent.
pub fn bits_to_digits(bits: usize) -> usize {
    ((bits as f64) * LOG10_2).floor() as usize
}

/// Renders `value` with exactly `precision` fractional digits, at most
/// [`MAX_DECIMAL_DIGITS`].
///
/// The conversion works on the exact binary value and rounds once, in
/// direction `rounding`.
pub fn to_decimal(value: &Number, precision: usize, rounding: RoundingMode) -> String {
    let precision = precision.min(MAX_DECIMAL_DIGITS);
    let repr = value.repr();
    if repr.is_infinite() {
        return if value.is_negative() { "-inf" } else { "inf" }.to_string();
    }

    let scaled = repr.significand() * IBig::from(10u8).pow(precision);
    let exponent = repr.exponent();
    let fixed = if exponent >= 0 {
        scaled << exponent.unsigned_abs()
    } else {
        divide_rounded(&scaled, &(IBig::ONE << exponent.unsigned_abs()), rounding)
    };
    render_fixed(fixed, precision)
}

/// Integer division of `numerator` by a positive `denominator`, rounded in
/// direction `rounding`.
fn divide_rounded(numerator: &IBig, denominator: &IBig, rounding: RoundingMode) -> IBig {
    let quotient = numerator / denominator;
    let remainder = numerator - &quotient * denominator;
    if remainder.is_zero() {
        return quotient;
    }

    let negative = *numerator < IBig::ZERO;
    let away = match rounding {
        RoundingMode::TowardZero => false,
        RoundingMode::AwayFromZero => true,
        RoundingMode::Up => !negative,
        RoundingMode::Down => negative,
        RoundingMode::Nearest => match (remainder.abs() << 1usize).cmp(denominator) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => !(&quotient % IBig::from(2u8)).is_zero(),
        },
    };

    match (away, negative) {
        (false, _) => quotient,
        (true, true) => quotient - IBig::ONE,
        (true, false) => quotient + IBig::ONE,
    }
}

fn render_fixed(fixed: IBig, precision: usize) -> String {
    let negative = fixed < IBig::ZERO;
    let mut digits = fixed.unsigned_abs().to_string();
    if digits.len() <= precision {
        digits.insert_str(0, &"0".repeat(precision + 1 - digits.len()));
    }
    let (integer, fraction) = digits.split_at(digits.len() - precision);

    let mut out = String::with_capacity(digits.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(integer);
    if precision > 0 {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Every decimal digit of `value`: a binary fraction with exponent `-k` has
/// exactly `k` decimal places.
pub fn to_exact_decimal(value: &Number) -> String {
    let repr = value.repr();
    if repr.is_infinite() {
        return to_decimal(value, 0, RoundingMode::Nearest);
    }
    let exponent = repr.exponent();
    let text = if exponent >= 0 {
        render_fixed(repr.significand().clone() << exponent.unsigned_abs(), 0)
    } else {
        let places = exponent.unsigned_abs();
        render_fixed(repr.significand() * IBig::from(5u8).pow(places), places)
    };
    trim_fraction(&text).to_string()
}

/// A decimal numeral split into `mantissa * 10^exponent`.
struct Numeral {
    mantissa: IBig,
    exponent: isize,
    significant_digits: usize,
}

fn parse_numeral(text: &str) -> Option<Numeral> {
    let text = text.trim();
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (body, scale) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], parse_exponent(&body[pos + 1..])?),
        None => (body, 0),
    };
    let (integer, fraction) = body.split_once('.').unwrap_or((body, ""));
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }
    if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{integer}{fraction}");
    let magnitude: IBig = digits.parse().ok()?;
    let exponent = scale.checked_sub(isize::try_from(fraction.len()).ok()?)?;
    if exponent.unsigned_abs() > MAX_DECIMAL_EXPONENT {
        return None;
    }

    Some(Numeral {
        mantissa: if negative { -magnitude } else { magnitude },
        exponent,
        significant_digits: digits.trim_start_matches('0').len().max(1),
    })
}

fn parse_exponent(text: &str) -> Option<isize> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses decimal `text` and rounds it once to `bits` of precision.
///
/// Accepts an optional sign, digits with an optional fractional part
/// (`.5` and `5.` included) and an optional `e` exponent.
pub fn from_decimal(text: &str, bits: usize, rounding: RoundingMode) -> Result<Number, InvalidNumeral> {
    let numeral = parse_numeral(text).ok_or_else(|| InvalidNumeral {
        text: text.to_string(),
    })?;
    Ok(convert(numeral, PrecisionContext::new(bits, rounding)))
}

/// Like [`from_decimal`], with the precision derived from the number of
/// significant digits in `text`.
pub fn from_decimal_auto(text: &str, rounding: RoundingMode) -> Result<Number, InvalidNumeral> {
    let numeral = parse_numeral(text).ok_or_else(|| InvalidNumeral {
        text: text.to_string(),
    })?;
    let bits = digits_to_bits(numeral.significant_digits);
    Ok(convert(numeral, PrecisionContext::new(bits, rounding)))
}

/// Like [`from_decimal_auto`], but never below [`STORED_VALUE_BITS`].
pub fn from_decimal_stored(text: &str, rounding: RoundingMode) -> Result<Number, InvalidNumeral> {
    let numeral = parse_numeral(text).ok_or_else(|| InvalidNumeral {
        text: text.to_string(),
    })?;
    let bits = digits_to_bits(numeral.significant_digits).max(STORED_VALUE_BITS);
    Ok(convert(numeral, PrecisionContext::new(bits, rounding)))
}

fn convert(numeral: Numeral, ctx: PrecisionContext) -> Number {
    let Numeral {
        mantissa, exponent, ..
    } = numeral;
    let power = IBig::from(10u8).pow(exponent.unsigned_abs());
    with_mode!(ctx.rounding(), R => {
        let context = Context::<R>::new(ctx.bits());
        if exponent >= 0 {
            rounded(context.convert_int::<2>(mantissa * power))
        } else {
            rounded(context.div(&Repr::new(mantissa, 0), &Repr::new(power, 0)))
        }
    })
}

/// Number of fractional digits written in `text`.
///
/// Purely textual: `"3.140"` has three, `"42"` and `"1e-5"` have none.
pub fn get_decimals(text: &str) -> usize {
    let text = text.trim();
    let mantissa = match text.find(['e', 'E']) {
        Some(pos) => &text[..pos],
        None => text,
    };
    match mantissa.split_once('.') {
        Some((_, fraction)) => fraction.chars().take_while(char::is_ascii_digit).count(),
        None => 0,
    }
}

/// Drops trailing fractional zeros, and the point itself when nothing is
/// left after it.
pub fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Number {
        from_decimal_auto(text, RoundingMode::Nearest).unwrap()
    }

    #[test]
    fn test_to_decimal_pads_and_rounds() {
        assert_eq!(to_decimal(&parse("2.5"), 3, RoundingMode::Nearest), "2.500");
        assert_eq!(to_decimal(&parse("0.125"), 2, RoundingMode::Nearest), "0.12");
        assert_eq!(to_decimal(&parse("0.375"), 2, RoundingMode::Nearest), "0.38");
        assert_eq!(to_decimal(&parse("-0.125"), 2, RoundingMode::Nearest), "-0.12");
        assert_eq!(to_decimal(&parse("42"), 0, RoundingMode::Nearest), "42");
        assert_eq!(to_decimal(&Number::zero(), 2, RoundingMode::Nearest), "0.00");
    }

    #[test]
    fn test_to_decimal_directed_rounding() {
        let value = parse("-1.25");
        assert_eq!(to_decimal(&value, 1, RoundingMode::TowardZero), "-1.2");
        assert_eq!(to_decimal(&value, 1, RoundingMode::AwayFromZero), "-1.3");
        assert_eq!(to_decimal(&value, 1, RoundingMode::Up), "-1.2");
        assert_eq!(to_decimal(&value, 1, RoundingMode::Down), "-1.3");
        assert_eq!(to_decimal(&parse("1.25"), 1, RoundingMode::Up), "1.3");
    }

    #[test]
    fn test_to_decimal_never_negative_zero() {
        assert_eq!(to_decimal(&parse("-0.001"), 2, RoundingMode::Nearest), "0.00");
        assert_eq!(to_decimal(&parse("-0.001"), 2, RoundingMode::Down), "-0.01");
    }

    #[test]
    fn test_to_decimal_large_precision() {
        let ctx = PrecisionContext::new(256, RoundingMode::Nearest);
        let third = Number::from_i64(1, ctx)
            .div(&Number::from_i64(3, ctx), ctx)
            .unwrap();
        let text = to_decimal(&third, 70, RoundingMode::Nearest);
        assert_eq!(text, format!("0.{}", "3".repeat(70)));
    }

    #[test]
    fn test_to_decimal_caps_digits() {
        let text = to_decimal(&parse("0.5"), usize::MAX, RoundingMode::Nearest);
        assert_eq!(text.len(), MAX_DECIMAL_DIGITS + 2);
        assert!(text.starts_with("0.5000"));
    }

    #[test]
    fn test_exact_decimal_round_trips() {
        let ctx = PrecisionContext::new(128, RoundingMode::Nearest);
        let third = Number::from_i64(1, ctx)
            .div(&Number::from_i64(3, ctx), ctx)
            .unwrap();
        let text = to_exact_decimal(&third);
        assert!(text.len() > 100);
        assert_eq!(from_decimal(&text, 128, RoundingMode::Nearest).unwrap(), third);
        assert_eq!(to_exact_decimal(&parse("2.5")), "2.5");
        assert_eq!(to_exact_decimal(&parse("-1024")), "-1024");

        let tiny = Number::from_i64(2, ctx).pow(&Number::from_i64(-300_000, ctx), ctx).unwrap();
        let text = to_exact_decimal(&tiny);
        assert!(text.len() > MAX_DECIMAL_DIGITS);
        assert_eq!(from_decimal(&text, 8, RoundingMode::Nearest).unwrap(), tiny);
    }

    #[test]
    fn test_from_decimal_accepts_numerals() {
        for text in ["1", "-1", "+1", "1.", ".5", "1.5e3", "1.5E-3", "  7  ", "0001.000"] {
            assert!(from_decimal(text, 64, RoundingMode::Nearest).is_ok(), "{text}");
        }
        assert_eq!(parse("1.5e3"), parse("1500"));
        assert_eq!(parse("25e-2"), parse("0.25"));
    }

    #[test]
    fn test_from_decimal_rejects_garbage() {
        for text in ["", "-", ".", "abc", "1..2", "1e", "1e+", "0x10", "1,5", "--1", "1e999999999"] {
            assert_eq!(
                from_decimal(text, 64, RoundingMode::Nearest),
                Err(InvalidNumeral {
                    text: text.to_string()
                })
            );
        }
    }

    #[test]
    fn test_from_decimal_rounds_to_requested_bits() {
        let coarse = from_decimal("0.1", 8, RoundingMode::Nearest).unwrap();
        let fine = from_decimal("0.1", 128, RoundingMode::Nearest).unwrap();
        assert!(coarse.precision() <= 8);
        assert_ne!(coarse, fine);
        let down = from_decimal("0.1", 8, RoundingMode::Down).unwrap();
        let up = from_decimal("0.1", 8, RoundingMode::Up).unwrap();
        assert!(down < up);
    }

    #[test]
    fn test_stored_values_keep_a_precision_floor() {
        let short = from_decimal_stored("0.21", RoundingMode::Nearest).unwrap();
        assert!(short.precision() > from_decimal_auto("0.21", RoundingMode::Nearest).unwrap().precision());
        assert_eq!(to_decimal(&short, 60, RoundingMode::Nearest), format!("0.21{}", "0".repeat(58)));

        let long = format!("1.{}", "3".repeat(400));
        let value = from_decimal_stored(&long, RoundingMode::Nearest).unwrap();
        assert_eq!(to_decimal(&value, 400, RoundingMode::Nearest), long);
    }

    #[test]
    fn test_get_decimals() {
        assert_eq!(get_decimals("3.140"), 3);
        assert_eq!(get_decimals("42"), 0);
        assert_eq!(get_decimals("-0.5"), 1);
        assert_eq!(get_decimals("1.25e10"), 2);
        assert_eq!(get_decimals("1e-5"), 0);
        assert_eq!(get_decimals("5."), 0);
    }

    #[test]
    fn test_decimal_round_trip() {
        let ctx = PrecisionContext::new(200, RoundingMode::Nearest);
        let values = [
            Number::from_i64(2, ctx).sqrt(ctx).unwrap(),
            Number::from_i64(-22, ctx).div(&Number::from_i64(7, ctx), ctx).unwrap(),
            parse("123456.789"),
        ];
        for value in &values {
            for precision in [0, 1, 5, 20, 50] {
                for rounding in RoundingMode::ALL {
                    let text = to_decimal(value, precision, rounding);
                    let reparsed = from_decimal_auto(&text, RoundingMode::Nearest).unwrap();
                    assert_eq!(to_decimal(&reparsed, precision, RoundingMode::Nearest), text);
                }
            }
        }
    }

    #[test]
    fn test_digit_bit_conversions() {
        assert_eq!(bits_to_digits(53), 15);
        assert!(digits_to_bits(15) >= 50);
        for digits in [1, 10, 100, 1000] {
            assert!(bits_to_digits(digits_to_bits(digits)) >= digits);
        }
    }

    #[test]
    fn test_trim_fraction() {
        assert_eq!(trim_fraction("4.000"), "4");
        assert_eq!(trim_fraction("4.500"), "4.5");
        assert_eq!(trim_fraction("100"), "100");
        assert_eq!(trim_fraction("-0.250"), "-0.25");
    }
}
