//! Exact decimal numbers for bound and digit checks.
//!
//! Bounds like `decimal_min = "0.1"` must compare exactly against integers,
//! floats and numeric strings. Floats are compared through their shortest
//! round-trip rendering, which is what a user wrote in the first place.

use std::cmp::Ordering;
use std::fmt;

// Exponents beyond this are treated as unparseable rather than expanded.
const MAX_EXPONENT: i64 = 4096;

/// A finite decimal: sign, integral digits without leading zeros and
/// fractional digits without trailing zeros. Zero has no digits at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    negative: bool,
    integer: String,
    fraction: String,
}

impl Decimal {
    pub fn zero() -> Self {
        Self {
            negative: false,
            integer: String::new(),
            fraction: String::new(),
        }
    }

    pub fn from_i128(value: i128) -> Self {
        // Display of an integer is always a valid decimal.
        parse_decimal(&value.to_string()).unwrap_or_else(Self::zero)
    }

    /// Exact decimal of a finite float; `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if value.is_finite() {
            parse_decimal(&value.to_string())
        } else {
            None
        }
    }

    pub fn is_zero(&self) -> bool {
        self.integer.is_empty() && self.fraction.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Number of digits before the decimal point (0 for `0.5`).
    pub fn integer_digits(&self) -> usize {
        self.integer.len()
    }

    /// Number of significant digits after the decimal point.
    pub fn fraction_digits(&self) -> usize {
        self.fraction.len()
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        self.integer
            .len()
            .cmp(&other.integer.len())
            .then_with(|| self.integer.cmp(&other.integer))
            .then_with(|| self.fraction.cmp(&other.fraction))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.integer.is_empty() {
            f.write_str("0")?;
        } else {
            f.write_str(&self.integer)?;
        }
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

/// Parse `[+-]digits[.digits][(e|E)[+-]digits]`.
pub(crate) fn parse_decimal(input: &str) -> Option<Decimal> {
    let s = input.trim();
    let (negative, s) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(idx) => {
            let exp: i64 = s[idx + 1..].parse().ok()?;
            if exp.abs() > MAX_EXPONENT {
                return None;
            }
            (&s[..idx], exp)
        }
        None => (s, 0),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits: String = format!("{int_part}{frac_part}");
    // Position of the decimal point within `digits`, after the exponent.
    let point = int_part.len() as i64 + exponent;

    let (integer, fraction) = if point <= 0 {
        (String::new(), format!("{}{digits}", "0".repeat((-point) as usize)))
    } else if point as usize >= digits.len() {
        (
            format!("{digits}{}", "0".repeat(point as usize - digits.len())),
            String::new(),
        )
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let integer = integer.trim_start_matches('0').to_string();
    let fraction = fraction.trim_end_matches('0').to_string();
    let zero = integer.is_empty() && fraction.is_empty();

    Some(Decimal {
        negative: negative && !zero,
        integer,
        fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        parse_decimal(s).unwrap()
    }

    #[test]
    fn parses_and_normalises() {
        assert_eq!(d("007.500").to_string(), "7.5");
        assert_eq!(d("-0.0").to_string(), "0");
        assert_eq!(d(".25").to_string(), "0.25");
        assert_eq!(d("3.").to_string(), "3");
        assert_eq!(d("1.5e3").to_string(), "1500");
        assert_eq!(d("15E-3").to_string(), "0.015");
        assert_eq!(d(" +42 ").to_string(), "42");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "-", ".", "1.2.3", "abc", "1e", "12a", "1e99999"] {
            assert!(parse_decimal(bad).is_none(), "accepted {bad:?}");
        }
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(d("10") > d("9.99"));
        assert!(d("-10") < d("-9.99"));
        assert!(d("0.1") > d("0.09"));
        assert!(d("-0.5") < d("0"));
        assert_eq!(d("2.50").cmp(&d("2.5")), Ordering::Equal);
        assert!(d("100") > d("99"));
    }

    #[test]
    fn digit_counts() {
        let value = d("123.4500");
        assert_eq!(value.integer_digits(), 3);
        assert_eq!(value.fraction_digits(), 2);
        assert_eq!(d("0.5").integer_digits(), 0);
    }

    #[test]
    fn floats_use_shortest_rendering() {
        assert_eq!(Decimal::from_f64(0.1).unwrap(), d("0.1"));
        assert_eq!(Decimal::from_f64(-1000.0).unwrap(), d("-1000"));
        assert!(Decimal::from_f64(f64::NAN).is_none());
        assert!(Decimal::from_f64(f64::INFINITY).is_none());
    }
}
