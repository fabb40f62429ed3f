//! Check-digit formats: payment card numbers and national identifiers.

use crate::error::{ConfigError, EvaluationFault};
use crate::params::{ParamSpec, ParamType, Params};
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;
use std::sync::Arc;

fn digits_of(s: &str) -> Option<Vec<u32>> {
    s.chars().map(|c| c.to_digit(10)).collect()
}

/// Luhn (mod 10) checksum over all digits, check digit last.
pub fn luhn(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Payment card number passing the Luhn check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditCardRule {
    pub ignore_non_digit_characters: bool,
}

impl ConstraintValidator for CreditCardRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        let s = match value {
            Value::Null => return Ok(true),
            Value::Str(s) => s.as_ref(),
            other => return Err(ctx.unsupported(other)),
        };
        let digits = if self.ignore_non_digit_characters {
            Some(s.chars().filter_map(|c| c.to_digit(10)).collect::<Vec<_>>())
        } else {
            digits_of(s)
        };
        Ok(match digits {
            Some(digits) if !digits.is_empty() => luhn(&digits),
            _ => false,
        })
    }
}

fn credit_card_factory(_: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    Ok(Arc::new(CreditCardRule {
        ignore_non_digit_characters: params
            .get_bool("ignore_non_digit_characters")
            .unwrap_or(false),
    }))
}

/// Brazilian individual taxpayer number, `###.###.###-##` or 11 bare digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpfRule;

impl CpfRule {
    fn normalise(s: &str) -> Option<Vec<u32>> {
        let bare: String = if s.len() == 14 {
            let bytes = s.as_bytes();
            if bytes[3] != b'.' || bytes[7] != b'.' || bytes[11] != b'-' {
                return None;
            }
            s.chars().filter(|c| !matches!(c, '.' | '-')).collect()
        } else {
            s.to_string()
        };
        digits_of(&bare).filter(|d| d.len() == 11)
    }

    fn check_digit(digits: &[u32]) -> u32 {
        let weight_start = digits.len() as u32 + 1;
        let sum: u32 = digits
            .iter()
            .enumerate()
            .map(|(i, &d)| d * (weight_start - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 {
            0
        } else {
            rest
        }
    }

    fn verify(digits: &[u32]) -> bool {
        // Repeated-digit numbers satisfy the checksum but are never issued.
        if digits.iter().all(|&d| d == digits[0]) {
            return false;
        }
        Self::check_digit(&digits[..9]) == digits[9] && Self::check_digit(&digits[..10]) == digits[10]
    }
}

impl ConstraintValidator for CpfRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(true),
            Value::Str(s) => Ok(Self::normalise(s).map_or(false, |d| Self::verify(&d))),
            other => Err(ctx.unsupported(other)),
        }
    }
}

/// Polish national identification number: 11 digits, weighted mod 10.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeselRule;

const PESEL_WEIGHTS: [u32; 10] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3];

impl PeselRule {
    fn verify(digits: &[u32]) -> bool {
        let sum: u32 = digits[..10]
            .iter()
            .zip(PESEL_WEIGHTS)
            .map(|(&d, w)| d * w)
            .sum();
        (10 - sum % 10) % 10 == digits[10]
    }
}

impl ConstraintValidator for PeselRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(true),
            Value::Str(s) => Ok(digits_of(s)
                .filter(|d| d.len() == 11)
                .map_or(false, |d| Self::verify(&d))),
            other => Err(ctx.unsupported(other)),
        }
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![
        ConstraintKind::new("credit_card_number", credit_card_factory)
            .param(ParamSpec::with_default(
                "ignore_non_digit_characters",
                ParamType::Boolean,
                false,
            ))
            .message("invalid credit card number"),
        ConstraintKind::shared("cpf", CpfRule).message("invalid Brazilian individual taxpayer registry number (CPF)"),
        ConstraintKind::shared("pesel", PeselRule).message("invalid Polish National Identification Number (PESEL)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyPath;
    use crate::validator::SystemClock;

    fn check(rule: &dyn ConstraintValidator, input: &str) -> bool {
        let params = Params::new();
        let path = PropertyPath::root();
        let ctx = ConstraintContext {
            kind: "checksum",
            params: &params,
            path: &path,
            clock: &SystemClock,
        };
        rule.is_valid(&Value::Str(input.into()), &ctx).unwrap()
    }

    #[test]
    fn credit_card_luhn() {
        let strict = CreditCardRule {
            ignore_non_digit_characters: false,
        };
        assert!(check(&strict, "4111111111111111"));
        assert!(!check(&strict, "4111111111111112"));
        assert!(!check(&strict, "4111-1111-1111-1111"));
        assert!(!check(&strict, ""));

        let lenient = CreditCardRule {
            ignore_non_digit_characters: true,
        };
        assert!(check(&lenient, "4111-1111-1111-1111"));
        assert!(check(&lenient, "4111 1111 1111 1111"));
    }

    #[test]
    fn cpf_check_digits() {
        assert!(check(&CpfRule, "11144477735"));
        assert!(check(&CpfRule, "111.444.777-35"));
        assert!(!check(&CpfRule, "11144477736"));
        assert!(!check(&CpfRule, "111-444.777.35"));
        assert!(!check(&CpfRule, "00000000000"));
        assert!(!check(&CpfRule, "1114447773"));
    }

    #[test]
    fn pesel_checksum() {
        assert!(check(&PeselRule, "44051401359"));
        assert!(!check(&PeselRule, "44051401358"));
        assert!(!check(&PeselRule, "4405140135"));
        assert!(!check(&PeselRule, "4405140135a"));
    }
}
