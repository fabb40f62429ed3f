//! Numeric bounds, sign checks and digit counts.

use super::decimal::{parse_decimal, Decimal};
use crate::error::{ConfigError, EvaluationFault};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// A value as seen by numeric constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Finite(Decimal),
    PositiveInfinity,
    NegativeInfinity,
    /// NaN, or a string that is not a number. Fails every numeric check.
    Invalid,
}

impl Numeric {
    /// Read a numeric value; `Ok(None)` for an absent value.
    pub fn read(
        value: &Value<'_>,
        ctx: &ConstraintContext<'_>,
    ) -> Result<Option<Numeric>, EvaluationFault> {
        let numeric = match value {
            Value::Null => return Ok(None),
            Value::Int(i) => Numeric::Finite(Decimal::from_i128(*i)),
            Value::Float(f) if f.is_nan() => Numeric::Invalid,
            Value::Float(f) if *f == f64::INFINITY => Numeric::PositiveInfinity,
            Value::Float(f) if *f == f64::NEG_INFINITY => Numeric::NegativeInfinity,
            Value::Float(f) => Decimal::from_f64(*f).map_or(Numeric::Invalid, Numeric::Finite),
            Value::Str(s) => parse_decimal(s).map_or(Numeric::Invalid, Numeric::Finite),
            other => return Err(ctx.unsupported(other)),
        };
        Ok(Some(numeric))
    }

    /// Ordering against a finite bound; `None` when not comparable.
    pub fn cmp_to(&self, bound: &Decimal) -> Option<Ordering> {
        match self {
            Numeric::Finite(d) => Some(d.cmp(bound)),
            Numeric::PositiveInfinity => Some(Ordering::Greater),
            Numeric::NegativeInfinity => Some(Ordering::Less),
            Numeric::Invalid => None,
        }
    }
}

/// Which orderings against the bound are acceptable.
#[derive(Debug, Clone, Copy)]
enum Accept {
    AtLeast,
    Above,
    AtMost,
    Below,
}

impl Accept {
    fn admits(self, ordering: Ordering) -> bool {
        match self {
            Accept::AtLeast => ordering != Ordering::Less,
            Accept::Above => ordering == Ordering::Greater,
            Accept::AtMost => ordering != Ordering::Greater,
            Accept::Below => ordering == Ordering::Less,
        }
    }
}

/// `value` compared against one or two decimal bounds.
#[derive(Debug, Clone)]
pub struct BoundRule {
    lower: Option<(Decimal, Accept)>,
    upper: Option<(Decimal, Accept)>,
}

impl BoundRule {
    fn admits(&self, numeric: &Numeric) -> bool {
        let check = |bound: &Option<(Decimal, Accept)>| match bound {
            Some((limit, accept)) => numeric
                .cmp_to(limit)
                .is_some_and(|ordering| accept.admits(ordering)),
            None => !matches!(numeric, Numeric::Invalid),
        };
        check(&self.lower) && check(&self.upper)
    }
}

impl ConstraintValidator for BoundRule {
    fn is_valid(
        &self,
        value: &Value<'_>,
        ctx: &ConstraintContext<'_>,
    ) -> Result<bool, EvaluationFault> {
        Ok(Numeric::read(value, ctx)?.map_or(true, |n| self.admits(&n)))
    }
}

fn integer_bound(kind: &str, params: &Params, name: &str) -> Result<Decimal, ConfigError> {
    params
        .get_i64(name)
        .map(|v| Decimal::from_i128(i128::from(v)))
        .ok_or_else(|| ConfigError::invalid_parameter(kind, name, "expected an integer"))
}

fn decimal_bound(kind: &str, params: &Params, name: &str) -> Result<Decimal, ConfigError> {
    params
        .get_str(name)
        .and_then(parse_decimal)
        .ok_or_else(|| ConfigError::invalid_parameter(kind, name, "expected a decimal string"))
}

fn min_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    Ok(Arc::new(BoundRule {
        lower: Some((integer_bound(kind, params, "value")?, Accept::AtLeast)),
        upper: None,
    }))
}

fn max_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    Ok(Arc::new(BoundRule {
        lower: None,
        upper: Some((integer_bound(kind, params, "value")?, Accept::AtMost)),
    }))
}

fn range_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    Ok(Arc::new(BoundRule {
        lower: Some((integer_bound(kind, params, "min")?, Accept::AtLeast)),
        upper: Some((integer_bound(kind, params, "max")?, Accept::AtMost)),
    }))
}

fn decimal_min_factory(
    kind: &str,
    params: &Params,
) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let accept = if params.get_bool("inclusive").unwrap_or(true) {
        Accept::AtLeast
    } else {
        Accept::Above
    };
    Ok(Arc::new(BoundRule {
        lower: Some((decimal_bound(kind, params, "value")?, accept)),
        upper: None,
    }))
}

fn decimal_max_factory(
    kind: &str,
    params: &Params,
) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let accept = if params.get_bool("inclusive").unwrap_or(true) {
        Accept::AtMost
    } else {
        Accept::Below
    };
    Ok(Arc::new(BoundRule {
        lower: None,
        upper: Some((decimal_bound(kind, params, "value")?, accept)),
    }))
}

fn sign_rule(accept: Accept) -> BoundRule {
    BoundRule {
        lower: match accept {
            Accept::AtLeast | Accept::Above => Some((Decimal::zero(), accept)),
            _ => None,
        },
        upper: match accept {
            Accept::AtMost | Accept::Below => Some((Decimal::zero(), accept)),
            _ => None,
        },
    }
}

/// At most `integer` integral and `fraction` fractional digits.
#[derive(Debug, Clone, Copy)]
pub struct DigitsRule {
    integer: usize,
    fraction: usize,
}

impl ConstraintValidator for DigitsRule {
    fn is_valid(
        &self,
        value: &Value<'_>,
        ctx: &ConstraintContext<'_>,
    ) -> Result<bool, EvaluationFault> {
        Ok(match Numeric::read(value, ctx)? {
            None => true,
            Some(Numeric::Finite(d)) => {
                d.integer_digits() <= self.integer && d.fraction_digits() <= self.fraction
            }
            Some(_) => false,
        })
    }
}

fn digits_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let read = |name: &str| {
        params
            .get_u64(name)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| ConfigError::invalid_parameter(kind, name, "expected a non-negative integer"))
    };
    Ok(Arc::new(DigitsRule {
        integer: read("integer")?,
        fraction: read("fraction")?,
    }))
}

fn min_le_max(params: &Params) -> Result<(), (&'static str, String)> {
    match (params.get_i64("min"), params.get_i64("max")) {
        (Some(min), Some(max)) if min > max => {
            Err(("max", format!("max ({max}) is less than min ({min})")))
        }
        _ => Ok(()),
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    let decimal_schema = || {
        ParamSchema::empty()
            .param(ParamSpec::required("value", ParamType::Decimal))
            .param(ParamSpec::with_default("inclusive", ParamType::Boolean, true))
    };

    vec![
        ConstraintKind::new("min", min_factory)
            .param(ParamSpec::required("value", ParamType::Integer))
            .message("must be greater than or equal to {value}"),
        ConstraintKind::new("max", max_factory)
            .param(ParamSpec::required("value", ParamType::Integer))
            .message("must be less than or equal to {value}"),
        ConstraintKind::new("range", range_factory)
            .schema(
                ParamSchema::empty()
                    .param(ParamSpec::required("min", ParamType::Integer))
                    .param(ParamSpec::required("max", ParamType::Integer))
                    .check(min_le_max),
            )
            .message("must be between {min} and {max}"),
        ConstraintKind::shared("positive", sign_rule(Accept::Above)).message("must be greater than 0"),
        ConstraintKind::shared("positive_or_zero", sign_rule(Accept::AtLeast))
            .message("must be greater than or equal to 0"),
        ConstraintKind::shared("negative", sign_rule(Accept::Below)).message("must be less than 0"),
        ConstraintKind::shared("negative_or_zero", sign_rule(Accept::AtMost))
            .message("must be less than or equal to 0"),
        ConstraintKind::new("decimal_min", decimal_min_factory)
            .schema(decimal_schema())
            .message("must be greater than or equal to {value}"),
        ConstraintKind::new("decimal_max", decimal_max_factory)
            .schema(decimal_schema())
            .message("must be less than or equal to {value}"),
        ConstraintKind::new("digits", digits_factory)
            .schema(
                ParamSchema::empty()
                    .param(ParamSpec::required("integer", ParamType::Unsigned))
                    .param(ParamSpec::required("fraction", ParamType::Unsigned)),
            )
            .message("numeric value out of bounds (<{integer} digits>.<{fraction} digits> expected)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyPath;
    use crate::validator::SystemClock;

    fn check(kind: &str, declared: Params, value: Value<'_>) -> bool {
        let kind = kinds().into_iter().find(|k| k.name() == kind).unwrap();
        let (params, validator) = kind.instantiate(&declared).unwrap();
        let path = PropertyPath::root();
        let ctx = ConstraintContext {
            kind: kind.name(),
            params: &params,
            path: &path,
            clock: &SystemClock,
        };
        validator.is_valid(&value, &ctx).unwrap()
    }

    #[test]
    fn min_and_max() {
        let p = || Params::new().with("value", 18);
        assert!(check("min", p(), Value::Int(18)));
        assert!(!check("min", p(), Value::Int(15)));
        assert!(check("min", p(), Value::Float(18.5)));
        assert!(check("min", p(), Value::Null));
        assert!(check("max", p(), Value::Int(18)));
        assert!(!check("max", p(), Value::Str("18.01".into())));
        assert!(!check("max", p(), Value::Str("not a number".into())));
    }

    #[test]
    fn sign_checks() {
        assert!(!check("positive", Params::new(), Value::Float(-1000.0)));
        assert!(!check("positive", Params::new(), Value::Int(0)));
        assert!(check("positive_or_zero", Params::new(), Value::Int(0)));
        assert!(check("negative", Params::new(), Value::Float(-0.001)));
        assert!(check("negative_or_zero", Params::new(), Value::Float(-0.0)));
        assert!(!check("positive", Params::new(), Value::Float(f64::NAN)));
        assert!(check("positive", Params::new(), Value::Float(f64::INFINITY)));
    }

    #[test]
    fn decimal_bounds_inclusive_and_exclusive() {
        let inclusive = || Params::new().with("value", "0.1");
        assert!(check("decimal_min", inclusive(), Value::Float(0.1)));
        assert!(!check("decimal_min", inclusive(), Value::Float(0.09)));

        let exclusive = || Params::new().with("value", "0.1").with("inclusive", false);
        assert!(!check("decimal_min", exclusive(), Value::Float(0.1)));
        assert!(check("decimal_max", Params::new().with("value", "99.99"), Value::Str("99.99".into())));
    }

    #[test]
    fn single_precision_floats_keep_their_decimal_value() {
        use crate::value::AsValue;

        let max = || Params::new().with("value", "0.1");
        assert!(check("decimal_max", max(), 0.1f32.as_value()));
        assert!(check("max", Params::new().with("value", 3), 2.5f32.as_value()));
        assert!(!check("decimal_max", max(), 0.11f32.as_value()));
    }

    #[test]
    fn digits_counts_both_sides() {
        let p = || Params::new().with("integer", 3).with("fraction", 2);
        assert!(check("digits", p(), Value::Str("123.45".into())));
        assert!(check("digits", p(), Value::Float(1.5)));
        assert!(!check("digits", p(), Value::Int(1234)));
        assert!(!check("digits", p(), Value::Str("1.234".into())));
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let kind = kinds().into_iter().find(|k| k.name() == "range").unwrap();
        let result = kind.instantiate(&Params::new().with("min", 10).with("max", 1));
        assert!(matches!(result, Err(ConfigError::InvalidParameter { .. })));
    }

    #[test]
    fn unsupported_value_is_a_fault() {
        let kind = kinds().into_iter().find(|k| k.name() == "positive").unwrap();
        let (params, validator) = kind.instantiate(&Params::new()).unwrap();
        let path = PropertyPath::root();
        let ctx = ConstraintContext {
            kind: "positive",
            params: &params,
            path: &path,
            clock: &SystemClock,
        };
        assert!(validator.is_valid(&Value::Bool(true), &ctx).is_err());
    }
}
