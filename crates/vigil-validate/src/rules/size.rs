//! Size of strings (in characters), sequences and maps.

use crate::error::{ConfigError, EvaluationFault};
use crate::params::{ParamSchema, ParamSpec, ParamType, Params};
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;
use std::sync::Arc;

/// Size within `[min, max]`, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRule {
    pub min: usize,
    pub max: usize,
}

impl ConstraintValidator for SizeRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(true),
            other => other
                .size()
                .map(|len| (self.min..=self.max).contains(&len))
                .ok_or_else(|| ctx.unsupported(other)),
        }
    }
}

fn size_factory(kind: &str, params: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
    let bound = |name: &str, fallback: usize| match params.get_u64(name) {
        Some(v) => usize::try_from(v)
            .map_err(|_| ConfigError::invalid_parameter(kind, name, "out of range")),
        None => Ok(fallback),
    };
    Ok(Arc::new(SizeRule {
        min: bound("min", 0)?,
        max: bound("max", usize::MAX)?,
    }))
}

fn min_le_max(params: &Params) -> Result<(), (&'static str, String)> {
    match (params.get_u64("min"), params.get_u64("max")) {
        (Some(min), Some(max)) if min > max => {
            Err(("max", format!("max ({max}) is less than min ({min})")))
        }
        _ => Ok(()),
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![ConstraintKind::new("size", size_factory)
        .schema(
            ParamSchema::empty()
                .param(ParamSpec::with_default("min", ParamType::Unsigned, 0))
                .param(ParamSpec::with_default("max", ParamType::Unsigned, i64::MAX))
                .check(min_le_max),
        )
        .message("size must be between {min} and {max}")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyPath;
    use crate::validator::SystemClock;

    fn size(min: u64, max: u64) -> Arc<dyn ConstraintValidator> {
        let kind = kinds().remove(0);
        kind.instantiate(&Params::new().with("min", min).with("max", max))
            .unwrap()
            .1
    }

    fn run(rule: &dyn ConstraintValidator, value: Value<'_>) -> Result<bool, EvaluationFault> {
        let params = Params::new();
        let path = PropertyPath::root();
        let ctx = ConstraintContext {
            kind: "size",
            params: &params,
            path: &path,
            clock: &SystemClock,
        };
        rule.is_valid(&value, &ctx)
    }

    #[test]
    fn string_length_in_chars() {
        let rule = size(2, 4);
        assert!(!run(&*rule, Value::Str("a".into())).unwrap());
        assert!(run(&*rule, Value::Str("ab".into())).unwrap());
        assert!(run(&*rule, Value::Str("äöüß".into())).unwrap());
        assert!(!run(&*rule, Value::Str("abcde".into())).unwrap());
    }

    #[test]
    fn containers_and_null() {
        let rule = size(1, 2);
        assert!(run(&*rule, Value::Null).unwrap());
        assert!(!run(&*rule, Value::Seq(vec![])).unwrap());
        assert!(run(&*rule, Value::Seq(vec![Value::Int(1)])).unwrap());
        assert!(run(&*rule, Value::Int(5)).is_err());
    }

    #[test]
    fn default_bounds_are_open() {
        let kind = kinds().remove(0);
        let (params, rule) = kind.instantiate(&Params::new()).unwrap();
        assert_eq!(params.get_u64("min"), Some(0));
        assert!(run(&*rule, Value::Str("".into())).unwrap());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let kind = kinds().remove(0);
        assert!(kind
            .instantiate(&Params::new().with("min", 5).with("max", 1))
            .is_err());
    }
}
