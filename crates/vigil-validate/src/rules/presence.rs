//! Presence constraints: the only kinds that reject an absent value.

use crate::error::EvaluationFault;
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;

/// Value must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotNullRule;

impl ConstraintValidator for NotNullRule {
    fn is_valid(&self, value: &Value<'_>, _: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        Ok(!value.is_null())
    }
}

/// Value must be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRule;

impl ConstraintValidator for NullRule {
    fn is_valid(&self, value: &Value<'_>, _: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        Ok(value.is_null())
    }
}

/// Present and non-empty string, sequence or map.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotEmptyRule;

impl ConstraintValidator for NotEmptyRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(false),
            other => other
                .size()
                .map(|len| len > 0)
                .ok_or_else(|| ctx.unsupported(other)),
        }
    }
}

/// Present string with at least one non-whitespace character.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotBlankRule;

impl ConstraintValidator for NotBlankRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(false),
            Value::Str(s) => Ok(!s.trim().is_empty()),
            other => Err(ctx.unsupported(other)),
        }
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![
        ConstraintKind::shared("not_null", NotNullRule).message("must not be null"),
        ConstraintKind::shared("null", NullRule).message("must be null"),
        ConstraintKind::shared("not_empty", NotEmptyRule).message("must not be empty"),
        ConstraintKind::shared("not_blank", NotBlankRule).message("must not be blank"),
    ]
}
