//! Boolean assertions: `assert_true` and `assert_false`.

use crate::error::EvaluationFault;
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;

/// Boolean must equal `expected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertRule {
    pub expected: bool,
}

impl ConstraintValidator for AssertRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        match value {
            Value::Null => Ok(true),
            Value::Bool(b) => Ok(*b == self.expected),
            other => Err(ctx.unsupported(other)),
        }
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![
        ConstraintKind::shared("assert_true", AssertRule { expected: true }).message("must be true"),
        ConstraintKind::shared("assert_false", AssertRule { expected: false })
            .message("must be false"),
    ]
}
