//! The contract every constraint kind implements.

use crate::error::{ConfigError, EvaluationFault};
use crate::params::Params;
use crate::path::PropertyPath;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of "now" for temporal constraints.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant. Useful for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Everything a validator may consult besides the value itself.
pub struct ConstraintContext<'a> {
    /// Kind name the validator was registered under
    pub kind: &'a str,
    /// Effective parameters, defaults included
    pub params: &'a Params,
    /// Path of the value being checked
    pub path: &'a PropertyPath,
    pub clock: &'a dyn Clock,
}

impl ConstraintContext<'_> {
    /// Fault for a value type this kind does not support.
    pub fn unsupported(&self, value: &Value<'_>) -> EvaluationFault {
        EvaluationFault::unsupported(self.kind, value.kind_name())
    }
}

/// Decides whether a value satisfies one constraint.
///
/// Implementations must be pure functions of the value and parameters:
/// the engine shares them between threads and calls them repeatedly.
/// `Ok(false)` is a violation; `Err` means the validator could not judge.
///
/// ## Example
///
/// ```rust
/// use vigil_validate::prelude::*;
///
/// struct Even;
///
/// impl ConstraintValidator for Even {
///     fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
///         match value {
///             Value::Null => Ok(true),
///             Value::Int(n) => Ok(n % 2 == 0),
///             other => Err(ctx.unsupported(other)),
///         }
///     }
/// }
/// ```
pub trait ConstraintValidator: Send + Sync {
    fn is_valid(
        &self,
        value: &Value<'_>,
        ctx: &ConstraintContext<'_>,
    ) -> Result<bool, EvaluationFault>;
}

impl<F> ConstraintValidator for F
where
    F: Fn(&Value<'_>, &ConstraintContext<'_>) -> Result<bool, EvaluationFault> + Send + Sync,
{
    fn is_valid(
        &self,
        value: &Value<'_>,
        ctx: &ConstraintContext<'_>,
    ) -> Result<bool, EvaluationFault> {
        self(value, ctx)
    }
}

/// Builds a validator from a declaration's resolved parameters.
///
/// Runs once per declaration while type metadata is built, so this is the
/// place to precompile anything expensive (regexes, parsed bounds) and to
/// reject parameter values the schema alone cannot catch.
pub trait ValidatorFactory: Send + Sync {
    fn create(
        &self,
        kind: &str,
        params: &Params,
    ) -> Result<Arc<dyn ConstraintValidator>, ConfigError>;
}

impl<F> ValidatorFactory for F
where
    F: Fn(&str, &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> + Send + Sync,
{
    fn create(
        &self,
        kind: &str,
        params: &Params,
    ) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
        self(kind, params)
    }
}

/// Factory that hands out one shared, parameter-independent validator.
pub(crate) struct Shared(pub Arc<dyn ConstraintValidator>);

impl ValidatorFactory for Shared {
    fn create(&self, _: &str, _: &Params) -> Result<Arc<dyn ConstraintValidator>, ConfigError> {
        Ok(Arc::clone(&self.0))
    }
}
