//! Past and future checks against the engine clock.
//!
//! Dates compare with the clock's current UTC date, instants with the
//! current instant.

use crate::error::EvaluationFault;
use crate::registry::ConstraintKind;
use crate::validator::{ConstraintContext, ConstraintValidator};
use crate::value::Value;
use std::cmp::Ordering;

/// Which orderings relative to "now" are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalRule {
    accept_before: bool,
    accept_now: bool,
    accept_after: bool,
}

impl TemporalRule {
    pub const PAST: Self = Self::new(true, false, false);
    pub const PAST_OR_PRESENT: Self = Self::new(true, true, false);
    pub const FUTURE: Self = Self::new(false, false, true);
    pub const FUTURE_OR_PRESENT: Self = Self::new(false, true, true);

    const fn new(accept_before: bool, accept_now: bool, accept_after: bool) -> Self {
        Self {
            accept_before,
            accept_now,
            accept_after,
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match ordering {
            Ordering::Less => self.accept_before,
            Ordering::Equal => self.accept_now,
            Ordering::Greater => self.accept_after,
        }
    }
}

impl ConstraintValidator for TemporalRule {
    fn is_valid(&self, value: &Value<'_>, ctx: &ConstraintContext<'_>) -> Result<bool, EvaluationFault> {
        let now = ctx.clock.now();
        let ordering = match value {
            Value::Null => return Ok(true),
            Value::Date(date) => date.cmp(&now.date_naive()),
            Value::DateTime(instant) => instant.cmp(&now),
            other => return Err(ctx.unsupported(other)),
        };
        Ok(self.accepts(ordering))
    }
}

pub(super) fn kinds() -> Vec<ConstraintKind> {
    vec![
        ConstraintKind::shared("past", TemporalRule::PAST).message("must be a past date"),
        ConstraintKind::shared("past_or_present", TemporalRule::PAST_OR_PRESENT)
            .message("must be a date in the past or in the present"),
        ConstraintKind::shared("future", TemporalRule::FUTURE).message("must be a future date"),
        ConstraintKind::shared("future_or_present", TemporalRule::FUTURE_OR_PRESENT)
            .message("must be a date in the present or in the future"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use crate::path::PropertyPath;
    use crate::validator::FixedClock;
    use chrono::{DateTime, Duration, NaiveDate, Utc};

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn check(rule: TemporalRule, value: Value<'_>) -> bool {
        let params = Params::new();
        let path = PropertyPath::root();
        let clock = FixedClock(now());
        let ctx = ConstraintContext {
            kind: "temporal",
            params: &params,
            path: &path,
            clock: &clock,
        };
        rule.is_valid(&value, &ctx).unwrap()
    }

    #[test]
    fn instants() {
        let earlier = Value::DateTime(now() - Duration::seconds(1));
        let later = Value::DateTime(now() + Duration::seconds(1));
        assert!(check(TemporalRule::PAST, earlier.clone()));
        assert!(!check(TemporalRule::PAST, Value::DateTime(now())));
        assert!(check(TemporalRule::PAST_OR_PRESENT, Value::DateTime(now())));
        assert!(check(TemporalRule::FUTURE, later.clone()));
        assert!(!check(TemporalRule::FUTURE, earlier));
        assert!(check(TemporalRule::FUTURE_OR_PRESENT, later));
    }

    #[test]
    fn dates_compare_by_day() {
        let today = now().date_naive();
        assert!(!check(TemporalRule::PAST, Value::Date(today)));
        assert!(check(TemporalRule::PAST_OR_PRESENT, Value::Date(today)));
        assert!(check(TemporalRule::FUTURE_OR_PRESENT, Value::Date(today)));
        assert!(check(
            TemporalRule::PAST,
            Value::Date(NaiveDate::from_ymd_opt(1990, 5, 17).unwrap())
        ));
    }

    #[test]
    fn null_passes_and_strings_fault() {
        assert!(check(TemporalRule::FUTURE, Value::Null));
        let params = Params::new();
        let path = PropertyPath::root();
        let clock = FixedClock(now());
        let ctx = ConstraintContext {
            kind: "future",
            params: &params,
            path: &path,
            clock: &clock,
        };
        assert!(TemporalRule::FUTURE
            .is_valid(&Value::Str("2030-01-01".into()), &ctx)
            .is_err());
    }
}
