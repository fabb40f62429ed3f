//! Built-in constraint catalog.
//!
//! Every kind here except the presence kinds (`not_null`, `not_empty`,
//! `not_blank`) accepts an absent value; required-ness is expressed by
//! adding `not_null` alongside.

mod boolean;
mod checksum;
mod decimal;
mod numeric;
mod presence;
mod size;
mod temporal;
mod text;

pub use decimal::Decimal;
pub use numeric::Numeric;

pub(crate) use decimal::parse_decimal;

use crate::registry::ConstraintKind;

/// Every built-in kind, in catalog order.
pub(crate) fn builtin_kinds() -> Vec<ConstraintKind> {
    let mut kinds = Vec::new();
    kinds.extend(presence::kinds());
    kinds.extend(size::kinds());
    kinds.extend(numeric::kinds());
    kinds.extend(text::kinds());
    kinds.extend(temporal::kinds());
    kinds.extend(boolean::kinds());
    kinds.extend(checksum::kinds());
    kinds
}
