//! Type-erased member values.
//!
//! Accessors hand the walker a [`Value`] borrowed from the instance being
//! validated. Constraint validators only ever see this view, which keeps
//! them independent of the concrete Rust types they are attached to.

use crate::walker::Validatable;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

/// A borrowed, type-erased view of a member value.
#[derive(Clone)]
pub enum Value<'a> {
    /// Absent value (`None`)
    Null,
    Bool(bool),
    /// Any primitive integer
    Int(i128),
    Float(f64),
    Str(Cow<'a, str>),
    Date(NaiveDate),
    /// Instant in time; zoned and naive datetimes are normalised to UTC
    DateTime(DateTime<Utc>),
    /// Ordered container elements
    Seq(Vec<Value<'a>>),
    /// Map entries with keys rendered as strings, in deterministic order
    Map(Vec<(String, Value<'a>)>),
    /// A nested object that carries its own constraint metadata
    Object(&'a dyn Validatable),
}

impl<'a> Value<'a> {
    /// Short name of the variant, used in fault messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Size of a string (in chars), sequence or map.
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Seq(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Elements of a container paired with their path segment.
    ///
    /// Returns `None` when the value is not a container.
    pub fn elements(&self) -> Option<Vec<(crate::PathSegment, &Value<'a>)>> {
        match self {
            Value::Seq(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (crate::PathSegment::Index(i), v))
                    .collect(),
            ),
            Value::Map(entries) => Some(
                entries
                    .iter()
                    .map(|(k, v)| (crate::PathSegment::Key(k.clone()), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Snapshot of the value that outlives the validated instance.
    ///
    /// Nested objects are recorded by type name only.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => match i64::try_from(*i) {
                Ok(small) => serde_json::Value::from(small),
                Err(_) => match u64::try_from(*i) {
                    Ok(unsigned) => serde_json::Value::from(unsigned),
                    Err(_) => serde_json::Value::String(i.to_string()),
                },
            },
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Seq(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Object(obj) => serde_json::Value::String(obj.type_name().to_string()),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int(i) => f.debug_tuple("Int").field(i).finish(),
            Value::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Value::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(&obj.type_name()).finish(),
        }
    }
}

/// Conversion from a host value into the engine's [`Value`] view.
///
/// `#[derive(Constrained)]` implements this for the deriving type so it can
/// appear as a nested member, inside containers, or behind `Option`.
pub trait AsValue {
    fn as_value(&self) -> Value<'_>;
}

impl AsValue for str {
    fn as_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl AsValue for String {
    fn as_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self.as_str()))
    }
}

impl AsValue for Cow<'_, str> {
    fn as_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self.as_ref()))
    }
}

impl AsValue for char {
    fn as_value(&self) -> Value<'_> {
        Value::Str(Cow::Owned(self.to_string()))
    }
}

impl AsValue for bool {
    fn as_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

macro_rules! int_as_value {
    ($($ty:ty),*) => {
        $(
            impl AsValue for $ty {
                fn as_value(&self) -> Value<'_> {
                    Value::Int(*self as i128)
                }
            }
        )*
    };
}

int_as_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

impl AsValue for u128 {
    fn as_value(&self) -> Value<'_> {
        match i128::try_from(*self) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Str(Cow::Owned(self.to_string())),
        }
    }
}

impl AsValue for f32 {
    fn as_value(&self) -> Value<'_> {
        // Widen through the shortest decimal form, so 0.1f32 stays 0.1.
        let widened = self.to_string().parse::<f64>().unwrap_or(f64::from(*self));
        Value::Float(widened)
    }
}

impl AsValue for f64 {
    fn as_value(&self) -> Value<'_> {
        Value::Float(*self)
    }
}

impl AsValue for NaiveDate {
    fn as_value(&self) -> Value<'_> {
        Value::Date(*self)
    }
}

impl AsValue for NaiveDateTime {
    fn as_value(&self) -> Value<'_> {
        Value::DateTime(self.and_utc())
    }
}

impl<Tz: TimeZone> AsValue for DateTime<Tz> {
    fn as_value(&self) -> Value<'_> {
        Value::DateTime(self.with_timezone(&Utc))
    }
}

impl AsValue for SystemTime {
    fn as_value(&self) -> Value<'_> {
        Value::DateTime(DateTime::<Utc>::from(*self))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(&self) -> Value<'_> {
        match self {
            Some(inner) => inner.as_value(),
            None => Value::Null,
        }
    }
}

impl<T: AsValue + ?Sized> AsValue for &T {
    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}

impl<T: AsValue + ?Sized> AsValue for Box<T> {
    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}

impl<T: AsValue + ?Sized> AsValue for Arc<T> {
    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}

impl<T: AsValue + ?Sized> AsValue for Rc<T> {
    fn as_value(&self) -> Value<'_> {
        (**self).as_value()
    }
}

impl<T: AsValue> AsValue for [T] {
    fn as_value(&self) -> Value<'_> {
        Value::Seq(self.iter().map(AsValue::as_value).collect())
    }
}

impl<T: AsValue, const N: usize> AsValue for [T; N] {
    fn as_value(&self) -> Value<'_> {
        self.as_slice().as_value()
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_value(&self) -> Value<'_> {
        self.as_slice().as_value()
    }
}

impl<T: AsValue> AsValue for VecDeque<T> {
    fn as_value(&self) -> Value<'_> {
        Value::Seq(self.iter().map(AsValue::as_value).collect())
    }
}

impl<T: AsValue> AsValue for BTreeSet<T> {
    fn as_value(&self) -> Value<'_> {
        Value::Seq(self.iter().map(AsValue::as_value).collect())
    }
}

impl<T: AsValue + Ord, S> AsValue for HashSet<T, S> {
    fn as_value(&self) -> Value<'_> {
        // Hash order is unstable; element indices follow `T`'s ordering.
        let mut items: Vec<&T> = self.iter().collect();
        items.sort_unstable();
        Value::Seq(items.into_iter().map(AsValue::as_value).collect())
    }
}

impl<K: fmt::Display, V: AsValue> AsValue for BTreeMap<K, V> {
    fn as_value(&self) -> Value<'_> {
        Value::Map(self.iter().map(|(k, v)| (k.to_string(), v.as_value())).collect())
    }
}

impl<K: fmt::Display, V: AsValue, S> AsValue for HashMap<K, V, S> {
    fn as_value(&self) -> Value<'_> {
        let mut entries: Vec<(String, Value<'_>)> =
            self.iter().map(|(k, v)| (k.to_string(), v.as_value())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Map(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_to_null() {
        let none: Option<String> = None;
        assert!(none.as_value().is_null());
        assert_eq!(Some("x".to_string()).as_value().as_str(), Some("x"));
    }

    #[test]
    fn size_counts_chars_not_bytes() {
        assert_eq!("héllo".as_value().size(), Some(5));
        assert_eq!(vec![1, 2, 3].as_value().size(), Some(3));
        assert_eq!(42.as_value().size(), None);
    }

    #[test]
    fn hash_map_entries_are_sorted() {
        let mut map = HashMap::new();
        map.insert("zeta", 1);
        map.insert("alpha", 2);
        map.insert("mid", 3);

        let Value::Map(entries) = map.as_value() else {
            panic!("expected a map");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn hash_set_elements_follow_element_order() {
        let set: HashSet<&str> = ["pear", "apple", "fig"].into_iter().collect();
        let Value::Seq(items) = set.as_value() else {
            panic!("expected a sequence");
        };
        let rendered: Vec<_> = items.iter().filter_map(Value::as_str).collect();
        assert_eq!(rendered, ["apple", "fig", "pear"]);
    }

    #[test]
    fn f32_widens_through_shortest_form() {
        assert!(matches!(0.1f32.as_value(), Value::Float(f) if f == 0.1));
        assert!(matches!(f32::NAN.as_value(), Value::Float(f) if f.is_nan()));
        assert!(matches!(f32::INFINITY.as_value(), Value::Float(f) if f == f64::INFINITY));
    }

    #[test]
    fn elements_carry_index_and_key_segments() {
        let seq = vec!["a", "b"];
        let value = seq.as_value();
        let elements = value.elements().unwrap();
        assert_eq!(elements[1].0, crate::PathSegment::Index(1));

        let mut map = BTreeMap::new();
        map.insert("home", "x");
        let value = map.as_value();
        let elements = value.elements().unwrap();
        assert_eq!(elements[0].0, crate::PathSegment::Key("home".into()));
    }

    #[test]
    fn json_snapshot_of_scalars() {
        assert_eq!(15u8.as_value().to_json(), serde_json::json!(15));
        assert_eq!((-1000.5f64).as_value().to_json(), serde_json::json!(-1000.5));
        assert_eq!(f64::NAN.as_value().to_json(), serde_json::json!("NaN"));
        assert_eq!(
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().as_value().to_json(),
            serde_json::json!("2020-01-02")
        );
    }
}
