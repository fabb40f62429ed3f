//! Constraint parameters and their schemas.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named parameters of a constraint declaration.
///
/// Ordered by name so interpolation and serialization are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, serde_json::Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, serializing the value to JSON.
    pub fn try_insert(
        &mut self,
        name: impl Into<String>,
        value: impl Serialize,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.0.insert(name.into(), value);
        Ok(())
    }

    /// Like [`try_insert`](Self::try_insert) for values that always
    /// serialize (numbers, strings, booleans). A failing value is skipped;
    /// declarations use [`ConstraintDeclaration::param`](crate::ConstraintDeclaration::param),
    /// which reports it instead.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Serialize) {
        let _ = self.try_insert(name, value);
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(serde_json::Value::as_i64)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(serde_json::Value::as_u64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(serde_json::Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(serde_json::Value::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(serde_json::Value::as_str)
    }

    /// A list of strings; absent or malformed lists read as empty.
    pub fn get_str_list(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .and_then(serde_json::Value::as_array)
            .map(|items| items.iter().filter_map(serde_json::Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Serialize> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Accepted JSON shape of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Signed 64-bit integer
    Integer,
    /// Non-negative integer
    Unsigned,
    /// Any JSON number
    Number,
    Boolean,
    String,
    /// String holding a decimal number such as `"-12.50"`
    Decimal,
    /// Array of strings
    StringList,
}

impl ParamType {
    fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::Integer => value.is_i64(),
            ParamType::Unsigned => value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::String => value.is_string(),
            ParamType::Decimal => value
                .as_str()
                .map(|s| crate::rules::parse_decimal(s).is_some())
                .unwrap_or(false),
            ParamType::StringList => value
                .as_array()
                .map(|items| items.iter().all(serde_json::Value::is_string))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Integer => "an integer",
            ParamType::Unsigned => "a non-negative integer",
            ParamType::Number => "a number",
            ParamType::Boolean => "a boolean",
            ParamType::String => "a string",
            ParamType::Decimal => "a decimal string",
            ParamType::StringList => "a list of strings",
        };
        f.write_str(name)
    }
}

/// Declaration of one parameter a constraint kind accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, ty: ParamType) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
        }
    }

    /// Optional parameter that takes `default` when omitted.
    pub fn with_default(name: &'static str, ty: ParamType, default: impl Serialize) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: serde_json::to_value(default).ok(),
        }
    }
}

/// Cross-parameter check, e.g. `min <= max`. Returns the offending
/// parameter and a reason.
pub type ParamCheck = fn(&Params) -> Result<(), (&'static str, String)>;

/// The full parameter contract of a constraint kind.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
    checks: Vec<ParamCheck>,
}

impl ParamSchema {
    /// Schema for kinds that take no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn check(mut self, check: ParamCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Check `declared` against the schema and fill in defaults.
    ///
    /// The returned set is what validators and message interpolation see.
    pub fn resolve(&self, kind: &str, declared: &Params) -> Result<Params, ConfigError> {
        for (name, _) in declared.iter() {
            if !self.specs.iter().any(|spec| spec.name == name) {
                return Err(ConfigError::UnexpectedParameter {
                    kind: kind.to_string(),
                    param: name.to_string(),
                });
            }
        }

        let mut resolved = Params::new();
        for spec in &self.specs {
            match declared.get(spec.name) {
                Some(value) if spec.ty.accepts(value) => {
                    resolved.0.insert(spec.name.to_string(), value.clone());
                }
                Some(value) => {
                    return Err(ConfigError::invalid_parameter(
                        kind,
                        spec.name,
                        format!("expected {}, got {value}", spec.ty),
                    ));
                }
                None if spec.required => {
                    return Err(ConfigError::MissingParameter {
                        kind: kind.to_string(),
                        param: spec.name.to_string(),
                    });
                }
                None => {
                    if let Some(default) = &spec.default {
                        resolved.0.insert(spec.name.to_string(), default.clone());
                    }
                }
            }
        }

        for check in &self.checks {
            check(&resolved)
                .map_err(|(param, reason)| ConfigError::invalid_parameter(kind, param, reason))?;
        }

        Ok(resolved)
    }
}
