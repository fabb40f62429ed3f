//! Violations and the payloads built from them.

use crate::error::Error;
use crate::params::Params;
use crate::path::PropertyPath;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Where the failing value sits, relative to the validated root
    pub path: PropertyPath,
    /// Rendered message
    pub message: String,
    /// Snapshot of the failing value
    pub invalid_value: serde_json::Value,
    /// Constraint kind (e.g. "size")
    pub kind: String,
    /// Type name of the validated root
    pub root_type: &'static str,
    /// Message template before interpolation
    pub template: String,
    /// Effective constraint parameters
    pub params: Params,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every violation found by one validation call, in traversal order.
///
/// Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("{} constraint violation(s)", .violations.len())]
pub struct ViolationSet {
    violations: Vec<Violation>,
}

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Rendered messages in order.
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// Violations whose path is exactly `path`.
    pub fn at<'s>(&'s self, path: &'s PropertyPath) -> impl Iterator<Item = &'s Violation> + 's {
        self.violations.iter().filter(move |v| &v.path == path)
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.violations
    }

    /// `Ok(())` when empty, otherwise the set itself as the error.
    pub fn into_result(self) -> Result<(), ViolationSet> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// HTTP status a boundary layer should answer with.
    pub fn status_code(&self) -> StatusCode {
        if self.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    /// The wire shape: `{"status": "BAD_REQUEST", "errors": [...]}`.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload::new(
            StatusCode::BAD_REQUEST,
            self.violations.iter().map(|v| v.message.clone()).collect(),
        )
    }
}

impl From<Vec<Violation>> for ViolationSet {
    fn from(violations: Vec<Violation>) -> Self {
        Self { violations }
    }
}

impl IntoIterator for ViolationSet {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

/// Response body for a rejected request.
///
/// ```json
/// {
///   "status": "BAD_REQUEST",
///   "errors": ["Age should not be less than 18", "Salary must be positive"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: String,
    pub errors: Vec<String>,
}

impl ErrorPayload {
    pub fn new(status: StatusCode, errors: Vec<String>) -> Self {
        Self {
            status: status_name(status),
            errors,
        }
    }
}

// "Bad Request" -> "BAD_REQUEST"
fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(|reason| reason.to_ascii_uppercase().replace([' ', '-'], "_"))
        .unwrap_or_else(|| status.as_u16().to_string())
}

/// Why a value was not accepted by [`Engine::validated`](crate::Engine::validated).
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    /// The data broke one or more constraints.
    #[error("validation failed: {0}")]
    Invalid(#[from] ViolationSet),

    /// The engine could not validate at all.
    #[error(transparent)]
    Fault(#[from] Error),
}

impl Rejection {
    /// 400 for invalid data, 500 for engine faults.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Rejection::Invalid(_) => StatusCode::BAD_REQUEST,
            Rejection::Fault(err) => err.status_code(),
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            Rejection::Invalid(violations) => violations.to_payload(),
            Rejection::Fault(err) => ErrorPayload::new(err.status_code(), vec![err.to_string()]),
        }
    }

    pub fn violations(&self) -> Option<&ViolationSet> {
        match self {
            Rejection::Invalid(violations) => Some(violations),
            Rejection::Fault(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn violation(path: &[&str], message: &str) -> Violation {
        Violation {
            path: path.iter().copied().collect(),
            message: message.to_string(),
            invalid_value: serde_json::Value::Null,
            kind: "not_null".to_string(),
            root_type: "Demo",
            template: message.to_string(),
            params: Params::new(),
        }
    }

    #[test]
    fn payload_shape() {
        let set = ViolationSet::from(vec![
            violation(&["age"], "Age should not be less than 18"),
            violation(&["salary"], "Salary must be positive"),
        ]);
        let json = serde_json::to_value(set.to_payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "BAD_REQUEST",
                "errors": ["Age should not be less than 18", "Salary must be positive"]
            })
        );
        assert_eq!(set.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_set_is_ok() {
        let set = ViolationSet::new();
        assert!(set.is_empty());
        assert_eq!(set.status_code(), StatusCode::OK);
        assert!(set.into_result().is_ok());
    }

    #[test]
    fn lookup_by_path() {
        let set = ViolationSet::from(vec![
            violation(&["address", "city"], "must not be blank"),
            violation(&["name"], "must not be null"),
        ]);
        let city: PropertyPath = ["address", "city"].into_iter().collect();
        let found: Vec<_> = set.at(&city).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string(), "address.city: must not be blank");
    }

    #[test]
    fn rejection_status_and_payload() {
        let invalid = Rejection::from(ViolationSet::from(vec![violation(&["x"], "bad")]));
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.to_payload().errors, vec!["bad".to_string()]);

        let fault = Rejection::from(Error::from(ConfigError::DuplicateKind("x".into())));
        assert_eq!(fault.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = fault.to_payload();
        assert_eq!(payload.status, "INTERNAL_SERVER_ERROR");
        assert!(fault.violations().is_none());
    }
}
