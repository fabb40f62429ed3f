//! Engine faults.
//!
//! A failed constraint is not an error: it is a [`Violation`](crate::Violation)
//! in the returned set. The types here cover the two ways the engine itself
//! can be broken: bad metadata and validators that fail to evaluate.

use crate::path::PropertyPath;
use http::StatusCode;

/// Result type alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Misconfigured constraint metadata or registrations.
///
/// Raised while building an engine or the metadata of a type, never
/// while walking an instance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A declaration names a kind that was never registered.
    #[error("unknown constraint kind '{kind}' declared on {type_name}{}", member_suffix(.member))]
    UnknownConstraint {
        type_name: &'static str,
        member: Option<String>,
        kind: String,
    },

    /// Two registrations share a kind name.
    #[error("constraint kind '{0}' is already registered")]
    DuplicateKind(String),

    /// A required parameter was not supplied.
    #[error("constraint '{kind}' requires parameter '{param}'")]
    MissingParameter { kind: String, param: String },

    /// A parameter has the wrong type or an unacceptable value.
    #[error("constraint '{kind}' has invalid parameter '{param}': {reason}")]
    InvalidParameter {
        kind: String,
        param: String,
        reason: String,
    },

    /// A parameter the kind's schema does not know about.
    #[error("constraint '{kind}' does not accept parameter '{param}'")]
    UnexpectedParameter { kind: String, param: String },

    /// A regular expression failed to compile.
    #[error("constraint '{kind}' has invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        kind: String,
        pattern: String,
        reason: String,
    },

    /// Engine settings could not be read from the environment.
    #[error("invalid engine configuration: {0}")]
    Environment(String),

    /// A declaration refers to a member the type does not expose.
    #[error("{type_name} has no constrained member named '{member}'")]
    UnknownMember {
        type_name: &'static str,
        member: String,
    },
}

fn member_suffix(member: &Option<String>) -> String {
    member
        .as_ref()
        .map(|m| format!(".{m}"))
        .unwrap_or_default()
}

impl ConfigError {
    pub fn invalid_parameter(
        kind: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            kind: kind.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// Returned by a validator that could not reach a verdict.
///
/// This is a defect in the constraint implementation or in how it was
/// attached (e.g. `size` on a number), never a statement about user data.
#[derive(Debug, thiserror::Error)]
#[error("{reason}")]
pub struct EvaluationFault {
    pub reason: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl EvaluationFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap an underlying error.
    pub fn caused_by(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The validator was handed a value type it cannot judge.
    pub fn unsupported(kind: &str, value_kind: &str) -> Self {
        Self::new(format!(
            "constraint '{kind}' cannot be applied to a {value_kind} value"
        ))
    }
}

/// Error from a validation call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("constraint '{kind}' failed to evaluate at '{path}': {fault}")]
    Evaluation {
        kind: String,
        path: PropertyPath,
        #[source]
        fault: EvaluationFault,
    },

    #[error("cascade depth limit of {limit} exceeded at '{path}'")]
    DepthExceeded { path: PropertyPath, limit: usize },
}

impl Error {
    /// Every engine fault is a deployment or programming defect.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, Error::Evaluation { .. })
    }
}
