//! # Vigil Validate
//!
//! Declarative constraint validation for Rust object graphs. Constraints
//! are declared on struct members with `#[derive(Constrained)]`, checked by
//! a long-lived [`Engine`], and reported as a complete, ordered
//! [`ViolationSet`] rather than the first failure.
//!
//! ## Example
//!
//! ```rust
//! use vigil_validate::prelude::*;
//!
//! #[derive(Constrained)]
//! struct Address {
//!     #[validate(not_blank)]
//!     city: String,
//! }
//!
//! #[derive(Constrained)]
//! struct Employee {
//!     #[validate(not_blank)]
//!     name: String,
//!     #[validate(min(value = 18), message = "Age should not be less than {value}")]
//!     #[validate(max(value = 100))]
//!     age: u32,
//!     #[validate(positive, message = "Salary must be positive")]
//!     salary: f64,
//!     #[validate(nested)]
//!     address: Address,
//! }
//!
//! let engine = Engine::new();
//! let employee = Employee {
//!     name: "John".into(),
//!     age: 15,
//!     salary: -1000.0,
//!     address: Address { city: " ".into() },
//! };
//!
//! let violations = engine.validate(&employee).unwrap();
//! assert_eq!(
//!     violations.messages(),
//!     ["Age should not be less than 18", "Salary must be positive", "must not be blank"]
//! );
//! assert_eq!(violations.iter().nth(2).unwrap().path.to_string(), "address.city");
//! ```
//!
//! ## Attribute syntax
//!
//! - `#[validate(kind)]` or `#[validate(kind(param = value, ...))]` attaches a
//!   constraint. Several kinds may share one attribute.
//! - `message = "..."` overrides the message of every constraint in the same
//!   attribute. `{param}` placeholders are filled from the constraint's
//!   parameters.
//! - `#[validate(nested)]` cascades into a nested object (also through
//!   `Option` and `Box`).
//! - `#[validate(each_nested)]` cascades into each element of a container.
//! - `#[validate(each(kind, ...))]` constrains each element of a container.
//! - On the struct itself, `#[validate(kind)]` adds a type-level constraint.
//!
//! ## Errors
//!
//! Invalid data is never an error: it is the returned set. `Err` carries
//! engine faults only (see [`Error`]): unknown kinds and malformed
//! parameters, validators that fail to evaluate, and runaway nesting.
//! [`Rejection`] and [`ErrorPayload`] map both outcomes to a boundary
//! response (400 with messages, 500 for faults).

#[macro_use]
mod log;

mod config;
mod engine;
mod error;
mod interpolate;
mod introspect;
mod metadata;
mod params;
mod path;
mod registry;
pub mod rules;
mod validator;
mod value;
mod violation;
mod walker;


// Lets the derive macro name `::vigil_validate` from inside this crate.
extern crate self as vigil_validate;

pub use config::{EngineConfig, ENV_PREFIX};
pub use engine::{Engine, EngineBuilder};
pub use error::{ConfigError, Error, EvaluationFault, Result};
pub use interpolate::{render, MessageContext, MessageInterpolator, TemplateInterpolator};
pub use metadata::{
    Accessor, Constrained, ConstraintDeclaration, ConstraintMetadata, MemberMetadata,
    MemberSchema, Schema, TypeMetadata,
};
pub use params::{ParamCheck, ParamSchema, ParamSpec, ParamType, Params};
pub use path::{PathSegment, PropertyPath};
pub use registry::{ConstraintKind, ConstraintRegistry};
pub use validator::{
    Clock, ConstraintContext, ConstraintValidator, FixedClock, SystemClock, ValidatorFactory,
};
pub use value::{AsValue, Value};
pub use violation::{ErrorPayload, Rejection, Violation, ViolationSet};
pub use walker::{Validatable, Walker};

pub use vigil_macros::Constrained;

/// Prelude module for validation
pub mod prelude {
    pub use crate::{
        AsValue, Constrained, ConstraintContext, ConstraintDeclaration, ConstraintKind,
        ConstraintValidator, Engine, EngineConfig, Error, EvaluationFault, MemberSchema,
        PropertyPath, Rejection, Schema, Validatable, Value, Violation, ViolationSet,
    };
}
