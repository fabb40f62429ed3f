//! Constraint kind registry.
//!
//! Maps a kind name (`"not_null"`, `"size"`, ...) to its parameter schema,
//! default message and validator factory. Built-in and custom kinds go
//! through the same [`ConstraintRegistry::register`] call; the registry is
//! frozen once the engine is built.

use crate::error::{ConfigError, EvaluationFault};
use crate::params::{ParamSchema, ParamSpec, Params};
use crate::validator::{ConstraintContext, ConstraintValidator, Shared, ValidatorFactory};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registrable constraint kind.
///
/// ## Example
///
/// ```rust
/// use vigil_validate::prelude::*;
///
/// let even = ConstraintKind::predicate("even", |value, ctx| match value {
///     Value::Null => Ok(true),
///     Value::Int(n) => Ok(n % 2 == 0),
///     other => Err(ctx.unsupported(other)),
/// })
/// .message("must be an even number");
///
/// let engine = Engine::builder().register(even).build().unwrap();
/// assert!(engine.registry().contains("even"));
/// ```
#[derive(Clone)]
pub struct ConstraintKind {
    name: String,
    schema: ParamSchema,
    default_message: String,
    factory: Arc<dyn ValidatorFactory>,
}

impl ConstraintKind {
    /// A kind whose validator is built per declaration by `factory`.
    pub fn new(name: impl Into<String>, factory: impl ValidatorFactory + 'static) -> Self {
        let name = name.into();
        Self {
            default_message: format!("must satisfy '{name}'"),
            name,
            schema: ParamSchema::empty(),
            factory: Arc::new(factory),
        }
    }

    /// A kind backed by one stateless validator shared by every declaration.
    pub fn shared(name: impl Into<String>, validator: impl ConstraintValidator + 'static) -> Self {
        Self::new(name, Shared(Arc::new(validator)))
    }

    /// A kind backed by a plain predicate over the value and its context.
    pub fn predicate<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value<'_>, &ConstraintContext<'_>) -> Result<bool, EvaluationFault>
            + Send
            + Sync
            + 'static,
    {
        Self::shared(name, predicate)
    }

    /// Default message template, used when a declaration has none.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.default_message = template.into();
        self
    }

    /// Replace the parameter schema.
    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Add one parameter to the schema.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.schema = self.schema.param(spec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn default_message(&self) -> &str {
        &self.default_message
    }

    /// Resolve declared parameters and build the validator for them.
    pub fn instantiate(
        &self,
        declared: &Params,
    ) -> Result<(Params, Arc<dyn ConstraintValidator>), ConfigError> {
        let params = self.schema.resolve(&self.name, declared)?;
        let validator = self.factory.create(&self.name, &params)?;
        Ok((params, validator))
    }
}

impl fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintKind")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("default_message", &self.default_message)
            .finish_non_exhaustive()
    }
}

/// Lookup table from kind name to [`ConstraintKind`].
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    kinds: HashMap<String, ConstraintKind>,
}

impl ConstraintRegistry {
    /// An empty registry, without the built-in catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in crate::rules::builtin_kinds() {
            // Built-in names are distinct, so registration cannot collide.
            let _ = registry.register(kind);
        }
        registry
    }

    /// Add a kind. Fails if the name is taken.
    pub fn register(&mut self, kind: ConstraintKind) -> Result<(), ConfigError> {
        if self.kinds.contains_key(kind.name()) {
            return Err(ConfigError::DuplicateKind(kind.name().to_string()));
        }
        trace_debug!(kind = %kind.name(), "constraint kind registered");
        self.kinds.insert(kind.name().to_string(), kind);
        Ok(())
    }

    /// Find a kind by name.
    pub fn lookup(&self, name: &str) -> Option<&ConstraintKind> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamType;

    fn always(valid: bool) -> ConstraintKind {
        ConstraintKind::predicate("always", move |_, _| Ok(valid))
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ConstraintRegistry::new();
        registry.register(always(true)).unwrap();
        let err = registry.register(always(false)).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKind("always".into()));
    }

    #[test]
    fn builtins_cover_catalog() {
        let registry = ConstraintRegistry::with_builtins();
        for name in [
            "not_null",
            "null",
            "not_empty",
            "not_blank",
            "size",
            "min",
            "max",
            "range",
            "positive",
            "positive_or_zero",
            "negative",
            "negative_or_zero",
            "decimal_min",
            "decimal_max",
            "digits",
            "pattern",
            "email",
            "url",
            "past",
            "past_or_present",
            "future",
            "future_or_present",
            "assert_true",
            "assert_false",
            "credit_card_number",
            "cpf",
            "pesel",
        ] {
            assert!(registry.contains(name), "missing built-in '{name}'");
        }
    }

    #[test]
    fn builtin_cannot_be_shadowed() {
        let mut registry = ConstraintRegistry::with_builtins();
        let err = registry
            .register(ConstraintKind::predicate("email", |_, _| Ok(true)))
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKind("email".into()));
    }

    #[test]
    fn instantiate_resolves_schema() {
        let kind = always(true).param(ParamSpec::with_default("level", ParamType::Integer, 3));
        let (params, _) = kind.instantiate(&Params::new()).unwrap();
        assert_eq!(params.get_i64("level"), Some(3));

        let result = kind.instantiate(&Params::new().with("other", 1));
        assert!(matches!(result, Err(ConfigError::UnexpectedParameter { .. })));
    }

    #[test]
    fn names_are_sorted() {
        let registry = ConstraintRegistry::with_builtins();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
