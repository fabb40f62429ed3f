//! Constraint metadata: what a type declares and what the engine compiles
//! it into.
//!
//! A type describes itself through [`Constrained::declare`], usually
//! generated by `#[derive(Constrained)]`. The declared [`Schema`] is
//! compiled once per type into an immutable [`TypeMetadata`] whose
//! validators are ready to run.

use crate::error::ConfigError;
use crate::params::Params;
use crate::registry::ConstraintRegistry;
use crate::validator::ConstraintValidator;
use crate::value::Value;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Reads one member's value from an instance.
pub type Accessor<T> = for<'a> fn(&'a T) -> Value<'a>;

/// A type that carries constraint declarations.
///
/// ## Example
///
/// ```rust
/// use vigil_validate::prelude::*;
///
/// struct Account {
///     login: String,
///     age: u32,
/// }
///
/// impl Constrained for Account {
///     fn declare(schema: Schema<Self>) -> Schema<Self> {
///         schema
///             .member(
///                 MemberSchema::new("login", |a: &Account| a.login.as_value())
///                     .constraint(ConstraintDeclaration::new("not_blank")),
///             )
///             .member(
///                 MemberSchema::new("age", |a: &Account| a.age.as_value())
///                     .constraint(ConstraintDeclaration::new("min").param("value", 18)),
///             )
///     }
/// }
///
/// let engine = Engine::new();
/// let violations = engine
///     .validate(&Account { login: " ".into(), age: 17 })
///     .unwrap();
/// assert_eq!(violations.len(), 2);
/// ```
pub trait Constrained: Sized + Send + Sync + 'static {
    /// Add this type's members and constraints to `schema`.
    fn declare(schema: Schema<Self>) -> Schema<Self>;
}

/// One constraint attached to a member, an element or a type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintDeclaration {
    kind: String,
    params: Params,
    message: Option<String>,
    /// Parameters whose value could not be serialized, with the reason
    #[serde(skip)]
    rejected: Vec<(String, String)>,
}

impl ConstraintDeclaration {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Params::new(),
            message: None,
            rejected: Vec::new(),
        }
    }

    /// Set one parameter.
    ///
    /// A value that cannot be serialized is remembered and reported as an
    /// invalid parameter when the metadata is built.
    pub fn param(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        if let Err(err) = self.params.try_insert(name.clone(), value) {
            self.rejected.push((name, err.to_string()));
        }
        self
    }

    /// Replace all parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Override the kind's default message template.
    pub fn message(mut self, template: impl Into<String>) -> Self {
        self.message = Some(template.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn declared_params(&self) -> &Params {
        &self.params
    }

    pub fn message_template(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Declaration of one member.
pub struct MemberSchema<T> {
    name: String,
    accessor: Accessor<T>,
    constraints: Vec<ConstraintDeclaration>,
    element_constraints: Vec<ConstraintDeclaration>,
    cascade: bool,
    cascade_elements: bool,
}

impl<T> MemberSchema<T> {
    pub fn new(name: impl Into<String>, accessor: Accessor<T>) -> Self {
        Self {
            name: name.into(),
            accessor,
            constraints: Vec::new(),
            element_constraints: Vec::new(),
            cascade: false,
            cascade_elements: false,
        }
    }

    /// Constraint on the member value itself.
    pub fn constraint(mut self, declaration: ConstraintDeclaration) -> Self {
        self.constraints.push(declaration);
        self
    }

    /// Constraint on each element (or map value) of a container member.
    pub fn element_constraint(mut self, declaration: ConstraintDeclaration) -> Self {
        self.element_constraints.push(declaration);
        self
    }

    /// Validate the nested object this member holds.
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    /// Validate every nested object held by this container member.
    pub fn cascade_elements(mut self) -> Self {
        self.cascade_elements = true;
        self
    }
}

/// Everything a type declares, in declaration order.
pub struct Schema<T> {
    constraints: Vec<ConstraintDeclaration>,
    members: Vec<MemberSchema<T>>,
}

impl<T> Schema<T> {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Type-level constraint, checked against the whole object.
    pub fn constraint(mut self, declaration: ConstraintDeclaration) -> Self {
        self.constraints.push(declaration);
        self
    }

    pub fn member(mut self, member: MemberSchema<T>) -> Self {
        self.members.push(member);
        self
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A declaration resolved against the registry: effective parameters,
/// message template and a ready validator.
#[derive(Clone)]
pub struct ConstraintMetadata {
    kind: String,
    params: Params,
    template: String,
    pub(crate) validator: Arc<dyn ConstraintValidator>,
}

impl ConstraintMetadata {
    fn compile(
        declaration: &ConstraintDeclaration,
        registry: &ConstraintRegistry,
        type_name: &'static str,
        member: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let kind = registry.lookup(declaration.kind()).ok_or_else(|| {
            ConfigError::UnknownConstraint {
                type_name,
                member: member.map(str::to_string),
                kind: declaration.kind().to_string(),
            }
        })?;
        if let Some((param, reason)) = declaration.rejected.first() {
            return Err(ConfigError::invalid_parameter(
                declaration.kind(),
                param,
                format!("value could not be serialized: {reason}"),
            ));
        }
        let (params, validator) = kind.instantiate(declaration.declared_params())?;
        let template = declaration
            .message_template()
            .unwrap_or_else(|| kind.default_message())
            .to_string();
        Ok(Self {
            kind: declaration.kind().to_string(),
            params,
            template,
            validator,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Effective parameters, defaults included.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn message_template(&self) -> &str {
        &self.template
    }
}

impl fmt::Debug for ConstraintMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintMetadata")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

/// Compiled metadata of one member.
pub struct MemberMetadata<T> {
    name: String,
    accessor: Accessor<T>,
    constraints: Vec<ConstraintMetadata>,
    element_constraints: Vec<ConstraintMetadata>,
    cascade: bool,
    cascade_elements: bool,
}

impl<T> MemberMetadata<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value of this member on `target`.
    pub fn read<'a>(&self, target: &'a T) -> Value<'a> {
        (self.accessor)(target)
    }

    pub fn constraints(&self) -> &[ConstraintMetadata] {
        &self.constraints
    }

    pub fn element_constraints(&self) -> &[ConstraintMetadata] {
        &self.element_constraints
    }

    pub fn is_cascaded(&self) -> bool {
        self.cascade
    }

    pub fn cascades_elements(&self) -> bool {
        self.cascade_elements
    }

    pub(crate) fn inspects_elements(&self) -> bool {
        self.cascade_elements || !self.element_constraints.is_empty()
    }
}

impl<T> fmt::Debug for MemberMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberMetadata")
            .field("name", &self.name)
            .field("constraints", &self.constraints)
            .field("element_constraints", &self.element_constraints)
            .field("cascade", &self.cascade)
            .field("cascade_elements", &self.cascade_elements)
            .finish()
    }
}

/// Compiled, immutable constraint metadata of a type.
///
/// Built at most once per engine and shared between threads.
pub struct TypeMetadata<T> {
    type_name: &'static str,
    constraints: Vec<ConstraintMetadata>,
    members: Vec<MemberMetadata<T>>,
}

impl<T: Constrained> TypeMetadata<T> {
    /// Compile `T`'s declarations against `registry`.
    pub fn build(registry: &ConstraintRegistry) -> Result<Self, ConfigError> {
        let type_name = std::any::type_name::<T>();
        let schema = T::declare(Schema::new());

        let compile_all = |declarations: &[ConstraintDeclaration], member: Option<&str>| {
            declarations
                .iter()
                .map(|d| ConstraintMetadata::compile(d, registry, type_name, member))
                .collect::<Result<Vec<_>, _>>()
        };

        let constraints = compile_all(&schema.constraints, None)?;
        let mut members = Vec::with_capacity(schema.members.len());
        for member in schema.members {
            members.push(MemberMetadata {
                constraints: compile_all(&member.constraints, Some(member.name.as_str()))?,
                element_constraints: compile_all(&member.element_constraints, Some(member.name.as_str()))?,
                name: member.name,
                accessor: member.accessor,
                cascade: member.cascade,
                cascade_elements: member.cascade_elements,
            });
        }

        Ok(Self {
            type_name,
            constraints,
            members,
        })
    }
}

impl<T> TypeMetadata<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type-level constraints.
    pub fn constraints(&self) -> &[ConstraintMetadata] {
        &self.constraints
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberMetadata<T>] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&MemberMetadata<T>> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Whether anything at all is declared on this type.
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
            || self
                .members
                .iter()
                .any(|m| !m.constraints.is_empty() || m.inspects_elements() || m.cascade)
    }
}

impl<T> fmt::Debug for TypeMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("constraints", &self.constraints)
            .field("members", &self.members)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AsValue;

    struct Person {
        name: String,
        tags: Vec<String>,
    }

    impl Constrained for Person {
        fn declare(schema: Schema<Self>) -> Schema<Self> {
            schema
                .member(
                    MemberSchema::new("name", |p: &Person| p.name.as_value())
                        .constraint(ConstraintDeclaration::new("not_blank"))
                        .constraint(
                            ConstraintDeclaration::new("size")
                                .param("max", 10)
                                .message("at most {max} characters"),
                        ),
                )
                .member(
                    MemberSchema::new("tags", |p: &Person| p.tags.as_value())
                        .element_constraint(ConstraintDeclaration::new("not_blank")),
                )
        }
    }

    struct Broken;

    impl Constrained for Broken {
        fn declare(schema: Schema<Self>) -> Schema<Self> {
            schema.member(
                MemberSchema::new("x", |_: &Broken| Value::Null)
                    .constraint(ConstraintDeclaration::new("no_such_kind")),
            )
        }
    }

    struct Unserializable;

    impl Constrained for Unserializable {
        fn declare(schema: Schema<Self>) -> Schema<Self> {
            // JSON object keys must be strings, so this map cannot serialize.
            let bound = std::collections::BTreeMap::from([((1u8, 2u8), 3u8)]);
            schema.member(
                MemberSchema::new("x", |_: &Unserializable| Value::Null)
                    .constraint(ConstraintDeclaration::new("size").param("max", bound)),
            )
        }
    }

    #[test]
    fn unserializable_param_is_not_dropped() {
        let declaration =
            ConstraintDeclaration::new("size").param("max", std::collections::BTreeMap::from([((1u8, 2u8), 3u8)]));
        assert!(!declaration.declared_params().contains("max"));

        let registry = ConstraintRegistry::with_builtins();
        let err = TypeMetadata::<Unserializable>::build(&registry).unwrap_err();
        match err {
            ConfigError::InvalidParameter { kind, param, .. } => {
                assert_eq!(kind, "size");
                assert_eq!(param, "max");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_resolves_params_and_messages() {
        let registry = ConstraintRegistry::with_builtins();
        let metadata = TypeMetadata::<Person>::build(&registry).unwrap();

        let name = metadata.member("name").unwrap();
        assert_eq!(name.constraints().len(), 2);
        assert_eq!(name.constraints()[0].message_template(), "must not be blank");
        let size = &name.constraints()[1];
        assert_eq!(size.message_template(), "at most {max} characters");
        assert_eq!(size.params().get_u64("min"), Some(0));
        assert_eq!(size.params().get_u64("max"), Some(10));

        let tags = metadata.member("tags").unwrap();
        assert!(tags.constraints().is_empty());
        assert_eq!(tags.element_constraints().len(), 1);
        assert!(metadata.is_constrained());
    }

    #[test]
    fn members_keep_declaration_order() {
        let registry = ConstraintRegistry::with_builtins();
        let metadata = TypeMetadata::<Person>::build(&registry).unwrap();
        let names: Vec<_> = metadata.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, ["name", "tags"]);
    }

    #[test]
    fn unknown_kind_is_reported_with_location() {
        let registry = ConstraintRegistry::with_builtins();
        let err = TypeMetadata::<Broken>::build(&registry).unwrap_err();
        match err {
            ConfigError::UnknownConstraint {
                type_name,
                member,
                kind,
            } => {
                assert!(type_name.ends_with("Broken"));
                assert_eq!(member.as_deref(), Some("x"));
                assert_eq!(kind, "no_such_kind");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accessor_reads_current_value() {
        let registry = ConstraintRegistry::with_builtins();
        let metadata = TypeMetadata::<Person>::build(&registry).unwrap();
        let person = Person {
            name: "Ada".into(),
            tags: vec![],
        };
        let value = metadata.member("name").unwrap().read(&person);
        assert_eq!(value.as_str(), Some("Ada"));
    }
}
