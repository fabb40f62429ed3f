//! The long-lived validation engine.

use crate::config::EngineConfig;
use crate::error::{ConfigError, Error};
use crate::interpolate::{MessageInterpolator, TemplateInterpolator};
use crate::introspect::Introspector;
use crate::metadata::{Constrained, TypeMetadata};
use crate::registry::{ConstraintKind, ConstraintRegistry};
use crate::validator::{Clock, SystemClock};
use crate::value::AsValue;
use crate::violation::{Rejection, ViolationSet};
use crate::walker::Walker;
use std::fmt;
use std::sync::Arc;

pub(crate) struct EngineInner {
    pub(crate) registry: ConstraintRegistry,
    pub(crate) introspector: Introspector,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) interpolator: Arc<dyn MessageInterpolator>,
    pub(crate) config: EngineConfig,
}

impl EngineInner {
    pub(crate) fn metadata<T: Constrained>(&self) -> Result<Arc<TypeMetadata<T>>, ConfigError> {
        self.introspector.metadata_for::<T>(&self.registry)
    }
}

/// Validates object graphs against their declared constraints.
///
/// Build one engine at startup and share it: clones are cheap and every
/// method takes `&self`, so concurrent calls from many threads are fine.
/// Metadata of each validated type is built on first use and cached.
///
/// ## Example
///
/// ```rust
/// use vigil_validate::prelude::*;
///
/// #[derive(Constrained)]
/// struct SignUp {
///     #[validate(not_blank, email)]
///     email: String,
///     #[validate(size(min = 8, max = 64))]
///     password: String,
/// }
///
/// let engine = Engine::new();
/// let violations = engine
///     .validate(&SignUp { email: "nope".into(), password: "hunter2".into() })
///     .unwrap();
///
/// assert_eq!(
///     violations.messages(),
///     ["must be a well-formed email address", "size must be between 8 and 64"]
/// );
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// An engine with the built-in catalog and default settings.
    pub fn new() -> Self {
        Self::from_parts(
            ConstraintRegistry::with_builtins(),
            Arc::new(SystemClock),
            Arc::new(TemplateInterpolator),
            EngineConfig::default(),
        )
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    fn from_parts(
        registry: ConstraintRegistry,
        clock: Arc<dyn Clock>,
        interpolator: Arc<dyn MessageInterpolator>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                registry,
                introspector: Introspector::new(),
                clock,
                interpolator,
                config,
            }),
        }
    }

    /// Validate `root` and everything reachable through cascaded members.
    ///
    /// Returns every violation found; an empty set means valid. `Err` is
    /// reserved for engine faults: bad metadata, a validator that could
    /// not evaluate, or a graph deeper than `max_depth`.
    pub fn validate<T: Constrained>(&self, root: &T) -> Result<ViolationSet, Error> {
        let mut walker = Walker::new(&self.inner, std::any::type_name::<T>());
        walker.visit(root)?;
        let violations = walker.finish();
        trace_debug!(
            root_type = std::any::type_name::<T>(),
            violations = violations.len(),
            "validation finished"
        );
        Ok(violations)
    }

    /// Validate a root that may be absent. `None` is valid.
    pub fn validate_optional<T: Constrained>(&self, root: Option<&T>) -> Result<ViolationSet, Error> {
        match root {
            Some(root) => self.validate(root),
            None => Ok(ViolationSet::new()),
        }
    }

    /// Check one member of `root` without cascading into it.
    pub fn validate_property<T: Constrained>(
        &self,
        root: &T,
        member: &str,
    ) -> Result<ViolationSet, Error> {
        let metadata = self.inner.metadata::<T>()?;
        let member = find_member(&metadata, member)?;
        let mut walker = Walker::new(&self.inner, metadata.type_name());
        walker.member(member, &member.read(root), false)?;
        Ok(walker.finish())
    }

    /// Check whether `value` would satisfy the constraints declared on
    /// `T`'s `member`, without needing an instance of `T`.
    pub fn validate_value<T: Constrained>(
        &self,
        member: &str,
        value: &dyn AsValue,
    ) -> Result<ViolationSet, Error> {
        let metadata = self.inner.metadata::<T>()?;
        let member = find_member(&metadata, member)?;
        let mut walker = Walker::new(&self.inner, metadata.type_name());
        walker.member(member, &value.as_value(), false)?;
        Ok(walker.finish())
    }

    /// Pass `value` through if it is valid.
    pub fn validated<T: Constrained>(&self, value: T) -> Result<T, Rejection> {
        self.validate(&value)?.into_result()?;
        Ok(value)
    }

    /// The compiled metadata of `T`, building it if needed.
    pub fn describe<T: Constrained>(&self) -> Result<Arc<TypeMetadata<T>>, ConfigError> {
        self.inner.metadata::<T>()
    }

    pub fn registry(&self) -> &ConstraintRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Number of types whose metadata is cached.
    pub fn cached_types(&self) -> usize {
        self.inner.introspector.len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("kinds", &self.inner.registry.len())
            .field("cached_types", &self.inner.introspector.len())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

fn find_member<'m, T: Constrained>(
    metadata: &'m TypeMetadata<T>,
    name: &str,
) -> Result<&'m crate::metadata::MemberMetadata<T>, ConfigError> {
    metadata
        .member(name)
        .ok_or_else(|| ConfigError::UnknownMember {
            type_name: metadata.type_name(),
            member: name.to_string(),
        })
}

type Preload = fn(&Engine) -> Result<(), ConfigError>;

/// Configures an [`Engine`].
///
/// Built-in kinds are registered up front; custom kinds are added with
/// [`register`](Self::register). Nothing can be registered after
/// [`build`](Self::build).
pub struct EngineBuilder {
    kinds: Vec<ConstraintKind>,
    clock: Arc<dyn Clock>,
    interpolator: Arc<dyn MessageInterpolator>,
    config: EngineConfig,
    preload: Vec<Preload>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            kinds: Vec::new(),
            clock: Arc::new(SystemClock),
            interpolator: Arc::new(TemplateInterpolator),
            config: EngineConfig::default(),
            preload: Vec::new(),
        }
    }

    /// Add a custom constraint kind.
    pub fn register(mut self, kind: ConstraintKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Clock used by temporal constraints.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn interpolator(mut self, interpolator: impl MessageInterpolator + 'static) -> Self {
        self.interpolator = Arc::new(interpolator);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build `T`'s metadata during [`build`](Self::build), so that
    /// misdeclared constraints fail at startup instead of on first use.
    pub fn preload<T: Constrained>(mut self) -> Self {
        self.preload.push(|engine| engine.describe::<T>().map(|_| ()));
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        let mut registry = ConstraintRegistry::with_builtins();
        for kind in self.kinds {
            registry.register(kind)?;
        }

        let engine = Engine::from_parts(registry, self.clock, self.interpolator, self.config);
        for preload in &self.preload {
            preload(&engine)?;
        }

        trace_debug!(
            kinds = engine.registry().len(),
            preloaded = self.preload.len(),
            "validation engine built"
        );
        Ok(engine)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("kinds", &self.kinds)
            .field("config", &self.config)
            .field("preload", &self.preload.len())
            .finish_non_exhaustive()
    }
}
