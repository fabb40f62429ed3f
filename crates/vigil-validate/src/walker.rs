//! Object graph traversal.
//!
//! A [`Walker`] holds all per-call state: the current path, the set of
//! visited objects and the violations found so far. It is created for one
//! validation call and never shared.

use crate::engine::EngineInner;
use crate::error::{Error, EvaluationFault};
use crate::interpolate::MessageContext;
use crate::metadata::{Constrained, ConstraintMetadata, MemberMetadata, TypeMetadata};
use crate::path::{PathSegment, PropertyPath};
use crate::validator::ConstraintContext;
use crate::value::Value;
use crate::violation::{Violation, ViolationSet};
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Object-safe view of a [`Constrained`] value, used for nested objects.
///
/// Implemented for every `Constrained` type; there is no reason to
/// implement it by hand.
pub trait Validatable {
    /// Hand this object to `walker` with its concrete type restored.
    #[doc(hidden)]
    fn accept(&self, walker: &mut Walker<'_>) -> Result<(), Error>;

    fn type_name(&self) -> &'static str;

    /// For type-level validators that need the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Constrained> Validatable for T {
    fn accept(&self, walker: &mut Walker<'_>) -> Result<(), Error> {
        walker.visit(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Per-call traversal state.
#[doc(hidden)]
pub struct Walker<'e> {
    engine: &'e EngineInner,
    root_type: &'static str,
    path: PropertyPath,
    visited: HashSet<(usize, TypeId)>,
    depth: usize,
    violations: Vec<Violation>,
    halted: bool,
}

impl<'e> Walker<'e> {
    pub(crate) fn new(engine: &'e EngineInner, root_type: &'static str) -> Self {
        Self {
            engine,
            root_type,
            path: PropertyPath::root(),
            visited: HashSet::new(),
            depth: 0,
            violations: Vec::new(),
            halted: false,
        }
    }

    pub(crate) fn finish(self) -> ViolationSet {
        ViolationSet::from(self.violations)
    }

    /// Validate `target` at the current path, unless it was already visited.
    pub fn visit<T: Constrained>(&mut self, target: &T) -> Result<(), Error> {
        if self.halted {
            return Ok(());
        }

        let identity = (target as *const T as usize, TypeId::of::<T>());
        if !self.visited.insert(identity) {
            trace_trace!(path = %self.path, type_name = std::any::type_name::<T>(), "already visited, pruned");
            return Ok(());
        }

        let limit = self.engine.config.max_depth;
        if self.depth > limit {
            trace_warn!(path = %self.path, limit, "cascade depth limit exceeded");
            return Err(Error::DepthExceeded {
                path: self.path.clone(),
                limit,
            });
        }

        let metadata = self.engine.metadata::<T>()?;
        self.depth += 1;
        let result = self.object(target, &metadata);
        self.depth -= 1;
        result
    }

    fn object<T: Constrained>(&mut self, target: &T, metadata: &TypeMetadata<T>) -> Result<(), Error> {
        let whole = Value::Object(target);
        self.check_all(metadata.constraints(), &whole)?;

        for member in metadata.members() {
            if self.halted {
                break;
            }
            let value = member.read(target);
            self.member(member, &value, true)?;
        }
        Ok(())
    }

    /// Check one member's value. Nested objects are only entered when
    /// `cascade` is set.
    pub(crate) fn member<T>(
        &mut self,
        member: &MemberMetadata<T>,
        value: &Value<'_>,
        cascade: bool,
    ) -> Result<(), Error> {
        self.path.push(PathSegment::field(member.name()));
        let result = self.member_at_path(member, value, cascade);
        self.path.pop();
        result
    }

    fn member_at_path<T>(
        &mut self,
        member: &MemberMetadata<T>,
        value: &Value<'_>,
        cascade: bool,
    ) -> Result<(), Error> {
        self.check_all(member.constraints(), value)?;

        if cascade && member.is_cascaded() {
            if let Value::Object(nested) = value {
                nested.accept(self)?;
            }
        }

        if !member.inspects_elements() {
            return Ok(());
        }
        let Some(elements) = value.elements() else {
            return Ok(());
        };
        for (segment, element) in elements {
            if self.halted {
                break;
            }
            self.path.push(segment);
            let result = self.element(member, element, cascade);
            self.path.pop();
            result?;
        }
        Ok(())
    }

    fn element<T>(
        &mut self,
        member: &MemberMetadata<T>,
        element: &Value<'_>,
        cascade: bool,
    ) -> Result<(), Error> {
        self.check_all(member.element_constraints(), element)?;
        if cascade && member.cascades_elements() {
            if let Value::Object(nested) = element {
                nested.accept(self)?;
            }
        }
        Ok(())
    }

    fn check_all(&mut self, constraints: &[ConstraintMetadata], value: &Value<'_>) -> Result<(), Error> {
        for constraint in constraints {
            if self.halted {
                break;
            }
            self.check(constraint, value)?;
        }
        Ok(())
    }

    fn check(&mut self, constraint: &ConstraintMetadata, value: &Value<'_>) -> Result<(), Error> {
        let ctx = ConstraintContext {
            kind: constraint.kind(),
            params: constraint.params(),
            path: &self.path,
            clock: self.engine.clock.as_ref(),
        };

        let verdict = catch_unwind(AssertUnwindSafe(|| constraint.validator.is_valid(value, &ctx)))
            .unwrap_or_else(|payload| Err(panic_fault(&*payload)));

        match verdict {
            Ok(true) => Ok(()),
            Ok(false) => {
                let violation = self.violation(constraint, value);
                trace_trace!(path = %violation.path, kind = %violation.kind, "constraint violated");
                self.violations.push(violation);
                if self.engine.config.fail_fast {
                    self.halted = true;
                }
                Ok(())
            }
            Err(fault) => {
                trace_warn!(path = %self.path, kind = constraint.kind(), error = %fault, "constraint failed to evaluate");
                Err(Error::Evaluation {
                    kind: constraint.kind().to_string(),
                    path: self.path.clone(),
                    fault,
                })
            }
        }
    }

    fn violation(&self, constraint: &ConstraintMetadata, value: &Value<'_>) -> Violation {
        let message = self.engine.interpolator.interpolate(
            constraint.message_template(),
            &MessageContext {
                kind: constraint.kind(),
                params: constraint.params(),
                path: &self.path,
                value,
            },
        );
        Violation {
            path: self.path.clone(),
            message,
            invalid_value: value.to_json(),
            kind: constraint.kind().to_string(),
            root_type: self.root_type,
            template: constraint.message_template().to_string(),
            params: constraint.params().clone(),
        }
    }
}

/// A validator that panicked counts as one that failed to evaluate.
fn panic_fault(payload: &(dyn Any + Send)) -> EvaluationFault {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    EvaluationFault::new(format!("validator panicked: {detail}"))
}
