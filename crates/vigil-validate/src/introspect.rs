//! Per-type metadata cache.

use crate::error::ConfigError;
use crate::metadata::{Constrained, TypeMetadata};
use crate::registry::ConstraintRegistry;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Erased = Arc<dyn Any + Send + Sync>;

/// Memoizes [`TypeMetadata`] per type for the lifetime of an engine.
///
/// Concurrent first requests for the same type may each build metadata;
/// the first one stored wins and every caller gets that instance. Failed
/// builds are not cached, so the error is reported on every use.
#[derive(Default)]
pub(crate) struct Introspector {
    cache: DashMap<TypeId, Erased>,
}

impl Introspector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn metadata_for<T: Constrained>(
        &self,
        registry: &ConstraintRegistry,
    ) -> Result<Arc<TypeMetadata<T>>, ConfigError> {
        let id = TypeId::of::<T>();

        if let Some(cached) = self.cache.get(&id) {
            if let Ok(metadata) = Arc::clone(cached.value()).downcast::<TypeMetadata<T>>() {
                return Ok(metadata);
            }
        }

        // Built outside any shard lock: cascaded types resolve lazily and
        // never re-enter here while building.
        let built = match TypeMetadata::<T>::build(registry) {
            Ok(metadata) => Arc::new(metadata),
            Err(err) => {
                trace_warn!(type_name = std::any::type_name::<T>(), error = %err, "constraint metadata rejected");
                return Err(err);
            }
        };
        trace_debug!(
            type_name = built.type_name(),
            members = built.members().len(),
            "constraint metadata built"
        );

        let stored = Arc::clone(
            self.cache
                .entry(id)
                .or_insert_with(|| Arc::clone(&built) as Erased)
                .value(),
        );
        Ok(stored.downcast::<TypeMetadata<T>>().unwrap_or(built))
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }
}
