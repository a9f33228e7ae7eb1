use std::sync::Arc;

use permit_core::{Scope, Subject};

use crate::cache::{CacheKeys, QueryCache, QueryKind};
use crate::error::AuthResult;
use crate::registry::{Collaborators, TypeRegistry};
use crate::store::AssignmentStore;

/// Resolution engine over an assignment store and a query cache.
///
/// Holds no mutable state of its own; the store and the cache are the only
/// shared resources. Reads live in `resolver`, writes in `mutation`.
#[derive(Debug, Clone)]
pub struct Authorizer<S, C> {
    pub(crate) registry: Arc<TypeRegistry>,
    pub(crate) store: S,
    pub(crate) cache: C,
    pub(crate) keys: CacheKeys,
}

impl<S, C> Authorizer<S, C>
where
    S: AssignmentStore,
    C: QueryCache,
{
    pub fn new(registry: impl Into<Arc<TypeRegistry>>, store: S, cache: C) -> Self {
        Self {
            registry: registry.into(),
            store,
            cache,
            keys: CacheKeys::default(),
        }
    }

    /// Namespace every cache key with `namespace` instead of `permit`.
    pub fn with_cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.keys = CacheKeys::new(namespace);
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub(crate) fn collaborators(&self, subject: &Subject, scope: &Scope) -> AuthResult<Collaborators> {
        Ok(self.registry.resolve(&subject.subject_type, scope)?)
    }

    /// Clear the given query groups for one (subject, scope) pair.
    pub(crate) fn invalidate(
        &self,
        subject: &Subject,
        scope: &Scope,
        kinds: &[QueryKind],
    ) -> AuthResult<()> {
        for kind in kinds {
            let prefix = self.keys.group(subject, scope, *kind);
            let removed = self.cache.forget_group(&prefix)?;
            tracing::debug!(%subject, %scope, %kind, removed, "invalidated cache group");
        }
        Ok(())
    }
}
