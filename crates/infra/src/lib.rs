//! Infrastructure layer: in-memory store and cache backends, configuration.

use std::sync::Arc;

use permit_auth::{Authorizer, ResolutionError, TypeRegistryBuilder};

pub mod assignment_store;
pub mod config;
pub mod query_cache;


pub use assignment_store::InMemoryAssignmentStore;
pub use config::{ConfigError, PermitConfig};
pub use query_cache::InMemoryQueryCache;

/// Authorizer over the in-memory backends, with shared handles kept by callers.
pub type InMemoryAuthorizer = Authorizer<Arc<InMemoryAssignmentStore>, Arc<InMemoryQueryCache>>;

/// Wire an authorizer from configuration and a registry under construction.
pub fn in_memory_authorizer(
    config: &PermitConfig,
    registry: TypeRegistryBuilder,
) -> Result<InMemoryAuthorizer, ResolutionError> {
    let registry = registry.teams_enabled(config.teams_enabled).build()?;
    tracing::debug!(
        teams_enabled = config.teams_enabled,
        namespace = %config.cache_namespace,
        "building in-memory authorizer"
    );
    Ok(Authorizer::new(
        registry,
        InMemoryAssignmentStore::arc(),
        InMemoryQueryCache::arc(),
    )
    .with_cache_namespace(config.cache_namespace.clone()))
}
