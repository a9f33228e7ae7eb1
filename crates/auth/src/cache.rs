//! Query cache contract and key scheme.
//!
//! Entries never expire on their own. Correctness depends on the mutation API
//! clearing whole groups for a (subject, scope) pair, so a backend must support
//! prefix deletion, not just single keys.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use permit_core::{Scope, Subject};

/// A cached resolver output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum CachedAnswer {
    Flag(bool),
    Values(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache entry '{0}' holds an answer of the wrong shape")]
    UnexpectedShape(String),
}

impl CachedAnswer {
    pub fn into_flag(self, key: &str) -> Result<bool, CacheError> {
        match self {
            CachedAnswer::Flag(flag) => Ok(flag),
            CachedAnswer::Values(_) => Err(CacheError::UnexpectedShape(key.to_string())),
        }
    }

    pub fn into_values(self, key: &str) -> Result<Vec<String>, CacheError> {
        match self {
            CachedAnswer::Values(values) => Ok(values),
            CachedAnswer::Flag(_) => Err(CacheError::UnexpectedShape(key.to_string())),
        }
    }
}

/// Cache client injected into the authorizer.
///
/// Every `forget_group(group)` also advances that group's generation. Writers
/// that computed an answer from rows read before the clear use
/// [`put_if_generation`](QueryCache::put_if_generation) so the old answer is
/// dropped instead of stored.
pub trait QueryCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CacheError>;

    /// Store without expiry.
    fn put(&self, key: &str, answer: CachedAnswer) -> Result<(), CacheError>;

    /// Current generation of `group`; 0 until the group is first cleared.
    fn generation(&self, group: &str) -> Result<u64, CacheError>;

    /// Store `answer` only while `group` is still at `generation`. The check and
    /// the write must be atomic with respect to `forget_group`.
    fn put_if_generation(
        &self,
        key: &str,
        answer: CachedAnswer,
        group: &str,
        generation: u64,
    ) -> Result<bool, CacheError>;

    /// Remove a single key; returns whether it was present.
    fn forget(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every key starting with `prefix` and advance the generation of
    /// `prefix`; returns how many keys were removed.
    fn forget_group(&self, prefix: &str) -> Result<usize, CacheError>;

    /// Return the cached answer, or compute, store and return it.
    ///
    /// `key` must start with `group`. If the group is cleared while `producer`
    /// runs, the answer is returned but not stored.
    fn get_or_compute<F, E>(&self, key: &str, group: &str, producer: F) -> Result<CachedAnswer, E>
    where
        Self: Sized,
        F: FnOnce() -> Result<CachedAnswer, E>,
        E: From<CacheError>,
    {
        if let Some(hit) = self.get(key)? {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }

        tracing::debug!(key, "cache miss");
        let generation = self.generation(group)?;
        let answer = producer()?;
        if !self.put_if_generation(key, answer.clone(), group, generation)? {
            tracing::debug!(key, group, "group cleared during compute; answer not stored");
        }
        Ok(answer)
    }
}

impl<C> QueryCache for Arc<C>
where
    C: QueryCache + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<CachedAnswer>, CacheError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, answer: CachedAnswer) -> Result<(), CacheError> {
        (**self).put(key, answer)
    }

    fn generation(&self, group: &str) -> Result<u64, CacheError> {
        (**self).generation(group)
    }

    fn put_if_generation(
        &self,
        key: &str,
        answer: CachedAnswer,
        group: &str,
        generation: u64,
    ) -> Result<bool, CacheError> {
        (**self).put_if_generation(key, answer, group, generation)
    }

    fn forget(&self, key: &str) -> Result<bool, CacheError> {
        (**self).forget(key)
    }

    fn forget_group(&self, prefix: &str) -> Result<usize, CacheError> {
        (**self).forget_group(prefix)
    }
}

/// Kind of cached query; each kind is one invalidation group per (subject, scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Roles,
    HasRole,
    Permissions,
    HasPermission,
}

impl QueryKind {
    /// Groups cleared when a role assignment changes. Roles imply permissions,
    /// so permission answers go too.
    pub const ROLE_MUTATION: &'static [QueryKind] = &[
        QueryKind::Roles,
        QueryKind::HasRole,
        QueryKind::Permissions,
        QueryKind::HasPermission,
    ];

    /// Groups cleared when a direct permission assignment changes.
    pub const PERMISSION_MUTATION: &'static [QueryKind] =
        &[QueryKind::Permissions, QueryKind::HasPermission];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryKind::Roles => "roles",
            QueryKind::HasRole => "has_role",
            QueryKind::Permissions => "permissions",
            QueryKind::HasPermission => "has_permission",
        }
    }
}

impl core::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic cache key builder.
///
/// Layout: `{namespace}:{subject_type}:{subject_id}:{scope_type}:{scope_id}:{kind}:{discriminator}`.
/// A group prefix is the key with an empty discriminator, so clearing it also
/// clears every per-value entry of that kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    namespace: String,
}

impl Default for CacheKeys {
    fn default() -> Self {
        Self::new("permit")
    }
}

impl CacheKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn group(&self, subject: &Subject, scope: &Scope, kind: QueryKind) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:",
            self.namespace,
            subject.subject_type,
            subject.id,
            scope.type_name(),
            scope.id_segment(),
            kind
        )
    }

    pub fn key(
        &self,
        subject: &Subject,
        scope: &Scope,
        kind: QueryKind,
        discriminator: Option<&str>,
    ) -> String {
        let mut key = self.group(subject, scope, kind);
        if let Some(value) = discriminator {
            key.push_str(value);
        }
        key
    }
}
