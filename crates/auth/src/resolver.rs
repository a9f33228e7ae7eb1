//! Read side: roles, permissions and membership tests.
//!
//! Set queries and per-value membership tests are cached; direct and
//! role-implied permissions are recomputed from the store each time and only
//! reach the cache through the merged `permissions` set.

use std::collections::{BTreeSet, HashSet};

use permit_core::{Scope, Subject};

use crate::authorizer::Authorizer;
use crate::cache::{CachedAnswer, QueryCache, QueryKind};
use crate::error::{AuthError, AuthResult};
use crate::permissions::PermissionEnum;
use crate::roles::RoleEnum;
use crate::scope_filter::AssignmentFilter;
use crate::store::AssignmentStore;
use crate::validate::{ensure_permission_enum, ensure_role_enum};

impl<S, C> Authorizer<S, C>
where
    S: AssignmentStore,
    C: QueryCache,
{
    // ─────────────────────────────────────────────────────────────────────────
    // Value-level queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Role values held in scope, sorted and deduplicated.
    ///
    /// Stored values the scope's role enum cannot parse are dropped.
    pub fn role_values(&self, subject: &Subject, scope: &Scope) -> AuthResult<Vec<String>> {
        let group = self.keys.group(subject, scope, QueryKind::Roles);
        let key = self.keys.key(subject, scope, QueryKind::Roles, None);
        let answer = self.cache.get_or_compute(&key, &group, || {
            let collaborators = self.collaborators(subject, scope)?;
            let filter = AssignmentFilter::for_scope(subject.id, scope);
            let raw = self.store.values(&collaborators.role_table, &filter)?;
            let roles = parse_values(raw, |v| collaborators.role_vocabulary.canonical(v), subject, scope);
            Ok::<_, AuthError>(CachedAnswer::Values(roles))
        })?;
        Ok(answer.into_values(&key)?)
    }

    /// Directly assigned permission values in scope.
    pub fn direct_permission_values(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<Vec<String>> {
        let collaborators = self.collaborators(subject, scope)?;
        let filter = AssignmentFilter::for_scope(subject.id, scope);
        let raw = self.store.values(&collaborators.permission_table, &filter)?;
        Ok(parse_values(
            raw,
            |v| collaborators.permission_vocabulary.canonical(v),
            subject,
            scope,
        ))
    }

    /// Permission values implied by the roles held in scope.
    pub fn permission_values_through_roles(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<Vec<String>> {
        let collaborators = self.collaborators(subject, scope)?;
        let implied: BTreeSet<&'static str> = self
            .role_values(subject, scope)?
            .iter()
            .flat_map(|role| collaborators.role_vocabulary.implied_permissions(role))
            .collect();
        Ok(implied.into_iter().map(str::to_string).collect())
    }

    /// Effective permission values: direct ∪ role-implied, deduplicated.
    pub fn permission_values(&self, subject: &Subject, scope: &Scope) -> AuthResult<Vec<String>> {
        let group = self.keys.group(subject, scope, QueryKind::Permissions);
        let key = self.keys.key(subject, scope, QueryKind::Permissions, None);
        let answer = self.cache.get_or_compute(&key, &group, || {
            let mut effective: BTreeSet<String> =
                self.direct_permission_values(subject, scope)?.into_iter().collect();
            effective.extend(self.permission_values_through_roles(subject, scope)?);
            Ok::<_, AuthError>(CachedAnswer::Values(effective.into_iter().collect()))
        })?;
        Ok(answer.into_values(&key)?)
    }

    pub fn has_role_value(&self, subject: &Subject, role: &str, scope: &Scope) -> AuthResult<bool> {
        let group = self.keys.group(subject, scope, QueryKind::HasRole);
        let key = self.keys.key(subject, scope, QueryKind::HasRole, Some(role));
        let answer = self.cache.get_or_compute(&key, &group, || {
            let held = self.role_values(subject, scope)?;
            Ok::<_, AuthError>(CachedAnswer::Flag(held.iter().any(|r| r == role)))
        })?;
        Ok(answer.into_flag(&key)?)
    }

    pub fn has_permission_value(
        &self,
        subject: &Subject,
        permission: &str,
        scope: &Scope,
    ) -> AuthResult<bool> {
        let group = self.keys.group(subject, scope, QueryKind::HasPermission);
        let key = self.keys.key(subject, scope, QueryKind::HasPermission, Some(permission));
        let answer = self.cache.get_or_compute(&key, &group, || {
            let held = self.permission_values(subject, scope)?;
            Ok::<_, AuthError>(CachedAnswer::Flag(held.iter().any(|p| p == permission)))
        })?;
        Ok(answer.into_flag(&key)?)
    }

    /// True if any listed role is held. An empty list asks whether the subject
    /// holds any role at all in scope.
    pub fn has_any_role_values<V: AsRef<str>>(
        &self,
        subject: &Subject,
        roles: &[V],
        scope: &Scope,
    ) -> AuthResult<bool> {
        if roles.is_empty() {
            return Ok(!self.role_values(subject, scope)?.is_empty());
        }
        for role in roles {
            if self.has_role_value(subject, role.as_ref(), scope)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True if every listed role is held. An empty list asks whether the subject
    /// holds any role at all in scope.
    pub fn has_all_role_values<V: AsRef<str>>(
        &self,
        subject: &Subject,
        roles: &[V],
        scope: &Scope,
    ) -> AuthResult<bool> {
        if roles.is_empty() {
            return Ok(!self.role_values(subject, scope)?.is_empty());
        }
        for role in roles {
            if !self.has_role_value(subject, role.as_ref(), scope)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn has_any_permission_values<V: AsRef<str>>(
        &self,
        subject: &Subject,
        permissions: &[V],
        scope: &Scope,
    ) -> AuthResult<bool> {
        if permissions.is_empty() {
            return Ok(!self.permission_values(subject, scope)?.is_empty());
        }
        for permission in permissions {
            if self.has_permission_value(subject, permission.as_ref(), scope)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn has_all_permission_values<V: AsRef<str>>(
        &self,
        subject: &Subject,
        permissions: &[V],
        scope: &Scope,
    ) -> AuthResult<bool> {
        if permissions.is_empty() {
            return Ok(!self.permission_values(subject, scope)?.is_empty());
        }
        for permission in permissions {
            if !self.has_permission_value(subject, permission.as_ref(), scope)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed queries
    //
    // The enum type must be the one registered for the scope; otherwise the
    // query fails with `InvalidRole`/`InvalidPermission`.
    // ─────────────────────────────────────────────────────────────────────────

    pub fn roles<R: RoleEnum>(&self, subject: &Subject, scope: &Scope) -> AuthResult<HashSet<R>> {
        self.check_role_enum::<R>(subject, scope)?;
        Ok(typed(self.role_values(subject, scope)?, R::from_value))
    }

    pub fn direct_permissions<P: PermissionEnum>(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<HashSet<P>> {
        self.check_permission_enum::<P>(subject, scope)?;
        Ok(typed(self.direct_permission_values(subject, scope)?, P::from_value))
    }

    pub fn permissions_through_roles<P: PermissionEnum>(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<HashSet<P>> {
        self.check_permission_enum::<P>(subject, scope)?;
        Ok(typed(
            self.permission_values_through_roles(subject, scope)?,
            P::from_value,
        ))
    }

    pub fn permissions<P: PermissionEnum>(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<HashSet<P>> {
        self.check_permission_enum::<P>(subject, scope)?;
        Ok(typed(self.permission_values(subject, scope)?, P::from_value))
    }

    pub fn has_role<R: RoleEnum>(&self, subject: &Subject, role: R, scope: &Scope) -> AuthResult<bool> {
        self.check_role_enum::<R>(subject, scope)?;
        self.has_role_value(subject, role.as_value(), scope)
    }

    pub fn has_any_role<R: RoleEnum>(
        &self,
        subject: &Subject,
        roles: &[R],
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.check_role_enum::<R>(subject, scope)?;
        self.has_any_role_values(subject, &as_values(roles, R::as_value), scope)
    }

    pub fn has_all_roles<R: RoleEnum>(
        &self,
        subject: &Subject,
        roles: &[R],
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.check_role_enum::<R>(subject, scope)?;
        self.has_all_role_values(subject, &as_values(roles, R::as_value), scope)
    }

    pub fn has_permission<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permission: P,
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.check_permission_enum::<P>(subject, scope)?;
        self.has_permission_value(subject, permission.as_value(), scope)
    }

    /// Alias of [`has_permission`](Self::has_permission).
    pub fn is_able_to<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permission: P,
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.has_permission(subject, permission, scope)
    }

    pub fn has_any_permission<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permissions: &[P],
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.check_permission_enum::<P>(subject, scope)?;
        self.has_any_permission_values(subject, &as_values(permissions, P::as_value), scope)
    }

    pub fn has_all_permissions<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permissions: &[P],
        scope: &Scope,
    ) -> AuthResult<bool> {
        self.check_permission_enum::<P>(subject, scope)?;
        self.has_all_permission_values(subject, &as_values(permissions, P::as_value), scope)
    }

    pub(crate) fn check_role_enum<R: RoleEnum>(&self, subject: &Subject, scope: &Scope) -> AuthResult<()> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_role_enum::<R>(&collaborators, subject, scope)
    }

    pub(crate) fn check_permission_enum<P: PermissionEnum>(
        &self,
        subject: &Subject,
        scope: &Scope,
    ) -> AuthResult<()> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_permission_enum::<P>(&collaborators, subject, scope)
    }
}

/// Canonicalize stored values, dropping (and logging) the ones the vocabulary
/// no longer knows.
fn parse_values<F>(raw: Vec<String>, canonical: F, subject: &Subject, scope: &Scope) -> Vec<String>
where
    F: Fn(&str) -> Option<&'static str>,
{
    let mut parsed = BTreeSet::new();
    for value in raw {
        match canonical(&value) {
            Some(known) => {
                parsed.insert(known.to_string());
            }
            None => {
                tracing::warn!(%subject, %scope, value = %value, "dropping unknown stored value");
            }
        }
    }
    parsed.into_iter().collect()
}

fn typed<T, F>(values: Vec<String>, parse: F) -> HashSet<T>
where
    T: Eq + core::hash::Hash,
    F: Fn(&str) -> Option<T>,
{
    values.iter().filter_map(|v| parse(v)).collect()
}

fn as_values<T>(items: &[T], value: fn(&T) -> &'static str) -> Vec<&'static str> {
    items.iter().map(value).collect()
}
