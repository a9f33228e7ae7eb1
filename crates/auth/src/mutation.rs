//! Write side: assign, remove, sync and purge.
//!
//! Every mutation validates first, writes to the store, then clears the
//! affected cache groups. Clearing a group advances its generation, so a
//! concurrent read that loaded rows before the write cannot store its answer
//! once the clear has happened.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};

use permit_core::{Scope, Subject, SubjectType};

use crate::authorizer::Authorizer;
use crate::cache::{QueryCache, QueryKind};
use crate::error::AuthResult;
use crate::permissions::PermissionEnum;
use crate::registry::AssignmentTable;
use crate::roles::RoleEnum;
use crate::scope_filter::AssignmentFilter;
use crate::store::{Assignment, AssignmentStore, NewAssignment};
use crate::validate::{ensure_permission_enum, ensure_role_enum};

impl<S, C> Authorizer<S, C>
where
    S: AssignmentStore,
    C: QueryCache,
{
    /// Grant a role in scope. Idempotent: an existing assignment is returned
    /// unchanged.
    pub fn assign_role<R: RoleEnum>(
        &self,
        subject: &Subject,
        role: R,
        scope: &Scope,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Assignment> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_role_enum::<R>(&collaborators, subject, scope)?;

        let row = self
            .store
            .find_or_create(&collaborators.role_table, new_row(subject, role.as_value(), scope, expires_at))?;
        self.invalidate(subject, scope, QueryKind::ROLE_MUTATION)?;

        tracing::info!(%subject, %scope, role = role.as_value(), "role assigned");
        Ok(row)
    }

    /// Alias of [`assign_role`](Self::assign_role).
    pub fn add_role<R: RoleEnum>(
        &self,
        subject: &Subject,
        role: R,
        scope: &Scope,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Assignment> {
        self.assign_role(subject, role, scope, expires_at)
    }

    /// Revoke a role in scope; returns the number of rows deleted (0 or 1).
    pub fn remove_role<R: RoleEnum>(&self, subject: &Subject, role: R, scope: &Scope) -> AuthResult<usize> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_role_enum::<R>(&collaborators, subject, scope)?;

        let filter = AssignmentFilter::for_scope(subject.id, scope).with_value(role.as_value());
        let removed = self.store.delete(&collaborators.role_table, &filter)?;
        self.invalidate(subject, scope, QueryKind::ROLE_MUTATION)?;

        tracing::info!(%subject, %scope, role = role.as_value(), removed, "role removed");
        Ok(removed)
    }

    /// Replace every role held in scope with exactly `roles`.
    pub fn sync_roles<R: RoleEnum>(
        &self,
        subject: &Subject,
        roles: &[R],
        scope: &Scope,
    ) -> AuthResult<Vec<Assignment>> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_role_enum::<R>(&collaborators, subject, scope)?;

        let values = distinct(roles.iter().map(|r| r.as_value()));
        let rows = self.replace(&collaborators.role_table, subject, &values, scope)?;
        self.invalidate(subject, scope, QueryKind::ROLE_MUTATION)?;

        tracing::info!(%subject, %scope, roles = ?values, "roles synced");
        Ok(rows)
    }

    /// Grant a permission directly in scope. Idempotent.
    pub fn assign_permission<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permission: P,
        scope: &Scope,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Assignment> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_permission_enum::<P>(&collaborators, subject, scope)?;

        let row = self.store.find_or_create(
            &collaborators.permission_table,
            new_row(subject, permission.as_value(), scope, expires_at),
        )?;
        self.invalidate(subject, scope, QueryKind::PERMISSION_MUTATION)?;

        tracing::info!(%subject, %scope, permission = permission.as_value(), "permission assigned");
        Ok(row)
    }

    /// Alias of [`assign_permission`](Self::assign_permission).
    pub fn add_permission<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permission: P,
        scope: &Scope,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<Assignment> {
        self.assign_permission(subject, permission, scope, expires_at)
    }

    pub fn remove_permission<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permission: P,
        scope: &Scope,
    ) -> AuthResult<usize> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_permission_enum::<P>(&collaborators, subject, scope)?;

        let filter = AssignmentFilter::for_scope(subject.id, scope).with_value(permission.as_value());
        let removed = self.store.delete(&collaborators.permission_table, &filter)?;
        self.invalidate(subject, scope, QueryKind::PERMISSION_MUTATION)?;

        tracing::info!(%subject, %scope, permission = permission.as_value(), removed, "permission removed");
        Ok(removed)
    }

    /// Replace every direct permission held in scope with exactly `permissions`.
    pub fn sync_permissions<P: PermissionEnum>(
        &self,
        subject: &Subject,
        permissions: &[P],
        scope: &Scope,
    ) -> AuthResult<Vec<Assignment>> {
        let collaborators = self.collaborators(subject, scope)?;
        ensure_permission_enum::<P>(&collaborators, subject, scope)?;

        let values = distinct(permissions.iter().map(|p| p.as_value()));
        let rows = self.replace(&collaborators.permission_table, subject, &values, scope)?;
        self.invalidate(subject, scope, QueryKind::PERMISSION_MUTATION)?;

        tracing::info!(%subject, %scope, permissions = ?values, "permissions synced");
        Ok(rows)
    }

    /// Delete every assignment of `subject_type` that expired at or before `now`
    /// and clear the cache groups of each affected (subject, scope).
    ///
    /// Reads do not filter by expiry; this is how expired grants stop counting.
    pub fn purge_expired(&self, subject_type: &SubjectType, now: DateTime<Utc>) -> AuthResult<usize> {
        let (role_table, permission_table) = self.registry.tables(subject_type)?;

        let expired_roles = self.store.delete_expired(&role_table, now)?;
        self.invalidate_owners(subject_type, &expired_roles, QueryKind::ROLE_MUTATION)?;

        let expired_permissions = self.store.delete_expired(&permission_table, now)?;
        self.invalidate_owners(subject_type, &expired_permissions, QueryKind::PERMISSION_MUTATION)?;

        let purged = expired_roles.len() + expired_permissions.len();
        if purged > 0 {
            tracing::info!(%subject_type, purged, "expired assignments purged");
        }
        Ok(purged)
    }

    fn replace(
        &self,
        table: &AssignmentTable,
        subject: &Subject,
        values: &[&'static str],
        scope: &Scope,
    ) -> AuthResult<Vec<Assignment>> {
        let filter = AssignmentFilter::for_scope(subject.id, scope);
        let rows = values
            .iter()
            .map(|value| new_row(subject, value, scope, None))
            .collect();
        Ok(self.store.replace(table, &filter, rows)?)
    }

    fn invalidate_owners(
        &self,
        subject_type: &SubjectType,
        rows: &[Assignment],
        kinds: &[QueryKind],
    ) -> AuthResult<()> {
        let affected: HashSet<(Subject, Scope)> = rows
            .iter()
            .map(|row| (Subject::new(subject_type.clone(), row.owner_id), row.scope.clone()))
            .collect();
        for (subject, scope) in &affected {
            self.invalidate(subject, scope, kinds)?;
        }
        Ok(())
    }
}

fn new_row(
    subject: &Subject,
    value: &str,
    scope: &Scope,
    expires_at: Option<DateTime<Utc>>,
) -> NewAssignment {
    NewAssignment {
        owner_id: subject.id,
        value: value.to_string(),
        scope: scope.clone(),
        expires_at,
    }
}

/// Deduplicate while keeping first-seen order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
