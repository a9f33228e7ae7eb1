//! Enum/team compatibility checks.
//!
//! Run before any write and before typed membership queries; a mismatch leaves
//! storage and cache untouched.

use permit_core::{Scope, Subject};

use crate::error::{AuthError, AuthResult};
use crate::permissions::PermissionEnum;
use crate::registry::Collaborators;
use crate::roles::RoleEnum;

pub(crate) fn ensure_role_enum<R: RoleEnum>(
    collaborators: &Collaborators,
    subject: &Subject,
    scope: &Scope,
) -> AuthResult<()> {
    if collaborators.role_vocabulary.is::<R>() {
        return Ok(());
    }
    Err(AuthError::InvalidRole {
        enum_name: R::NAME,
        scope_type: scope_owner(subject, scope),
    })
}

pub(crate) fn ensure_permission_enum<P: PermissionEnum>(
    collaborators: &Collaborators,
    subject: &Subject,
    scope: &Scope,
) -> AuthResult<()> {
    if collaborators.permission_vocabulary.is::<P>() {
        return Ok(());
    }
    Err(AuthError::InvalidPermission {
        enum_name: P::NAME,
        scope_type: scope_owner(subject, scope),
    })
}

/// The type whose vocabulary governs the scope: the team type, or the subject
/// type for global assignments.
fn scope_owner(subject: &Subject, scope: &Scope) -> String {
    match scope.team_type() {
        Some(team_type) => format!("team type {team_type}"),
        None => format!("global scope of {}", subject.subject_type),
    }
}
