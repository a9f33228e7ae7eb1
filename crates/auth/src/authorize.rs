//! Request guard and decision explanations.
//!
//! Framework-free: a route layer maps [`AuthzError`] to its own rejection.

use serde::Serialize;
use thiserror::Error;

use permit_core::{Scope, Subject};

use crate::authorizer::Authorizer;
use crate::cache::QueryCache;
use crate::error::{AuthError, AuthResult};
use crate::store::AssignmentStore;

/// What a guarded operation requires of the caller, by role/permission value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "values")]
pub enum Requirement {
    AnyRole(Vec<String>),
    AllRoles(Vec<String>),
    AnyPermission(Vec<String>),
    AllPermissions(Vec<String>),
}

impl Requirement {
    /// Split a `|`-separated list (e.g. `"editor|admin"`), ignoring blanks.
    pub fn parse_list(list: &str) -> Vec<String> {
        list.split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn denial(&self) -> &'static str {
        match self {
            Requirement::AnyRole(_) | Requirement::AllRoles(_) => {
                "you do not have the required role(s) to access this resource"
            }
            Requirement::AnyPermission(_) | Requirement::AllPermissions(_) => {
                "you do not have the required permission(s) to access this resource"
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Failed(#[from] AuthError),
}

/// Check a requirement for an (optionally anonymous) caller.
///
/// Anonymous callers are rejected without touching the store.
pub fn authorize<S, C>(
    authorizer: &Authorizer<S, C>,
    subject: Option<&Subject>,
    requirement: &Requirement,
    scope: &Scope,
) -> Result<(), AuthzError>
where
    S: AssignmentStore,
    C: QueryCache,
{
    let Some(subject) = subject else {
        return Err(AuthzError::Unauthenticated);
    };

    let allowed = match requirement {
        Requirement::AnyRole(roles) => authorizer.has_any_role_values(subject, roles, scope)?,
        Requirement::AllRoles(roles) => authorizer.has_all_role_values(subject, roles, scope)?,
        Requirement::AnyPermission(perms) => {
            authorizer.has_any_permission_values(subject, perms, scope)?
        }
        Requirement::AllPermissions(perms) => {
            authorizer.has_all_permission_values(subject, perms, scope)?
        }
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(%subject, %scope, ?requirement, "request denied");
        Err(AuthzError::Forbidden(requirement.denial().to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a permission decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: String,
    pub granted: bool,
    pub reason: String,
    pub scope: Scope,
    pub roles: Vec<String>,
    pub direct_permissions: Vec<String>,
    pub effective_permissions: Vec<String>,
    /// Held roles that imply the required permission.
    pub granting_roles: Vec<String>,
    pub suggestions: Vec<String>,
}

impl<S, C> Authorizer<S, C>
where
    S: AssignmentStore,
    C: QueryCache,
{
    /// Explain why `permission` is or is not held in scope.
    pub fn explain_permission(
        &self,
        subject: &Subject,
        permission: &str,
        scope: &Scope,
    ) -> AuthResult<AuthorizationExplanation> {
        let collaborators = self.collaborators(subject, scope)?;
        let roles = self.role_values(subject, scope)?;
        let direct = self.direct_permission_values(subject, scope)?;
        let effective = self.permission_values(subject, scope)?;

        let granting_roles: Vec<String> = roles
            .iter()
            .filter(|role| {
                collaborators
                    .role_vocabulary
                    .implied_permissions(role)
                    .iter()
                    .any(|p| *p == permission)
            })
            .cloned()
            .collect();
        let is_direct = direct.iter().any(|p| p == permission);
        let granted = effective.iter().any(|p| p == permission);

        let reason = if is_direct {
            format!("'{permission}' is assigned directly in {scope}")
        } else if granted {
            format!("'{permission}' is implied by role(s) {granting_roles:?} in {scope}")
        } else {
            format!("'{permission}' is not held in {scope}")
        };

        let mut suggestions = Vec::new();
        if !granted {
            if collaborators.permission_vocabulary.canonical(permission).is_none() {
                suggestions.push(format!(
                    "'{permission}' is not a value of {}",
                    collaborators.permission_vocabulary.name()
                ));
            } else {
                let candidates: Vec<&'static str> = collaborators
                    .role_vocabulary
                    .values()
                    .into_iter()
                    .filter(|role| {
                        collaborators
                            .role_vocabulary
                            .implied_permissions(role)
                            .iter()
                            .any(|p| *p == permission)
                    })
                    .collect();
                if !candidates.is_empty() {
                    suggestions.push(format!("Assign one of the roles {candidates:?}"));
                }
                suggestions.push(format!("Assign '{permission}' directly"));
            }
        }

        Ok(AuthorizationExplanation {
            required_permission: permission.to_string(),
            granted,
            reason,
            scope: scope.clone(),
            roles,
            direct_permissions: direct,
            effective_permissions: effective,
            granting_roles,
            suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_splits_on_pipes() {
        assert_eq!(
            Requirement::parse_list(" editor | admin||"),
            vec!["editor".to_string(), "admin".to_string()]
        );
        assert!(Requirement::parse_list("").is_empty());
    }

    #[test]
    fn denial_message_names_the_requirement_kind() {
        assert!(Requirement::AnyRole(vec![]).denial().contains("role"));
        assert!(Requirement::AllPermissions(vec![]).denial().contains("permission"));
    }
}
