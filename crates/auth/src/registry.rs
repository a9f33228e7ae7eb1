//! Explicit mapping from subject/team types to their collaborator types.
//!
//! Built once at startup. Resolution never inspects type names at runtime; a
//! subject or team that was not registered fails with [`ResolutionError`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use permit_core::{DomainError, Scope, SubjectType, TeamType};

use crate::permissions::PermissionVocabulary;
use crate::roles::{RoleEnum, RoleVocabulary};

/// Name of a table holding assignment rows of one kind for one subject type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentTable(Cow<'static, str>);

impl AssignmentTable {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for AssignmentTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("subject type '{0}' is not registered")]
    UnknownSubject(SubjectType),

    #[error("team type '{0}' is not registered")]
    UnknownTeam(TeamType),

    #[error("team scopes are disabled; cannot resolve team type '{0}'")]
    TeamsDisabled(TeamType),

    #[error("subject type '{0}' is registered twice")]
    DuplicateSubject(SubjectType),

    #[error("team type '{0}' is registered twice")]
    DuplicateTeam(TeamType),

    #[error("invalid type name: {0}")]
    InvalidName(#[from] DomainError),
}

/// The four collaborator types of a (subject, scope) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collaborators {
    pub role_vocabulary: RoleVocabulary,
    pub permission_vocabulary: PermissionVocabulary,
    pub role_table: AssignmentTable,
    pub permission_table: AssignmentTable,
}

#[derive(Debug, Clone)]
struct SubjectBinding {
    roles: RoleVocabulary,
    role_table: AssignmentTable,
    permission_table: AssignmentTable,
}

/// Immutable registry of subject and team bindings.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    subjects: BTreeMap<SubjectType, SubjectBinding>,
    teams: BTreeMap<TeamType, RoleVocabulary>,
    teams_enabled: bool,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    pub fn teams_enabled(&self) -> bool {
        self.teams_enabled
    }

    /// Resolve the collaborators for a subject type under a scope.
    ///
    /// Tables always come from the subject registration. Vocabularies come from
    /// the team registration for team scopes and from the subject otherwise.
    pub fn resolve(
        &self,
        subject_type: &SubjectType,
        scope: &Scope,
    ) -> Result<Collaborators, ResolutionError> {
        let binding = self.subject(subject_type)?;

        let roles = match scope.team_type() {
            None => binding.roles,
            Some(team_type) => self.team(team_type)?,
        };

        Ok(Collaborators {
            role_vocabulary: roles,
            permission_vocabulary: roles.permissions(),
            role_table: binding.role_table.clone(),
            permission_table: binding.permission_table.clone(),
        })
    }

    /// Assignment tables of a subject type, independent of scope.
    pub fn tables(
        &self,
        subject_type: &SubjectType,
    ) -> Result<(AssignmentTable, AssignmentTable), ResolutionError> {
        let binding = self.subject(subject_type)?;
        Ok((binding.role_table.clone(), binding.permission_table.clone()))
    }

    /// Snapshot of every registered vocabulary (for audit/display).
    pub fn describe(&self) -> Vec<VocabularyDescription> {
        let subjects = self
            .subjects
            .iter()
            .map(|(name, binding)| describe(ScopeKind::Subject, name.as_str(), binding.roles));
        let teams = self
            .teams
            .iter()
            .map(|(name, roles)| describe(ScopeKind::Team, name.as_str(), *roles));
        subjects.chain(teams).collect()
    }

    fn subject(&self, subject_type: &SubjectType) -> Result<&SubjectBinding, ResolutionError> {
        self.subjects
            .get(subject_type)
            .ok_or_else(|| ResolutionError::UnknownSubject(subject_type.clone()))
    }

    fn team(&self, team_type: &TeamType) -> Result<RoleVocabulary, ResolutionError> {
        if !self.teams_enabled {
            return Err(ResolutionError::TeamsDisabled(team_type.clone()));
        }
        self.teams
            .get(team_type)
            .copied()
            .ok_or_else(|| ResolutionError::UnknownTeam(team_type.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct TypeRegistryBuilder {
    subjects: Vec<(SubjectType, SubjectBinding)>,
    teams: Vec<(TeamType, RoleVocabulary)>,
    teams_enabled: bool,
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self {
            subjects: Vec::new(),
            teams: Vec::new(),
            teams_enabled: true,
        }
    }
}

impl TypeRegistryBuilder {
    /// Register a subject type with its global vocabulary.
    ///
    /// Tables default to `<subject>_roles` and `<subject>_permissions`.
    pub fn subject<R: RoleEnum>(self, subject_type: SubjectType) -> Self {
        let role_table = AssignmentTable::new(format!("{subject_type}_roles"));
        let permission_table = AssignmentTable::new(format!("{subject_type}_permissions"));
        self.subject_with_tables::<R>(subject_type, role_table, permission_table)
    }

    pub fn subject_with_tables<R: RoleEnum>(
        mut self,
        subject_type: SubjectType,
        role_table: AssignmentTable,
        permission_table: AssignmentTable,
    ) -> Self {
        self.subjects.push((
            subject_type,
            SubjectBinding {
                roles: RoleVocabulary::of::<R>(),
                role_table,
                permission_table,
            },
        ));
        self
    }

    /// Register the vocabulary valid for assignments scoped to a team type.
    pub fn team<R: RoleEnum>(mut self, team_type: TeamType) -> Self {
        self.teams.push((team_type, RoleVocabulary::of::<R>()));
        self
    }

    pub fn teams_enabled(mut self, enabled: bool) -> Self {
        self.teams_enabled = enabled;
        self
    }

    pub fn build(self) -> Result<TypeRegistry, ResolutionError> {
        let mut subjects = BTreeMap::new();
        for (name, binding) in self.subjects {
            name.validate()?;
            if subjects.contains_key(&name) {
                return Err(ResolutionError::DuplicateSubject(name));
            }
            subjects.insert(name, binding);
        }

        let mut teams = BTreeMap::new();
        for (name, roles) in self.teams {
            name.validate()?;
            if teams.contains_key(&name) {
                return Err(ResolutionError::DuplicateTeam(name));
            }
            teams.insert(name, roles);
        }

        Ok(TypeRegistry {
            subjects,
            teams,
            teams_enabled: self.teams_enabled,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Subject,
    Team,
}

/// Role definition with its implied permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: String,
    pub permissions: Vec<String>,
}

/// One registered vocabulary.
#[derive(Debug, Clone, Serialize)]
pub struct VocabularyDescription {
    pub kind: ScopeKind,
    pub owner: String,
    pub role_enum: String,
    pub permission_enum: String,
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<String>,
}

fn describe(kind: ScopeKind, owner: &str, roles: RoleVocabulary) -> VocabularyDescription {
    VocabularyDescription {
        kind,
        owner: owner.to_string(),
        role_enum: roles.name().to_string(),
        permission_enum: roles.permissions().name().to_string(),
        roles: roles
            .values()
            .into_iter()
            .map(|role| RoleDefinition {
                name: role.to_string(),
                permissions: roles
                    .implied_permissions(role)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
            .collect(),
        permissions: roles
            .permissions()
            .values()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permit_core::TeamId;

    crate::permission_enum! {
        enum UserPermission {
            ManageBilling => "manage-billing",
        }
    }

    crate::role_enum! {
        enum UserRole: UserPermission {
            Admin => "admin" [ManageBilling],
        }
    }

    crate::permission_enum! {
        enum ProjectPermission {
            Edit => "edit",
        }
    }

    crate::role_enum! {
        enum ProjectRole: ProjectPermission {
            Editor => "editor" [Edit],
        }
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .subject::<UserRole>(SubjectType::new("user"))
            .team::<ProjectRole>(TeamType::new("project"))
            .build()
            .unwrap()
    }

    #[test]
    fn global_scope_uses_subject_vocabulary() {
        let c = registry()
            .resolve(&SubjectType::new("user"), &Scope::global())
            .unwrap();
        assert!(c.role_vocabulary.is::<UserRole>());
        assert!(c.permission_vocabulary.is::<UserPermission>());
        assert_eq!(c.role_table.as_str(), "user_roles");
        assert_eq!(c.permission_table.as_str(), "user_permissions");
    }

    #[test]
    fn team_scope_uses_team_vocabulary_and_subject_tables() {
        let scope = Scope::team(TeamType::new("project"), TeamId::new());
        let c = registry().resolve(&SubjectType::new("user"), &scope).unwrap();
        assert!(c.role_vocabulary.is::<ProjectRole>());
        assert!(c.permission_vocabulary.is::<ProjectPermission>());
        assert_eq!(c.role_table.as_str(), "user_roles");
    }

    #[test]
    fn unknown_types_fail_resolution() {
        let reg = registry();
        let err = reg
            .resolve(&SubjectType::new("robot"), &Scope::global())
            .unwrap_err();
        assert_eq!(err, ResolutionError::UnknownSubject(SubjectType::new("robot")));

        let scope = Scope::team(TeamType::new("division"), TeamId::new());
        let err = reg.resolve(&SubjectType::new("user"), &scope).unwrap_err();
        assert_eq!(err, ResolutionError::UnknownTeam(TeamType::new("division")));
    }

    #[test]
    fn disabled_teams_reject_team_scopes() {
        let reg = TypeRegistry::builder()
            .subject::<UserRole>(SubjectType::new("user"))
            .team::<ProjectRole>(TeamType::new("project"))
            .teams_enabled(false)
            .build()
            .unwrap();
        let scope = Scope::team(TeamType::new("project"), TeamId::new());
        assert!(matches!(
            reg.resolve(&SubjectType::new("user"), &scope),
            Err(ResolutionError::TeamsDisabled(_))
        ));
        assert!(reg.resolve(&SubjectType::new("user"), &Scope::global()).is_ok());
    }

    #[test]
    fn duplicate_and_malformed_registrations_are_rejected() {
        let err = TypeRegistry::builder()
            .subject::<UserRole>(SubjectType::new("user"))
            .subject::<UserRole>(SubjectType::new("user"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ResolutionError::DuplicateSubject(_)));

        let err = TypeRegistry::builder()
            .team::<ProjectRole>(TeamType::new("a:b"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidName(_)));
    }

    #[test]
    fn describe_lists_roles_with_implied_permissions() {
        let described = registry().describe();
        assert_eq!(described.len(), 2);
        let project = described.iter().find(|d| d.owner == "project").unwrap();
        assert_eq!(project.kind, ScopeKind::Team);
        assert_eq!(project.role_enum, "ProjectRole");
        assert_eq!(project.roles[0].name, "editor");
        assert_eq!(project.roles[0].permissions, vec!["edit".to_string()]);
    }
}
