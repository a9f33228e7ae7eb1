//! The one predicate deciding which assignment rows are visible under a scope.
//!
//! Every read and write path goes through [`AssignmentFilter`], so a row is
//! visible under exactly one scope.

use permit_core::{Scope, SubjectId};

use crate::store::Assignment;

/// Filter selecting one owner's rows under one scope, optionally narrowed to a
/// single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub owner_id: SubjectId,
    pub scope: Scope,
    pub value: Option<String>,
}

impl AssignmentFilter {
    /// Global restricts to global rows; `Team(type, id)` to rows of exactly that
    /// team.
    pub fn for_scope(owner_id: SubjectId, scope: &Scope) -> Self {
        Self {
            owner_id,
            scope: scope.clone(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn matches(&self, row: &Assignment) -> bool {
        row.owner_id == self.owner_id
            && row.scope == self.scope
            && self.value.as_deref().is_none_or(|v| v == row.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use permit_core::{TeamId, TeamType};

    fn row(owner_id: SubjectId, value: &str, scope: Scope) -> Assignment {
        Assignment {
            owner_id,
            value: value.to_string(),
            scope,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn global_filter_ignores_team_rows() {
        let owner = SubjectId::new();
        let team = Scope::team(TeamType::new("project"), TeamId::new());
        let filter = AssignmentFilter::for_scope(owner, &Scope::global());

        assert!(filter.matches(&row(owner, "admin", Scope::global())));
        assert!(!filter.matches(&row(owner, "admin", team)));
    }

    #[test]
    fn team_filter_requires_same_type_and_id() {
        let owner = SubjectId::new();
        let id = TeamId::new();
        let filter = AssignmentFilter::for_scope(owner, &Scope::team(TeamType::new("project"), id));

        assert!(filter.matches(&row(owner, "editor", Scope::team(TeamType::new("project"), id))));
        assert!(!filter.matches(&row(owner, "editor", Scope::team(TeamType::new("project"), TeamId::new()))));
        assert!(!filter.matches(&row(owner, "editor", Scope::team(TeamType::new("division"), id))));
        assert!(!filter.matches(&row(owner, "editor", Scope::global())));
        assert!(!filter.matches(&row(SubjectId::new(), "editor", Scope::team(TeamType::new("project"), id))));
    }

    #[test]
    fn value_narrows_the_match() {
        let owner = SubjectId::new();
        let filter = AssignmentFilter::for_scope(owner, &Scope::global()).with_value("admin");
        assert!(filter.matches(&row(owner, "admin", Scope::global())));
        assert!(!filter.matches(&row(owner, "auditor", Scope::global())));
    }
}
