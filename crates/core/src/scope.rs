//! Assignment scope: global, or bound to one team instance.

use serde::{Deserialize, Serialize};

use crate::id::TeamId;
use crate::subject::TeamType;

/// Where an assignment applies.
///
/// Either fully global or fully bound to a team; a half-set scope cannot be
/// expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Scope {
    #[default]
    Global,
    Team { team_type: TeamType, id: TeamId },
}

impl Scope {
    pub fn global() -> Self {
        Scope::Global
    }

    pub fn team(team_type: TeamType, id: TeamId) -> Self {
        Scope::Team { team_type, id }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Scope::Global)
    }

    pub fn team_type(&self) -> Option<&TeamType> {
        match self {
            Scope::Global => None,
            Scope::Team { team_type, .. } => Some(team_type),
        }
    }

    /// Type segment used in cache keys and error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Scope::Global => "global",
            Scope::Team { team_type, .. } => team_type.as_str(),
        }
    }

    /// Id segment used in cache keys (`-` for the global scope).
    pub fn id_segment(&self) -> String {
        match self {
            Scope::Global => "-".to_string(),
            Scope::Team { id, .. } => id.to_string(),
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Team { team_type, id } => write!(f, "{team_type}:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_and_team_segments_differ() {
        let team = Scope::team(TeamType::new("project"), TeamId::new());
        assert_eq!(Scope::global().type_name(), "global");
        assert_eq!(Scope::global().id_segment(), "-");
        assert_eq!(team.type_name(), "project");
        assert_ne!(team.id_segment(), "-");
        assert!(!team.is_global());
    }
}
