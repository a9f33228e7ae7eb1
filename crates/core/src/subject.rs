//! Subject and team type names.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::SubjectId;

macro_rules! impl_type_name {
    ($t:ident, $what:literal) => {
        /// Registered type name (e.g. `"user"`, `"project"`).
        ///
        /// Names appear verbatim in cache keys, so they must be non-empty and must
        /// not contain `:` or whitespace. `new` is meant for static names; use
        /// `parse` for names coming from configuration or requests.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Cow<'static, str>);

        impl $t {
            pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Check the cache-key constraints on this name.
            pub fn validate(&self) -> DomainResult<()> {
                if self.0.is_empty() {
                    return Err(DomainError::validation(concat!($what, " name is empty")));
                }
                if self.0.chars().any(|c| c == ':' || c.is_whitespace()) {
                    return Err(DomainError::validation(format!(
                        "{} name '{}' contains ':' or whitespace",
                        $what, self.0
                    )));
                }
                Ok(())
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let name = Self(Cow::Owned(s.to_string()));
                name.validate()?;
                Ok(name)
            }
        }
    };
}

impl_type_name!(SubjectType, "subject type");
impl_type_name!(TeamType, "team type");

/// An identified subject: the entity whose roles and permissions are resolved.
///
/// Roles and permissions are never stored here; they are computed from
/// assignment rows on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub subject_type: SubjectType,
    pub id: SubjectId,
}

impl Subject {
    pub fn new(subject_type: SubjectType, id: SubjectId) -> Self {
        Self { subject_type, id }
    }
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_key_separator() {
        assert!("team:admin".parse::<TeamType>().is_err());
        assert!("".parse::<SubjectType>().is_err());
        assert!("two words".parse::<SubjectType>().is_err());
    }

    #[test]
    fn parse_accepts_plain_names() {
        let t: TeamType = "project".parse().unwrap();
        assert_eq!(t, TeamType::new("project"));
    }
}
