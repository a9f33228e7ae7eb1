//! Runtime configuration, read from the environment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TEAMS_ENABLED_VAR: &str = "PERMIT_TEAMS_ENABLED";
pub const CACHE_NAMESPACE_VAR: &str = "PERMIT_CACHE_NAMESPACE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a boolean, got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermitConfig {
    /// Whether team-scoped assignments are resolved at all.
    pub teams_enabled: bool,
    /// Prefix of every cache key.
    pub cache_namespace: String,
}

impl Default for PermitConfig {
    fn default() -> Self {
        Self {
            teams_enabled: true,
            cache_namespace: "permit".to_string(),
        }
    }
}

impl PermitConfig {
    /// Read overrides from `PERMIT_*` variables; unset variables keep defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(TEAMS_ENABLED_VAR) {
            config.teams_enabled = parse_bool(TEAMS_ENABLED_VAR, &value)?;
        }

        if let Some(value) = lookup(CACHE_NAMESPACE_VAR) {
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::Empty {
                    var: CACHE_NAMESPACE_VAR,
                });
            }
            config.cache_namespace = value.to_string();
        }

        Ok(config)
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(PermitConfig::from_lookup(lookup(&[])).unwrap(), PermitConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = PermitConfig::from_lookup(lookup(&[
            (TEAMS_ENABLED_VAR, "off"),
            (CACHE_NAMESPACE_VAR, " acl "),
        ]))
        .unwrap();
        assert!(!config.teams_enabled);
        assert_eq!(config.cache_namespace, "acl");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = PermitConfig::from_lookup(lookup(&[(TEAMS_ENABLED_VAR, "maybe")])).unwrap_err();
        assert!(err.to_string().contains(TEAMS_ENABLED_VAR));

        let err = PermitConfig::from_lookup(lookup(&[(CACHE_NAMESPACE_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty { var: CACHE_NAMESPACE_VAR });
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: PermitConfig = serde_json::from_str(r#"{"teams_enabled":false}"#).unwrap();
        assert!(!config.teams_enabled);
        assert_eq!(config.cache_namespace, "permit");
    }
}
