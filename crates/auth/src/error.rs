use thiserror::Error;

use crate::cache::CacheError;
use crate::registry::ResolutionError;
use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failure of an authorization query or mutation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("invalid role: enum {enum_name} is not valid for {scope_type}")]
    InvalidRole {
        enum_name: &'static str,
        scope_type: String,
    },

    #[error("invalid permission: enum {enum_name} is not valid for {scope_type}")]
    InvalidPermission {
        enum_name: &'static str,
        scope_type: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl AuthError {
    /// The store or cache could not be reached; the operation did not complete.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AuthError::Store(StoreError::Unavailable(_)) | AuthError::Cache(CacheError::Unavailable(_))
        )
    }
}
