//! `permit-auth` — role/permission resolution with an invalidation-driven cache.
//!
//! This crate is intentionally decoupled from HTTP and from any concrete storage
//! or cache backend; both are injected through [`AssignmentStore`] and
//! [`QueryCache`].

pub mod authorize;
pub mod authorizer;
pub mod cache;
pub mod error;
pub mod mutation;
pub mod permissions;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod scope_filter;
pub mod store;
mod validate;

pub use authorize::{authorize, AuthorizationExplanation, AuthzError, Requirement};
pub use authorizer::Authorizer;
pub use cache::{CacheError, CacheKeys, CachedAnswer, QueryCache, QueryKind};
pub use error::{AuthError, AuthResult};
pub use permissions::{PermissionEnum, PermissionVocabulary};
pub use registry::{AssignmentTable, Collaborators, ResolutionError, TypeRegistry, TypeRegistryBuilder};
pub use roles::{RoleEnum, RoleVocabulary};
pub use scope_filter::AssignmentFilter;
pub use store::{Assignment, AssignmentStore, NewAssignment, StoreError};
