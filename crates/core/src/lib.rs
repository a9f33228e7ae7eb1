//! `permit-core` — identity and scope primitives shared by the authorization crates.
//!
//! This crate has no storage or cache concerns; it only names *who* is asking
//! and *where* (globally or inside a team).

pub mod error;
pub mod id;
pub mod scope;
pub mod subject;

pub use error::{DomainError, DomainResult};
pub use id::{SubjectId, TeamId};
pub use scope::Scope;
pub use subject::{Subject, SubjectType, TeamType};
