//! Assignment store contract.
//!
//! The authorization core only needs these query shapes; how rows are
//! persisted is up to the implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use permit_core::{Scope, SubjectId};

use crate::registry::AssignmentTable;
use crate::scope_filter::AssignmentFilter;

/// A persisted assignment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub owner_id: SubjectId,
    pub value: String,
    pub scope: Scope,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An assignment row to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub owner_id: SubjectId,
    pub value: String,
    pub scope: Scope,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewAssignment {
    /// Filter matching the row this assignment would create.
    pub fn identity(&self) -> AssignmentFilter {
        AssignmentFilter::for_scope(self.owner_id, &self.scope).with_value(self.value.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("assignment store unavailable: {0}")]
    Unavailable(String),
}

/// Assignment storage abstraction.
pub trait AssignmentStore: Send + Sync {
    /// Return the row identified by (owner, value, scope), creating it if absent.
    ///
    /// An existing row is returned unchanged (its expiry is not overwritten).
    fn find_or_create(
        &self,
        table: &AssignmentTable,
        row: NewAssignment,
    ) -> Result<Assignment, StoreError>;

    /// Delete every row matching the filter; returns the number deleted.
    fn delete(&self, table: &AssignmentTable, filter: &AssignmentFilter) -> Result<usize, StoreError>;

    /// Project the `value` column of every row matching the filter.
    fn values(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
    ) -> Result<Vec<String>, StoreError>;

    /// Delete every row matching the filter and create `rows`, as one unit.
    fn replace(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
        rows: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError>;

    /// Delete rows whose expiry is at or before `now`; returns the deleted rows.
    fn delete_expired(
        &self,
        table: &AssignmentTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, StoreError>;
}

impl<S> AssignmentStore for Arc<S>
where
    S: AssignmentStore + ?Sized,
{
    fn find_or_create(
        &self,
        table: &AssignmentTable,
        row: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        (**self).find_or_create(table, row)
    }

    fn delete(&self, table: &AssignmentTable, filter: &AssignmentFilter) -> Result<usize, StoreError> {
        (**self).delete(table, filter)
    }

    fn values(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
    ) -> Result<Vec<String>, StoreError> {
        (**self).values(table, filter)
    }

    fn replace(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
        rows: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError> {
        (**self).replace(table, filter, rows)
    }

    fn delete_expired(
        &self,
        table: &AssignmentTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, StoreError> {
        (**self).delete_expired(table, now)
    }
}
