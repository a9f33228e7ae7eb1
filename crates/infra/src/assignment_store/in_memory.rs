use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use permit_auth::{
    Assignment, AssignmentFilter, AssignmentStore, AssignmentTable, NewAssignment, StoreError,
};

/// In-memory assignment store.
///
/// Intended for tests/dev. Each table is a flat vector scanned per query; a
/// single lock per store keeps `replace` atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryAssignmentStore {
    tables: RwLock<HashMap<AssignmentTable, Vec<Assignment>>>,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Every row of a table (test/debug helper).
    pub fn rows(&self, table: &AssignmentTable) -> Result<Vec<Assignment>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(table).cloned().unwrap_or_default())
    }

    /// Insert a raw row, bypassing find-or-create (seeds legacy/unknown values).
    pub fn insert_raw(&self, table: &AssignmentTable, row: Assignment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.entry(table.clone()).or_default().push(row);
        Ok(())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

fn create(row: NewAssignment, now: DateTime<Utc>) -> Assignment {
    Assignment {
        owner_id: row.owner_id,
        value: row.value,
        scope: row.scope,
        expires_at: row.expires_at,
        created_at: now,
    }
}

impl AssignmentStore for InMemoryAssignmentStore {
    fn find_or_create(
        &self,
        table: &AssignmentTable,
        row: NewAssignment,
    ) -> Result<Assignment, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables.entry(table.clone()).or_default();

        let identity = row.identity();
        if let Some(existing) = rows.iter().find(|r| identity.matches(r)) {
            return Ok(existing.clone());
        }

        let created = create(row, Utc::now());
        rows.push(created.clone());
        Ok(created)
    }

    fn delete(&self, table: &AssignmentTable, filter: &AssignmentFilter) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok(before - rows.len())
    }

    fn values(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
    ) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r))
                    .map(|r| r.value.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn replace(
        &self,
        table: &AssignmentTable,
        filter: &AssignmentFilter,
        rows: Vec<NewAssignment>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let existing = tables.entry(table.clone()).or_default();
        existing.retain(|r| !filter.matches(r));

        let now = Utc::now();
        let mut created: Vec<Assignment> = Vec::with_capacity(rows.len());
        for row in rows {
            // Keep one row per identity even if the caller repeats a value.
            let identity = row.identity();
            if created.iter().any(|r| identity.matches(r)) {
                continue;
            }
            created.push(create(row, now));
        }
        existing.extend(created.iter().cloned());
        Ok(created)
    }

    fn delete_expired(
        &self,
        table: &AssignmentTable,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(vec![]);
        };
        let (expired, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|r| r.is_expired(now));
        *rows = kept;
        Ok(expired)
    }
}
