use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use super::SnapshotCache;
use crate::config::{normalize_iso, DatasetKind};
use crate::error::Result;
use crate::table::CanonicalTable;

/// Process-local snapshots; lost on exit.
#[derive(Default)]
pub struct MemoryCache {
    tables: RwLock<HashMap<(String, DatasetKind), CanonicalTable>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotCache for MemoryCache {
    fn get(&self, country: &str, kind: DatasetKind) -> Result<Option<CanonicalTable>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        Ok(tables.get(&(normalize_iso(country), kind)).cloned())
    }

    fn put(&self, country: &str, kind: DatasetKind, table: &CanonicalTable) -> Result<()> {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((normalize_iso(country), kind), table.clone());
        Ok(())
    }

    fn invalidate(&self, country: &str, kind: DatasetKind) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(normalize_iso(country), kind))
            .is_some())
    }
}

/// Never stores anything: every load runs the full pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SnapshotCache for NoCache {
    fn get(&self, _country: &str, _kind: DatasetKind) -> Result<Option<CanonicalTable>> {
        Ok(None)
    }

    fn put(&self, _country: &str, _kind: DatasetKind, _table: &CanonicalTable) -> Result<()> {
        Ok(())
    }

    fn invalidate(&self, _country: &str, _kind: DatasetKind) -> Result<bool> {
        Ok(false)
    }
}
