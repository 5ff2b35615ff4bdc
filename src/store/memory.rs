// In-process store: scratch backend and test double.
// Counts calls so tests can assert that rejected input never reached it.

use super::{RecordStore, Row, StoreSchema};
use crate::error::{Result, StoreError};
use std::cell::Cell;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    stores: HashMap<String, (StoreSchema, Vec<Row>)>,
    offline: bool,
    append_calls: usize,
    read_calls: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection: every call fails with `StoreUnavailable`
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Number of `append` calls received, successful or not
    pub fn append_calls(&self) -> usize {
        self.append_calls
    }

    /// Number of `read_all` calls received
    pub fn read_calls(&self) -> usize {
        self.read_calls.get()
    }

    /// Rows currently held by a store
    pub fn row_count(&self, store: &str) -> usize {
        self.stores.get(store).map(|(_, rows)| rows.len()).unwrap_or(0)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline {
            Err(StoreError::StoreUnavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for MemoryStore {
    fn ensure_store(&mut self, schema: &StoreSchema) -> Result<()> {
        self.check_online()?;

        match self.stores.get(schema.name) {
            Some((existing, _)) => schema.check_header(&existing.header_row()),
            None => {
                self.stores.insert(schema.name.to_string(), (*schema, Vec::new()));
                Ok(())
            }
        }
    }

    fn append(&mut self, store: &str, row: Row) -> Result<()> {
        self.append_calls += 1;
        self.check_online()?;

        let (schema, rows) = self
            .stores
            .get_mut(store)
            .ok_or_else(|| StoreError::UnknownStore(store.to_string()))?;

        schema.check_row(&row)?;
        rows.push(row);
        Ok(())
    }

    fn read_all(&self, store: &str) -> Result<Vec<Row>> {
        self.read_calls.set(self.read_calls.get() + 1);
        self.check_online()?;

        Ok(self
            .stores
            .get(store)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
