// Record Store Adapter - append + full read of named tabular stores
//
// A store is an append-only ordered sequence of rows under a fixed header,
// like one tab of a spreadsheet. Insertion order is recency order.

mod csv_store;
mod memory;
mod sqlite;

pub use csv_store::CsvStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{Result, StoreError};
use crate::records::Record;
use tracing::{debug, info};

/// One row of cells, in header order
pub type Row = Vec<String>;

/// Name and header row of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSchema {
    pub name: &'static str,
    pub header: &'static [&'static str],
}

impl StoreSchema {
    pub const fn new(name: &'static str, header: &'static [&'static str]) -> Self {
        StoreSchema { name, header }
    }

    /// Header cells as owned strings
    pub fn header_row(&self) -> Row {
        self.header.iter().map(|h| h.to_string()).collect()
    }

    /// Fail with `SchemaMismatch` unless `found` equals the declared header
    pub fn check_header(&self, found: &[String]) -> Result<()> {
        let matches = found.len() == self.header.len()
            && found.iter().zip(self.header).all(|(f, h)| f.trim() == *h);

        if matches {
            Ok(())
        } else {
            Err(StoreError::schema_mismatch(self.name, self.header, found))
        }
    }

    /// Fail with `SchemaMismatch` unless the row has one cell per column
    pub fn check_row(&self, row: &[String]) -> Result<()> {
        if row.len() == self.header.len() {
            Ok(())
        } else {
            Err(StoreError::schema_mismatch(self.name, self.header, row))
        }
    }
}

/// Backing store for records.
///
/// Implementations must append atomically: a failed `append` leaves no
/// partial row behind.
pub trait RecordStore {
    /// Create the store with its header row if missing, otherwise verify the
    /// header. Safe to call on every startup.
    fn ensure_store(&mut self, schema: &StoreSchema) -> Result<()>;

    /// Add a row at the end of the named store
    fn append(&mut self, store: &str, row: Row) -> Result<()>;

    /// Every data row in insertion order (header excluded)
    fn read_all(&self, store: &str) -> Result<Vec<Row>>;

    /// Short label for logs ("csv", "sqlite", "memory")
    fn backend_name(&self) -> &'static str;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn ensure_store(&mut self, schema: &StoreSchema) -> Result<()> {
        (**self).ensure_store(schema)
    }

    fn append(&mut self, store: &str, row: Row) -> Result<()> {
        (**self).append(store, row)
    }

    fn read_all(&self, store: &str) -> Result<Vec<Row>> {
        (**self).read_all(store)
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Encode a record and append it to its store
pub fn append_record<S, R>(store: &mut S, record: &R) -> Result<()>
where
    S: RecordStore + ?Sized,
    R: Record,
{
    debug!(store = R::STORE, backend = store.backend_name(), "appending record");
    store.append(R::STORE, record.to_row())
}

/// Read and decode every record of a store, in insertion order
pub fn read_records<S, R>(store: &S) -> Result<Vec<R>>
where
    S: RecordStore + ?Sized,
    R: Record,
{
    let rows = store.read_all(R::STORE)?;
    debug!(store = R::STORE, rows = rows.len(), "read store");

    rows.iter()
        .enumerate()
        .map(|(i, row)| R::from_row(row, i + 1))
        .collect()
}

/// Open the backend selected in configuration
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn RecordStore + Send>> {
    let store: Box<dyn RecordStore + Send> = match config.backend {
        StoreBackend::Csv => Box::new(CsvStore::open(&config.data_dir)?),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(config.database_path())?),
        StoreBackend::Memory => Box::new(MemoryStore::new()),
    };

    info!(backend = store.backend_name(), "record store opened");
    Ok(store)
}
