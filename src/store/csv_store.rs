// CSV-backed store: one "<Store>.csv" file per store, header row first.
// The closest local stand-in for a spreadsheet tab.

use super::{RecordStore, Row, StoreSchema};
use crate::error::{Result, StoreError};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct CsvStore {
    dir: PathBuf,
    schemas: HashMap<String, StoreSchema>,
}

impl CsvStore {
    /// Open (creating if needed) the directory that holds the store files
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::StoreUnavailable(format!("cannot create {}: {}", dir.display(), e))
        })?;

        Ok(CsvStore {
            dir,
            schemas: HashMap::new(),
        })
    }

    pub fn path_for(&self, store: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", store))
    }

    fn read_header(path: &Path) -> Result<Option<Row>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        match rdr.records().next() {
            Some(record) => Ok(Some(record?.iter().map(String::from).collect())),
            None => Ok(None),
        }
    }

    /// True when the file is non-empty and its last byte is not a line break
    fn ends_mid_line(file: &mut fs::File) -> Result<bool> {
        if file.metadata()?.len() == 0 {
            return Ok(false);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        Ok(!matches!(last[0], b'\n' | b'\r'))
    }

    fn write_header(path: &Path, schema: &StoreSchema) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(schema.header)?;
        wtr.flush()?;
        Ok(())
    }
}

impl RecordStore for CsvStore {
    fn ensure_store(&mut self, schema: &StoreSchema) -> Result<()> {
        let path = self.path_for(schema.name);

        let existing = if path.exists() {
            Self::read_header(&path)?
        } else {
            None
        };

        match existing {
            Some(header) => schema.check_header(&header)?,
            None => {
                Self::write_header(&path, schema)?;
                info!(store = schema.name, path = %path.display(), "created store with header row");
            }
        }

        self.schemas.insert(schema.name.to_string(), *schema);
        Ok(())
    }

    fn append(&mut self, store: &str, row: Row) -> Result<()> {
        let schema = self
            .schemas
            .get(store)
            .ok_or_else(|| StoreError::UnknownStore(store.to_string()))?;
        schema.check_row(&row)?;

        // Encode the whole record first so the file sees a single write
        let mut encoder = csv::Writer::from_writer(Vec::new());
        encoder.write_record(&row)?;
        let bytes = encoder
            .into_inner()
            .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;

        let path = self.path_for(store);
        let mut file = OpenOptions::new().read(true).append(true).open(&path)?;

        // Files saved by hand often lack the final newline
        let bytes = if Self::ends_mid_line(&mut file)? {
            [b"\n".as_slice(), bytes.as_slice()].concat()
        } else {
            bytes
        };
        file.write_all(&bytes)?;
        file.sync_data()?;

        debug!(store, bytes = bytes.len(), "appended csv row");
        Ok(())
    }

    fn read_all(&self, store: &str) -> Result<Vec<Row>> {
        let path = self.path_for(store);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(String::from).collect());
        }

        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Expense, ExpenseCategory, Record, Sale};
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let mut store = CsvStore::open(dir.path()).unwrap();

        store.ensure_store(&Sale::schema()).unwrap();
        store.ensure_store(&Sale::schema()).unwrap();

        let contents = fs::read_to_string(store.path_for("Sales")).unwrap();
        assert_eq!(contents, "Date,Item,Qty,Price,Total\n");
    }

    #[test]
    fn test_append_then_read_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut store = CsvStore::open(dir.path()).unwrap();
        store.ensure_store(&Sale::schema()).unwrap();

        let first = Sale::new("2024-05-01 08:00", "Latte", 1, 150.0);
        let second = Sale::new("2024-05-01 08:05", "Spanish Latte, iced", 2, 170.0);
        store.append("Sales", first.to_row()).unwrap();
        store.append("Sales", second.to_row()).unwrap();

        let rows = store.read_all("Sales").unwrap();
        assert_eq!(rows, vec![first.to_row(), second.to_row()]);
    }

    #[test]
    fn test_existing_file_with_other_header_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Sales.csv"), "Date,Product,Qty,Price,Total\n").unwrap();

        let mut store = CsvStore::open(dir.path()).unwrap();
        let result = store.ensure_store(&Sale::schema());

        assert!(matches!(result, Err(StoreError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_empty_file_gets_header() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Sales.csv"), "").unwrap();

        let mut store = CsvStore::open(dir.path()).unwrap();
        store.ensure_store(&Sale::schema()).unwrap();

        assert!(store.read_all("Sales").unwrap().is_empty());
        let contents = fs::read_to_string(store.path_for("Sales")).unwrap();
        assert!(contents.starts_with("Date,Item"));
    }

    #[test]
    fn test_read_missing_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::open(dir.path()).unwrap();

        assert!(store.read_all("Expenses").unwrap().is_empty());
    }

    #[test]
    fn test_append_after_row_without_final_newline() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("Sales.csv"),
            "Date,Item,Qty,Price,Total\n2024-05-01 08:00,Latte,1,150,150",
        )
        .unwrap();

        let mut store = CsvStore::open(dir.path()).unwrap();
        store.ensure_store(&Sale::schema()).unwrap();
        let cookie = Sale::new("2024-05-20 09:30", "Cookie", 1, 80.0);
        store.append("Sales", cookie.to_row()).unwrap();

        let rows = store.read_all("Sales").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "Latte");
        assert_eq!(rows[1], cookie.to_row());
    }

    #[test]
    fn test_append_after_header_without_final_newline() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Expenses.csv"), "Date,Category,Item,Cost").unwrap();

        let mut store = CsvStore::open(dir.path()).unwrap();
        store.ensure_store(&Expense::schema()).unwrap();
        let milk = Expense::new("2024-05-20 09:30", ExpenseCategory::Milk, "Milk", 100.0);
        store.append("Expenses", milk.to_row()).unwrap();

        assert_eq!(store.read_all("Expenses").unwrap(), vec![milk.to_row()]);

        // Header still intact on reopen
        let mut reopened = CsvStore::open(dir.path()).unwrap();
        assert!(reopened.ensure_store(&Expense::schema()).is_ok());
    }
}
