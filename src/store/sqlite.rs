// SQLite-backed store: one table per store, TEXT columns named after the
// header. rowid order is insertion order.

use super::{RecordStore, Row, StoreSchema};
use crate::error::{Result, StoreError};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Internal ordering column; never part of the header
const ROW_ID: &str = "row_id";

pub struct SqliteStore {
    conn: Connection,
    schemas: HashMap<String, StoreSchema>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self::with_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::with_connection(Connection::open_in_memory()?))
    }

    fn with_connection(conn: Connection) -> Self {
        SqliteStore {
            conn,
            schemas: HashMap::new(),
        }
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Data columns of a table, in declaration order
    fn columns(&self, table: &str) -> Result<Row> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;

        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(columns.into_iter().filter(|c| c != ROW_ID).collect())
    }

    fn column_list(header: &[&str]) -> String {
        header
            .iter()
            .map(|h| quote_ident(h))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Quote an identifier for SQLite ("Sales" -> "\"Sales\"")
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

impl RecordStore for SqliteStore {
    fn ensure_store(&mut self, schema: &StoreSchema) -> Result<()> {
        if self.table_exists(schema.name)? {
            let found = self.columns(schema.name)?;
            schema.check_header(&found)?;
        } else {
            let columns = schema
                .header
                .iter()
                .map(|h| format!("{} TEXT NOT NULL", quote_ident(h)))
                .collect::<Vec<_>>()
                .join(", ");

            self.conn.execute(
                &format!(
                    "CREATE TABLE {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {})",
                    quote_ident(schema.name),
                    ROW_ID,
                    columns
                ),
                [],
            )?;
            info!(store = schema.name, "created sqlite table");
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

        let placeholders = (1..=row.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        // Single INSERT: the row lands whole or not at all
        self.conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(store),
                Self::column_list(schema.header),
                placeholders
            ),
            params_from_iter(row.iter()),
        )?;

        debug!(store, "appended sqlite row");
        Ok(())
    }

    fn read_all(&self, store: &str) -> Result<Vec<Row>> {
        if !self.table_exists(store)? {
            return Ok(Vec::new());
        }

        let columns = self.columns(store)?;
        let width = columns.len();
        let quoted = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY {}",
            quoted,
            quote_ident(store),
            ROW_ID
        ))?;

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, String>(i))
                    .collect::<std::result::Result<Row, _>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
