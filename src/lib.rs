// Cafe POS - Core Library
// Exposes all modules for use in the terminal app, the API server, and tests

pub mod error;
pub mod records;
pub mod store;      // Record Store Adapter - CSV / SQLite / memory
pub mod report;     // Monthly aggregation (the dashboard numbers)
pub mod pos;        // Order + expense submission, cached dashboard
pub mod menu;
pub mod config;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use records::{
    Expense, ExpenseCategory, Record, Sale,
    EXPENSES_HEADER, EXPENSES_STORE, SALES_HEADER, SALES_STORE,
};
pub use store::{
    append_record, open_store, read_records,
    CsvStore, MemoryStore, RecordStore, Row, SqliteStore, StoreSchema,
};
pub use report::{
    compute_monthly_report, current_month, format_money, parse_month,
    MonthlyReport, RECENT_LIMIT,
};
pub use pos::{Clock, FixedClock, PointOfSale, Snapshot, SystemClock};
pub use menu::{Menu, MenuItem};
pub use config::{ConfigError, PosConfig, ServerConfig, ShopConfig, StoreBackend, StoreConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
