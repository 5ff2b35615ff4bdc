// Point of sale - order entry, expense entry, and the dashboard snapshot.
//
// One store round trip per operation; nothing runs in the background.
// The dashboard keeps the last full read until `refresh` (or a submission)
// invalidates it.

use crate::error::{Result, StoreError};
use crate::records::{Expense, ExpenseCategory, Record, Sale, MONTH_FORMAT, TIMESTAMP_FORMAT};
use crate::report::{compute_monthly_report, MonthlyReport};
use crate::store::{append_record, read_records, RecordStore};
use chrono::{Local, NaiveDateTime};
use tracing::{info, warn};

/// Source of "now" for timestamps and the reporting month
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn timestamp(&self) -> String {
        self.now().format(TIMESTAMP_FORMAT).to_string()
    }

    fn current_month(&self) -> String {
        self.now().format(MONTH_FORMAT).to_string()
    }
}

/// Local wall clock, no timezone normalisation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Full reads of both stores, as last fetched
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sales: Vec<Sale>,
    pub expenses: Vec<Expense>,
}

pub struct PointOfSale<S: RecordStore> {
    store: S,
    clock: Box<dyn Clock + Send>,
    snapshot: Option<Snapshot>,
}

impl<S: RecordStore> PointOfSale<S> {
    /// Bootstrap both stores (creating them with their header rows if
    /// missing) using the local clock.
    pub fn open(store: S) -> Result<Self> {
        Self::with_clock(store, Box::new(SystemClock))
    }

    pub fn with_clock(mut store: S, clock: Box<dyn Clock + Send>) -> Result<Self> {
        store.ensure_store(&Sale::schema())?;
        store.ensure_store(&Expense::schema())?;
        info!(backend = store.backend_name(), "stores ready");

        Ok(PointOfSale {
            store,
            clock,
            snapshot: None,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Record a sale stamped with the current time
    pub fn submit_sale(&mut self, item: &str, quantity: u32, unit_price: f64) -> Result<Sale> {
        let item = item.trim();
        if item.is_empty() {
            return Err(self.reject("item is required"));
        }
        if quantity < 1 {
            return Err(self.reject("quantity must be at least 1"));
        }
        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err(self.reject("price must be zero or more"));
        }

        let sale = Sale::new(self.clock.timestamp(), item, quantity, unit_price);
        append_record(&mut self.store, &sale)?;
        self.snapshot = None;

        info!(item = %sale.item, quantity, total = sale.total, "sale recorded");
        Ok(sale)
    }

    /// Log an expense. Empty items and non-positive costs are rejected
    /// before the store is touched.
    pub fn submit_expense(&mut self, category: ExpenseCategory, item: &str, cost: f64) -> Result<Expense> {
        let item = item.trim();
        if item.is_empty() || !cost.is_finite() || cost <= 0.0 {
            return Err(self.reject("please fill in item name and cost"));
        }

        let expense = Expense::new(self.clock.timestamp(), category, item, cost);
        append_record(&mut self.store, &expense)?;
        self.snapshot = None;

        info!(category = %category, item = %expense.item, cost, "expense recorded");
        Ok(expense)
    }

    /// Drop the cached read so the next dashboard fetches fresh data
    pub fn refresh(&mut self) {
        self.snapshot = None;
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Full read of both stores, reusing the cached copy when present
    pub fn snapshot(&mut self) -> Result<&Snapshot> {
        let snapshot = match self.snapshot.take() {
            Some(cached) => cached,
            None => Snapshot {
                sales: read_records::<S, Sale>(&self.store)?,
                expenses: read_records::<S, Expense>(&self.store)?,
            },
        };

        Ok(self.snapshot.insert(snapshot))
    }

    /// Report for the current month
    pub fn dashboard(&mut self) -> Result<MonthlyReport> {
        let month = self.clock.current_month();
        self.report_for(&month)
    }

    /// Report for any "YYYY-MM" month
    pub fn report_for(&mut self, month: &str) -> Result<MonthlyReport> {
        let snapshot = self.snapshot()?;
        Ok(compute_monthly_report(&snapshot.sales, &snapshot.expenses, month))
    }

    fn reject(&self, message: &str) -> StoreError {
        warn!(reason = message, "submission rejected");
        StoreError::validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn clock() -> Box<dyn Clock + Send> {
        let at = NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        Box::new(FixedClock(at))
    }

    fn pos() -> PointOfSale<MemoryStore> {
        PointOfSale::with_clock(MemoryStore::new(), clock()).unwrap()
    }

    #[test]
    fn test_submit_sale_stamps_and_computes_total() {
        let mut pos = pos();
        let sale = pos.submit_sale("Latte", 2, 150.0).unwrap();

        assert_eq!(sale.date, "2024-05-20 14:07");
        assert_eq!(sale.total, 300.0);
        assert_eq!(pos.store().row_count("Sales"), 1);
    }

    #[test]
    fn test_submit_sale_zero_quantity_never_reaches_store() {
        let mut pos = pos();
        let err = pos.submit_sale("Latte", 0, 150.0).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(pos.store().append_calls(), 0);
    }

    #[test]
    fn test_submit_expense_rejects_zero_cost_and_empty_item() {
        let mut pos = pos();

        assert!(pos.submit_expense(ExpenseCategory::Milk, "Milk", 0.0).unwrap_err().is_validation());
        assert!(pos.submit_expense(ExpenseCategory::Milk, "   ", 50.0).unwrap_err().is_validation());
        assert!(pos.submit_expense(ExpenseCategory::Milk, "Milk", -5.0).unwrap_err().is_validation());

        assert_eq!(pos.store().append_calls(), 0);
    }

    #[test]
    fn test_submit_expense_trims_item() {
        let mut pos = pos();
        let expense = pos.submit_expense(ExpenseCategory::Ice, "  Ice bags ", 60.0).unwrap();

        assert_eq!(expense.item, "Ice bags");
        assert_eq!(expense.category, ExpenseCategory::Ice);
    }

    #[test]
    fn test_dashboard_uses_clock_month() {
        let mut pos = pos();
        pos.submit_sale("Cookie", 3, 80.0).unwrap();
        pos.submit_expense(ExpenseCategory::Cups, "Cups", 100.0).unwrap();

        let report = pos.dashboard().unwrap();

        assert_eq!(report.reference_month, "2024-05");
        assert_eq!(report.sales_total, 240.0);
        assert_eq!(report.expense_total, 100.0);
        assert_eq!(report.net_profit, 140.0);
    }

    #[test]
    fn test_dashboard_is_cached_until_refresh() {
        let mut pos = pos();
        pos.dashboard().unwrap();
        pos.dashboard().unwrap();
        assert_eq!(pos.store().read_calls(), 2, "one read per store");

        pos.refresh();
        assert!(!pos.is_cached());
        pos.dashboard().unwrap();
        assert_eq!(pos.store().read_calls(), 4);
    }

    #[test]
    fn test_submission_invalidates_cache() {
        let mut pos = pos();
        assert_eq!(pos.dashboard().unwrap().sales_count, 0);

        pos.submit_sale("Espresso", 1, 120.0).unwrap();
        assert!(!pos.is_cached());
        assert_eq!(pos.dashboard().unwrap().sales_count, 1);
    }

    #[test]
    fn test_unavailable_store_surfaces_error() {
        let mut pos = pos();
        pos.store.set_offline(true);

        assert!(matches!(
            pos.submit_sale("Latte", 1, 150.0),
            Err(StoreError::StoreUnavailable(_))
        ));
        assert!(matches!(pos.dashboard(), Err(StoreError::StoreUnavailable(_))));
    }

    #[test]
    fn test_open_fails_when_store_offline() {
        let mut store = MemoryStore::new();
        store.set_offline(true);

        assert!(PointOfSale::with_clock(store, clock()).is_err());
    }
}
