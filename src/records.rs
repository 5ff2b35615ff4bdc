// Records - the two kinds of logged events (sales and expenses)
// Each record knows its store name, its header row, and how to encode itself
// as a row of cells. Records are immutable once appended.

use crate::error::{Result, StoreError};
use crate::store::{Row, StoreSchema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp stamped on every record ("2024-05-01 09:30")
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Month key used for reporting ("2024-05")
pub const MONTH_FORMAT: &str = "%Y-%m";

pub const SALES_STORE: &str = "Sales";
pub const EXPENSES_STORE: &str = "Expenses";

pub const SALES_HEADER: &[&str] = &["Date", "Item", "Qty", "Price", "Total"];
pub const EXPENSES_HEADER: &[&str] = &["Date", "Category", "Item", "Cost"];

/// A record type that lives in its own append-only store.
pub trait Record: Sized {
    const STORE: &'static str;
    const HEADER: &'static [&'static str];

    /// Raw date cell, kept verbatim even when malformed
    fn date(&self) -> &str;

    /// Monetary value summed by the monthly report
    fn amount(&self) -> f64;

    fn to_row(&self) -> Row;

    /// Decode a stored row. `index` is the 1-based data row number, for errors.
    fn from_row(row: &[String], index: usize) -> Result<Self>;

    fn schema() -> StoreSchema {
        StoreSchema::new(Self::STORE, Self::HEADER)
    }
}

// ============================================================================
// SALE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub date: String,
    pub item: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

impl Sale {
    /// Build a sale, computing the total from quantity and unit price
    pub fn new(date: impl Into<String>, item: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Sale {
            date: date.into(),
            item: item.into(),
            quantity,
            unit_price,
            total: round_cents(f64::from(quantity) * unit_price),
        }
    }
}

impl Record for Sale {
    const STORE: &'static str = SALES_STORE;
    const HEADER: &'static [&'static str] = SALES_HEADER;

    fn date(&self) -> &str {
        &self.date
    }

    fn amount(&self) -> f64 {
        self.total
    }

    fn to_row(&self) -> Row {
        vec![
            self.date.clone(),
            self.item.clone(),
            self.quantity.to_string(),
            format_amount(self.unit_price),
            format_amount(self.total),
        ]
    }

    fn from_row(row: &[String], index: usize) -> Result<Self> {
        check_width::<Self>(row, index)?;

        let quantity = row[2].trim().parse::<u32>().map_err(|_| StoreError::InvalidRow {
            store: Self::STORE.to_string(),
            row: index,
            reason: format!("Qty '{}' is not a whole number", row[2]),
        })?;

        Ok(Sale {
            date: row[0].clone(),
            item: row[1].clone(),
            quantity,
            unit_price: parse_amount::<Self>(&row[3], "Price", index)?,
            total: parse_amount::<Self>(&row[4], "Total", index)?,
        })
    }
}

// ============================================================================
// EXPENSE CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Beans,
    Milk,
    Ice,
    Cups,
    Other,
}

impl ExpenseCategory {
    /// Every category, in the order the expense form offers them
    pub const ALL: [ExpenseCategory; 5] = [
        ExpenseCategory::Beans,
        ExpenseCategory::Milk,
        ExpenseCategory::Ice,
        ExpenseCategory::Cups,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Beans => "Beans",
            ExpenseCategory::Milk => "Milk",
            ExpenseCategory::Ice => "Ice",
            ExpenseCategory::Cups => "Cups",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseCategory {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        ExpenseCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                StoreError::validation(format!(
                    "Unknown category '{}' (expected one of Beans, Milk, Ice, Cups, Other)",
                    s
                ))
            })
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub date: String,
    pub category: ExpenseCategory,
    pub item: String,
    pub cost: f64,
}

impl Expense {
    pub fn new(date: impl Into<String>, category: ExpenseCategory, item: impl Into<String>, cost: f64) -> Self {
        Expense {
            date: date.into(),
            category,
            item: item.into(),
            cost,
        }
    }
}

impl Record for Expense {
    const STORE: &'static str = EXPENSES_STORE;
    const HEADER: &'static [&'static str] = EXPENSES_HEADER;

    fn date(&self) -> &str {
        &self.date
    }

    fn amount(&self) -> f64 {
        self.cost
    }

    fn to_row(&self) -> Row {
        vec![
            self.date.clone(),
            self.category.as_str().to_string(),
            self.item.clone(),
            format_amount(self.cost),
        ]
    }

    fn from_row(row: &[String], index: usize) -> Result<Self> {
        check_width::<Self>(row, index)?;

        let category = row[1].parse::<ExpenseCategory>().map_err(|_| StoreError::InvalidRow {
            store: Self::STORE.to_string(),
            row: index,
            reason: format!("unknown category '{}'", row[1]),
        })?;

        Ok(Expense {
            date: row[0].clone(),
            category,
            item: row[2].clone(),
            cost: parse_amount::<Self>(&row[3], "Cost", index)?,
        })
    }
}

// ============================================================================
// CELL HELPERS
// ============================================================================

/// Round to whole cents
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format an amount for storage: "150", "12.5"
pub fn format_amount(value: f64) -> String {
    round_cents(value).to_string()
}

fn parse_amount<R: Record>(cell: &str, column: &str, index: usize) -> Result<f64> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(StoreError::InvalidRow {
            store: R::STORE.to_string(),
            row: index,
            reason: format!("{} '{}' is not a number", column, cell),
        }),
    }
}

fn check_width<R: Record>(row: &[String], index: usize) -> Result<()> {
    if row.len() != R::HEADER.len() {
        return Err(StoreError::InvalidRow {
            store: R::STORE.to_string(),
            row: index,
            reason: format!("expected {} cells, found {}", R::HEADER.len(), row.len()),
        });
    }
    Ok(())
}
