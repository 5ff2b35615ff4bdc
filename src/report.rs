// 📊 Monthly Report - month-to-date totals, net profit, and recent records
//
// Pure function of its inputs: no I/O, no state, no caching. Callers read the
// stores and pass the full sequences in insertion order.

use crate::error::{Result, StoreError};
use crate::records::{Expense, Record, Sale, MONTH_FORMAT};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;

/// How many records the recent-activity tables show
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyReport {
    pub reference_month: String,
    pub sales_total: f64,
    pub expense_total: f64,
    pub net_profit: f64,
    /// In-month sales counted in `sales_total`
    pub sales_count: usize,
    /// In-month expenses counted in `expense_total`
    pub expense_count: usize,
    /// Newest first, at most `RECENT_LIMIT`
    pub recent_sales: Vec<Sale>,
    /// Newest first, at most `RECENT_LIMIT`
    pub recent_expenses: Vec<Expense>,
}

/// Compute the report for `reference_month` ("YYYY-MM").
///
/// A record counts toward a total when its date string starts with the
/// month key. Malformed or missing dates simply don't match. The recent lists
/// ignore the month and follow insertion order only.
pub fn compute_monthly_report(sales: &[Sale], expenses: &[Expense], reference_month: &str) -> MonthlyReport {
    let (sales_total, sales_count) = month_total(sales, reference_month);
    let (expense_total, expense_count) = month_total(expenses, reference_month);

    debug!(
        month = reference_month,
        sales = sales.len(),
        expenses = expenses.len(),
        sales_total,
        expense_total,
        "computed monthly report"
    );

    MonthlyReport {
        reference_month: reference_month.to_string(),
        sales_total,
        expense_total,
        net_profit: sales_total - expense_total,
        sales_count,
        expense_count,
        recent_sales: most_recent(sales, RECENT_LIMIT),
        recent_expenses: most_recent(expenses, RECENT_LIMIT),
    }
}

/// True when the record's date falls in the month (plain prefix test)
pub fn in_month(date: &str, month: &str) -> bool {
    date.starts_with(month)
}

fn month_total<R: Record>(records: &[R], month: &str) -> (f64, usize) {
    records
        .iter()
        .filter(|r| in_month(r.date(), month))
        .fold((0.0, 0), |(sum, count), r| (sum + r.amount(), count + 1))
}

/// Last `limit` records, newest first
pub fn most_recent<R: Clone>(records: &[R], limit: usize) -> Vec<R> {
    records.iter().rev().take(limit).cloned().collect()
}

/// Month key for the local clock right now
pub fn current_month() -> String {
    Local::now().format(MONTH_FORMAT).to_string()
}

/// Validate a user-supplied "YYYY-MM" key
pub fn parse_month(input: &str) -> Result<String> {
    let month = input.trim();
    let valid = month.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d").is_ok();

    if valid {
        Ok(month.to_string())
    } else {
        Err(StoreError::validation(format!(
            "month must look like YYYY-MM, got '{}'",
            input
        )))
    }
}

/// Format an amount for display: `format_money("P", 1234.5)` -> "P1,234.50"
pub fn format_money(currency: &str, value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}{}{}.{}", currency, sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ExpenseCategory;

    fn sale(date: &str, total: f64) -> Sale {
        Sale::new(date, "Latte", 1, total)
    }

    fn expense(date: &str, cost: f64) -> Expense {
        Expense::new(date, ExpenseCategory::Other, "Supplies", cost)
    }

    #[test]
    fn test_sales_total_only_counts_reference_month() {
        let sales = vec![
            sale("2024-05-01", 100.0),
            sale("2024-05-15", 50.0),
            sale("2024-06-01", 200.0),
        ];

        let report = compute_monthly_report(&sales, &[], "2024-05");

        assert_eq!(report.sales_total, 150.0);
        assert_eq!(report.sales_count, 2);
    }

    #[test]
    fn test_empty_inputs_give_zero_report() {
        let report = compute_monthly_report(&[], &[], "2024-05");

        assert_eq!(report.sales_total, 0.0);
        assert_eq!(report.expense_total, 0.0);
        assert_eq!(report.net_profit, 0.0);
        assert!(report.recent_sales.is_empty());
        assert!(report.recent_expenses.is_empty());
    }

    #[test]
    fn test_recent_expenses_newest_first_capped_at_five() {
        let expenses: Vec<Expense> = [30.0, 40.0, 50.0, 60.0, 70.0, 80.0]
            .iter()
            .enumerate()
            .map(|(i, cost)| expense(&format!("2024-05-0{}", i + 1), *cost))
            .collect();

        let report = compute_monthly_report(&[], &expenses, "2024-05");
        let costs: Vec<f64> = report.recent_expenses.iter().map(|e| e.cost).collect();

        assert_eq!(costs, vec![80.0, 70.0, 60.0, 50.0, 40.0]);
        assert_eq!(report.expense_total, 330.0);
    }

    #[test]
    fn test_net_profit_can_be_negative() {
        let sales = vec![sale("2024-05-03 10:00", 120.0)];
        let expenses = vec![expense("2024-05-02 09:00", 500.0)];

        let report = compute_monthly_report(&sales, &expenses, "2024-05");
        assert_eq!(report.net_profit, -380.0);
    }

    #[test]
    fn test_malformed_dates_excluded_from_totals_but_kept_in_recent() {
        let sales = vec![
            sale("2024-05-01 08:00", 100.0),
            sale("", 999.0),
            sale("05/02/2024", 999.0),
        ];

        let report = compute_monthly_report(&sales, &[], "2024-05");

        assert_eq!(report.sales_total, 100.0);
        assert_eq!(report.recent_sales.len(), 3);
        assert_eq!(report.recent_sales[0].date, "05/02/2024");
    }

    #[test]
    fn test_recent_ignores_month_filter() {
        let sales = vec![sale("2023-12-31 23:59", 10.0), sale("2024-05-01 08:00", 20.0)];

        let report = compute_monthly_report(&sales, &[], "2024-05");
        let dates: Vec<&str> = report.recent_sales.iter().map(|s| s.date.as_str()).collect();

        assert_eq!(dates, vec!["2024-05-01 08:00", "2023-12-31 23:59"]);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-05").unwrap(), "2024-05");
        assert_eq!(parse_month(" 2024-12 ").unwrap(), "2024-12");
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("2024-5").is_err());
        assert!(parse_month("").is_err());
    }

    #[test]
    fn test_current_month_shape() {
        let month = current_month();
        assert!(parse_month(&month).is_ok());
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("P", 0.0), "P0.00");
        assert_eq!(format_money("P", 150.0), "P150.00");
        assert_eq!(format_money("P", 1234.5), "P1,234.50");
        assert_eq!(format_money("P", 1234567.891), "P1,234,567.89");
        assert_eq!(format_money("$", -380.0), "$-380.00");
    }
}
