// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// Use library instead of local modules
use cafe_pos::{
    format_money, open_store, parse_month, ExpenseCategory, MonthlyReport, PointOfSale, PosConfig,
    RecordStore,
};

/// Point of sale and expense log for a small cafe
#[derive(Debug, Parser)]
#[command(name = "cafe-pos", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Extra config file layered over ./cafe-pos.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Terminal UI: New Order, Log Expense, Dashboard (default)
    Ui,
    /// Create the Sales and Expenses stores if missing, then exit
    Init,
    /// Record a sale
    Sale {
        /// Menu item name
        #[arg(long)]
        item: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        qty: u32,
        /// Unit price (defaults to the menu price)
        #[arg(long)]
        price: Option<f64>,
    },
    /// Log an expense
    Expense {
        /// Beans, Milk, Ice, Cups or Other
        #[arg(long)]
        category: ExpenseCategory,
        #[arg(long)]
        item: String,
        #[arg(long)]
        cost: f64,
    },
    /// Print the monthly profit report
    Report {
        /// YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the configured menu
    Menu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = PosConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Ui) {
        Command::Ui => {
            // Logs go to a file so they don't draw over the terminal UI
            init_tracing(cli.verbose, Some(&config.log_path()))?;
            run_ui_mode(&config)?;
        }
        Command::Init => {
            init_tracing(cli.verbose, None)?;
            run_init(&config)?;
        }
        Command::Sale { item, qty, price } => {
            init_tracing(cli.verbose, None)?;
            run_sale(&config, &item, qty, price)?;
        }
        Command::Expense { category, item, cost } => {
            init_tracing(cli.verbose, None)?;
            run_expense(&config, category, &item, cost)?;
        }
        Command::Report { month, json } => {
            init_tracing(cli.verbose, None)?;
            run_report(&config, month.as_deref(), json)?;
        }
        Command::Menu => print_menu(&config),
    }

    Ok(())
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CAFE_POS_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))
}

/// Open the configured store and bootstrap both record stores.
/// A failure here is fatal: nothing else can work without the stores.
fn open_pos(config: &PosConfig) -> Result<PointOfSale<Box<dyn RecordStore + Send>>> {
    let store = open_store(&config.store).context("❌ Connection Error")?;
    PointOfSale::open(store).context("❌ Connection Error")
}

fn run_init(config: &PosConfig) -> Result<()> {
    let pos = open_pos(config)?;
    println!("✅ System Online ({} store)", pos.store().backend_name());
    Ok(())
}

fn run_sale(config: &PosConfig, item: &str, qty: u32, price: Option<f64>) -> Result<()> {
    let menu_item = config.menu.find(item);
    let name = menu_item.map(|m| m.name.as_str()).unwrap_or(item);

    let unit_price = match (price, menu_item) {
        (Some(p), _) => p,
        (None, Some(m)) => m.price,
        (None, None) => bail!("'{}' is not on the menu; pass --price", item),
    };

    let mut pos = open_pos(config)?;
    let sale = pos.submit_sale(name, qty, unit_price)?;

    println!(
        "✅ Sold: {}x {} for {}",
        sale.quantity,
        sale.item,
        format_money(&config.shop.currency, sale.total)
    );
    Ok(())
}

fn run_expense(config: &PosConfig, category: ExpenseCategory, item: &str, cost: f64) -> Result<()> {
    let mut pos = open_pos(config)?;
    let expense = pos.submit_expense(category, item, cost)?;

    println!("✅ Saved Expense: {}", expense.item);
    Ok(())
}

fn run_report(config: &PosConfig, month: Option<&str>, json: bool) -> Result<()> {
    let mut pos = open_pos(config)?;

    let report = match month {
        Some(m) => pos.report_for(&parse_month(m)?)?,
        None => pos.dashboard()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &config.shop.currency);
    }
    Ok(())
}

fn print_report(report: &MonthlyReport, currency: &str) {
    println!("📊 Profit Dashboard - {}", report.reference_month);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Sales (Month)     {:>16}", format_money(currency, report.sales_total));
    println!("  Expenses (Month)  {:>16}", format_money(currency, report.expense_total));
    println!("  Net Profit        {:>16}", format_money(currency, report.net_profit));

    println!("\nLast {} Sales", cafe_pos::RECENT_LIMIT);
    for sale in &report.recent_sales {
        println!(
            "  {:<18} {:<20} {:>14}",
            sale.date,
            sale.item,
            format_money(currency, sale.total)
        );
    }

    println!("\nLast {} Expenses", cafe_pos::RECENT_LIMIT);
    for expense in &report.recent_expenses {
        println!(
            "  {:<18} {:<20} {:>14}",
            expense.date,
            expense.item,
            format_money(currency, expense.cost)
        );
    }
}

fn print_menu(config: &PosConfig) {
    println!("☕ {} menu", config.shop.name);
    for (name, price) in config.menu.iter() {
        println!("  {:<20} {:>10}", name, format_money(&config.shop.currency, price));
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &PosConfig) -> Result<()> {
    let pos = open_pos(config)?;

    let mut app = ui::App::new(pos, config);
    ui::run_ui(&mut app)?;

    println!("✅ {} closed", config.shop.name);
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &PosConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin cafe-server --features server");
    std::process::exit(1);
}
