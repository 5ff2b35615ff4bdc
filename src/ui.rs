use anyhow::Result;
use cafe_pos::{
    format_money, ExpenseCategory, Menu, MonthlyReport, PointOfSale, PosConfig, RecordStore,
    StoreError, RECENT_LIMIT,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    NewOrder,
    LogExpense,
    Dashboard,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::NewOrder => Page::LogExpense,
            Page::LogExpense => Page::Dashboard,
            Page::Dashboard => Page::NewOrder,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::NewOrder => Page::Dashboard,
            Page::LogExpense => Page::NewOrder,
            Page::Dashboard => Page::LogExpense,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::NewOrder => "☕ New Order",
            Page::LogExpense => "📉 Log Expense",
            Page::Dashboard => "📊 Dashboard",
        }
    }
}

/// Text input currently receiving keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Price,
    ExpenseItem,
    ExpenseCost,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct OrderForm {
    pub menu_state: TableState,
    pub quantity: u32,
    pub price: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseForm {
    pub category: usize,
    pub item: String,
    pub cost: String,
}

impl ExpenseForm {
    pub fn category(&self) -> ExpenseCategory {
        ExpenseCategory::ALL[self.category % ExpenseCategory::ALL.len()]
    }
}

pub struct App<S: RecordStore> {
    pub pos: PointOfSale<S>,
    pub menu: Menu,
    pub currency: String,
    pub shop_name: String,
    pub current_page: Page,
    pub order: OrderForm,
    pub expense: ExpenseForm,
    pub editing: Option<Field>,
    pub notice: Option<Notice>,
    pub report: Option<MonthlyReport>,
    pub should_quit: bool,
}

impl<S: RecordStore> App<S> {
    pub fn new(pos: PointOfSale<S>, config: &PosConfig) -> Self {
        let mut menu_state = TableState::default();
        menu_state.select(Some(0));

        let price = config
            .menu
            .get(0)
            .map(|item| price_text(item.price))
            .unwrap_or_default();

        Self {
            pos,
            menu: config.menu.clone(),
            currency: config.shop.currency.clone(),
            shop_name: config.shop.name.clone(),
            current_page: Page::NewOrder,
            order: OrderForm {
                menu_state,
                quantity: 1,
                price,
            },
            expense: ExpenseForm::default(),
            editing: None,
            notice: None,
            report: None,
            should_quit: false,
        }
    }

    pub fn money(&self, value: f64) -> String {
        format_money(&self.currency, value)
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.order
            .menu_state
            .selected()
            .and_then(|i| self.menu.get(i))
            .map(|item| item.name.as_str())
    }

    /// Live "Total to Charge", if the price parses
    pub fn order_total(&self) -> Option<f64> {
        parse_price(&self.order.price).map(|p| f64::from(self.order.quantity) * p)
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if let Some(field) = self.editing {
            self.edit_field(field, key);
            return;
        }

        self.notice = None;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::BackTab => self.go_to(self.current_page.previous()),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.go_to(self.current_page.previous());
                } else {
                    self.go_to(self.current_page.next());
                }
            }
            _ => match self.current_page {
                Page::NewOrder => self.handle_order_key(key),
                Page::LogExpense => self.handle_expense_key(key),
                Page::Dashboard => self.handle_dashboard_key(key),
            },
        }
    }

    pub fn go_to(&mut self, page: Page) {
        self.current_page = page;
        if page == Page::Dashboard {
            self.load_dashboard();
        }
    }

    fn edit_field(&mut self, field: Field, key: KeyEvent) {
        let buffer = match field {
            Field::Price => &mut self.order.price,
            Field::ExpenseItem => &mut self.expense.item,
            Field::ExpenseCost => &mut self.expense.cost,
        };
        let numeric = field != Field::ExpenseItem;

        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Tab => self.editing = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) if !numeric || c.is_ascii_digit() || (c == '.' && !buffer.contains('.')) => {
                buffer.push(c);
            }
            _ => {}
        }
    }

    fn handle_order_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_menu_item(1),
            KeyCode::Up | KeyCode::Char('k') => self.select_menu_item(-1),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
                self.order.quantity = self.order.quantity.saturating_add(1);
            }
            KeyCode::Char('-') | KeyCode::Left => {
                self.order.quantity = self.order.quantity.saturating_sub(1).max(1);
            }
            KeyCode::Char('p') => self.editing = Some(Field::Price),
            KeyCode::Enter => self.submit_order(),
            _ => {}
        }
    }

    fn handle_expense_key(&mut self, key: KeyEvent) {
        let count = ExpenseCategory::ALL.len();
        match key.code {
            KeyCode::Right | KeyCode::Char('l') => {
                self.expense.category = (self.expense.category + 1) % count;
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.expense.category = (self.expense.category + count - 1) % count;
            }
            KeyCode::Char('i') => self.editing = Some(Field::ExpenseItem),
            KeyCode::Char('c') => self.editing = Some(Field::ExpenseCost),
            KeyCode::Enter => self.submit_expense(),
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('r') {
            self.pos.refresh();
            self.load_dashboard();
            if self.notice.is_none() {
                self.notice = Some(Notice::Success("Data refreshed".to_string()));
            }
        }
    }

    /// Move the menu selection, wrapping, and reset the price to the menu price
    fn select_menu_item(&mut self, step: isize) {
        let len = self.menu.len();
        if len == 0 {
            return;
        }

        let current = self.order.menu_state.selected().unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(len as isize) as usize;
        self.order.menu_state.select(Some(next));

        if let Some(item) = self.menu.get(next) {
            self.order.price = price_text(item.price);
        }
    }

    fn submit_order(&mut self) {
        let Some(item) = self.selected_item().map(str::to_string) else {
            self.notice = Some(Notice::Warning("Select an item first.".to_string()));
            return;
        };
        let Some(price) = parse_price(&self.order.price) else {
            self.notice = Some(Notice::Warning("Price must be a number.".to_string()));
            return;
        };

        let quantity = self.order.quantity;
        self.notice = Some(match self.pos.submit_sale(&item, quantity, price) {
            Ok(sale) => Notice::Success(format!(
                "✅ Sold: {}x {} for {}!",
                sale.quantity,
                sale.item,
                self.money(sale.total)
            )),
            Err(e) => failure_notice(e),
        });
    }

    fn submit_expense(&mut self) {
        let cost = if self.expense.cost.trim().is_empty() {
            Some(0.0)
        } else {
            parse_price(&self.expense.cost)
        };
        let Some(cost) = cost else {
            self.notice = Some(Notice::Warning("Cost must be a number.".to_string()));
            return;
        };

        let category = self.expense.category();
        let item = self.expense.item.clone();
        self.notice = Some(match self.pos.submit_expense(category, &item, cost) {
            Ok(expense) => {
                self.expense.item.clear();
                self.expense.cost.clear();
                Notice::Success(format!("✅ Saved Expense: {}", expense.item))
            }
            Err(StoreError::Validation(_)) => {
                Notice::Warning("Please fill in item name and cost.".to_string())
            }
            Err(e) => failure_notice(e),
        });
    }

    pub fn load_dashboard(&mut self) {
        match self.pos.dashboard() {
            Ok(report) => self.report = Some(report),
            Err(e) => {
                error!(error = %e, "dashboard load failed");
                self.notice = Some(Notice::Error(format!("Error: {}", e)));
            }
        }
    }
}

fn failure_notice(e: StoreError) -> Notice {
    if e.is_validation() {
        Notice::Warning(e.to_string())
    } else {
        error!(error = %e, "submission failed");
        Notice::Error(format!("Error: {}", e))
    }
}

fn parse_price(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|p| p.is_finite())
}

fn price_text(price: f64) -> String {
    price.to_string()
}

pub fn run_ui<S: RecordStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: RecordStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    while !app.should_quit {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                app.handle_key(key);
            }
        }
    }
    Ok(())
}

fn ui<S: RecordStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::NewOrder => render_new_order(f, chunks[1], app),
        Page::LogExpense => render_log_expense(f, chunks[1], app),
        Page::Dashboard => render_dashboard(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let pages = [Page::NewOrder, Page::LogExpense, Page::Dashboard];

    let mut tab_spans = vec![Span::styled(
        format!("{}  ", app.shop_name),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.pos.clock().timestamp(),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_new_order<S: RecordStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let header = Row::new(["Item", "Price"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = app
        .menu
        .iter()
        .map(|(name, price)| {
            Row::new(vec![
                Cell::from(name.to_string()),
                Cell::from(format_money(&app.currency, price)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(22), Constraint::Length(14)])
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Select Item "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, columns[0], &mut app.order.menu_state);

    let total = app
        .order_total()
        .map(|t| app.money(t))
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("  Item:      "),
            Span::styled(
                app.selected_item().unwrap_or("-").to_string(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("  Quantity:  "),
            Span::styled(app.order.quantity.to_string(), Style::default().fg(Color::Cyan)),
            Span::styled("   (-/+)", Style::default().fg(Color::DarkGray)),
        ]),
        field_line("  Price:     ", &app.order.price, app.editing == Some(Field::Price), "p"),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Total to Charge: "),
            Span::styled(total, Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" Record Sale"),
        ]),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" New Order "),
    );

    f.render_widget(form, columns[1]);
}

fn render_log_expense<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let selected = app.expense.category();

    let mut category_spans = vec![Span::raw("  Category:  ")];
    for (i, category) in ExpenseCategory::ALL.iter().enumerate() {
        if i > 0 {
            category_spans.push(Span::raw("  "));
        }
        let style = if *category == selected {
            Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        category_spans.push(Span::styled(format!(" {} ", category), style));
    }
    category_spans.push(Span::styled("   (←/→)", Style::default().fg(Color::DarkGray)));

    let lines = vec![
        Line::from(""),
        Line::from(category_spans),
        Line::from(""),
        field_line(
            "  Item Description: ",
            &app.expense.item,
            app.editing == Some(Field::ExpenseItem),
            "i",
        ),
        field_line(
            "  Total Cost:       ",
            &app.expense.cost,
            app.editing == Some(Field::ExpenseCost),
            "c",
        ),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" Save Expense"),
        ]),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Log Expense "),
    );

    f.render_widget(form, area);
}

fn field_line<'a>(label: &'a str, value: &str, editing: bool, key: &'a str) -> Line<'a> {
    let (text, style) = if editing {
        (format!("{}▏", value), Style::default().fg(Color::Black).bg(Color::Cyan))
    } else {
        (value.to_string(), Style::default().fg(Color::Cyan))
    };

    Line::from(vec![
        Span::raw(label),
        Span::styled(text, style),
        Span::styled(format!("   ({} edit)", key), Style::default().fg(Color::DarkGray)),
    ])
}

fn render_dashboard<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let Some(report) = app.report.as_ref() else {
        let empty = Paragraph::new("  No data loaded. Press r to refresh.")
            .block(Block::default().borders(Borders::ALL).title(" Profit Dashboard "));
        f.render_widget(empty, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(rows[0]);

    let net_color = if report.net_profit < 0.0 { Color::Red } else { Color::Green };
    let scorecard = [
        ("Sales (Month)", report.sales_total, Color::Green),
        ("Expenses (Month)", report.expense_total, Color::Red),
        ("Net Profit", report.net_profit, net_color),
    ];

    for (i, (label, value, color)) in scorecard.iter().enumerate() {
        let card = Paragraph::new(vec![Line::from(Span::styled(
            format!("  {}", app.money(*value)),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        ))])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} · {} ", label, report.reference_month)),
        );
        f.render_widget(card, cards[i]);
    }

    let tables = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let sales = report
        .recent_sales
        .iter()
        .map(|s| (s.date.as_str(), s.item.as_str(), s.total));
    render_recent(f, tables[0], app, &format!(" Last {} Sales ", RECENT_LIMIT), "Total", sales);

    let expenses = report
        .recent_expenses
        .iter()
        .map(|e| (e.date.as_str(), e.item.as_str(), e.cost));
    render_recent(f, tables[1], app, &format!(" Last {} Expenses ", RECENT_LIMIT), "Cost", expenses);
}

fn render_recent<'a, S: RecordStore>(
    f: &mut Frame,
    area: Rect,
    app: &App<S>,
    title: &str,
    amount_header: &str,
    records: impl Iterator<Item = (&'a str, &'a str, f64)>,
) {
    let header = Row::new(["Date", "Item", amount_header].into_iter().map(|h| {
        Cell::from(h.to_string()).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = records
        .map(|(date, item, amount)| {
            Row::new(vec![
                Cell::from(date.to_string()),
                Cell::from(truncate(item, 24)),
                Cell::from(app.money(amount)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(17), Constraint::Length(25), Constraint::Length(14)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title.to_string()),
    );

    f.render_widget(table, area);
}

fn render_status_bar<S: RecordStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let status_spans = match &app.notice {
        Some(Notice::Success(msg)) => vec![Span::styled(format!(" {}", msg), Style::default().fg(Color::Green))],
        Some(Notice::Warning(msg)) => vec![Span::styled(format!(" ⚠ {}", msg), Style::default().fg(Color::Yellow))],
        Some(Notice::Error(msg)) => vec![Span::styled(format!(" ❌ {}", msg), Style::default().fg(Color::Red))],
        None => key_hints(app),
    };

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn key_hints<S: RecordStore>(app: &App<S>) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled(" Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
    ];

    match app.current_page {
        Page::NewOrder => {
            spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" Item | "));
        }
        Page::LogExpense => {
            spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" Category | "));
        }
        Page::Dashboard => {
            spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(" Refresh Data | "));
        }
    }

    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));
    spans
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_pos::{FixedClock, MemoryStore};
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    fn app() -> App<MemoryStore> {
        let at = NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let pos = PointOfSale::with_clock(MemoryStore::new(), Box::new(FixedClock(at))).unwrap();
        App::new(pos, &PosConfig::default())
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_tab_cycles_pages() {
        let mut app = app();
        assert_eq!(app.current_page, Page::NewOrder);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::LogExpense);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Dashboard);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_page, Page::LogExpense);
    }

    #[test]
    fn test_selecting_item_resets_price() {
        let mut app = app();
        assert_eq!(app.selected_item(), Some("Espresso"));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_item(), Some("Latte"));
        assert_eq!(app.order.price, "150");

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_item(), Some("Cookie"), "selection wraps");
    }

    #[test]
    fn test_quantity_never_drops_below_one() {
        let mut app = app();
        press(&mut app, KeyCode::Char('-'));
        assert_eq!(app.order.quantity, 1);

        press(&mut app, KeyCode::Char('+'));
        press(&mut app, KeyCode::Char('+'));
        assert_eq!(app.order.quantity, 3);
        assert_eq!(app.order_total(), Some(360.0));
    }

    #[test]
    fn test_record_sale_with_edited_price() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "99.5x");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.order.price, "99.5");

        press(&mut app, KeyCode::Enter);

        assert_eq!(app.pos.store().row_count("Sales"), 1);
        assert!(matches!(app.notice, Some(Notice::Success(ref m)) if m.contains("Espresso")));
    }

    #[test]
    fn test_expense_without_item_warns_and_keeps_input() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "250");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Enter);

        assert_eq!(
            app.notice,
            Some(Notice::Warning("Please fill in item name and cost.".to_string()))
        );
        assert_eq!(app.expense.cost, "250");
        assert_eq!(app.pos.store().append_calls(), 0);
    }

    #[test]
    fn test_log_expense_then_dashboard_shows_it() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.expense.category(), ExpenseCategory::Milk);

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "Oat milk q");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "320");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        assert!(app.expense.item.is_empty(), "form clears after saving");
        assert!(!app.should_quit, "q typed into a field does not quit");

        press(&mut app, KeyCode::Tab);
        let report = app.report.as_ref().unwrap();
        assert_eq!(report.expense_total, 320.0);
        assert_eq!(report.net_profit, -320.0);
        assert_eq!(report.recent_expenses[0].item, "Oat milk q");
    }

    #[test]
    fn test_refresh_rereads_store() {
        let mut app = app();
        app.go_to(Page::Dashboard);
        let reads = app.pos.store().read_calls();

        press(&mut app, KeyCode::Char('r'));

        assert_eq!(app.pos.store().read_calls(), reads + 2);
        assert_eq!(app.notice, Some(Notice::Success("Data refreshed".to_string())));
    }

    #[test]
    fn test_every_page_renders() {
        let mut app = app();
        app.pos.submit_sale("Latte", 2, 150.0).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();

        for page in [Page::NewOrder, Page::LogExpense, Page::Dashboard] {
            app.go_to(page);
            terminal.draw(|f| ui(f, &mut app)).unwrap();
        }

        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("P300.00"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Beans", 10), "Beans");
        assert_eq!(truncate("Spanish Latte Extra Large", 10), "Spanish...");
    }

    #[test]
    fn test_next_key_clears_notice() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.notice, Some(Notice::Success(_))));

        press(&mut app, KeyCode::Down);
        assert_eq!(app.notice, None);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Quit"), "key hints are back");
    }
}
