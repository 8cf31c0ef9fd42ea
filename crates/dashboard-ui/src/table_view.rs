//! Full-table views (daily orders and customer RFM) for the dashboard TUI.
//!
//! Renders a bordered [`ratatui::widgets::Table`]; the daily table ends with
//! a highlighted totals row.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use dashboard_core::formatting::{format_count, CurrencyFormat};
use dashboard_core::models::{CustomerRfm, DailyOrders};

use crate::themes::Theme;

/// Totals shown under the daily table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyTotals {
    pub days: usize,
    pub order_count: u64,
    pub revenue: f64,
}

impl DailyTotals {
    pub fn from_rows(rows: &[DailyOrders]) -> Self {
        Self {
            days: rows.len(),
            order_count: rows.iter().map(|r| r.order_count).sum(),
            revenue: rows.iter().map(|r| r.revenue).sum(),
        }
    }
}

fn row_style(i: usize, theme: &Theme) -> ratatui::style::Style {
    if i % 2 == 0 {
        theme.table_row
    } else {
        theme.table_row_alt
    }
}

/// Render the daily orders table into `area`, starting at row `offset`.
pub fn render_daily_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[DailyOrders],
    currency: &CurrencyFormat,
    offset: usize,
    theme: &Theme,
) {
    let header = Row::new(
        ["Date", "Orders", "Revenue"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    let mut all_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.date.format("%Y-%m-%d").to_string()),
                Cell::from(format_count(row.order_count)),
                Cell::from(currency.format(row.revenue)),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    let totals = DailyTotals::from_rows(rows);
    all_rows.push(
        Row::new(vec![
            Cell::from(format!("TOTAL ({} days)", totals.days)),
            Cell::from(format_count(totals.order_count)),
            Cell::from(currency.format(totals.revenue)),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(18),
        Constraint::Length(10),
        Constraint::Min(20),
    ];

    let table = Table::new(all_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Daily Orders "),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render the per-customer RFM table into `area`, starting at row `offset`.
pub fn render_rfm_table(
    frame: &mut Frame,
    area: Rect,
    rows: &[CustomerRfm],
    currency: &CurrencyFormat,
    offset: usize,
    theme: &Theme,
) {
    let header = Row::new(
        ["Customer", "Recency (days)", "Frequency", "Monetary"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header)),
    )
    .height(1);

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, row)| {
            Row::new(vec![
                Cell::from(row.customer_id.clone()),
                Cell::from(row.recency.to_string()),
                Cell::from(format_count(row.frequency)),
                Cell::from(currency.format(row.monetary)),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    let widths = [
        Constraint::Length(34),
        Constraint::Length(16),
        Constraint::Length(11),
        Constraint::Min(20),
    ];

    let table = Table::new(data_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" Customers ({}) ", format_count(rows.len() as u64))),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a "no data" placeholder when the range selects nothing.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No orders in the selected range", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Press [ ] { } to move the range, r to reset",
            theme.dim,
        )),
    ];
    frame.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" E-Commerce Dashboard "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
