//! Main application state and TUI event loop for the dashboard.
//!
//! [`App`] owns the theme, the active view, the selected date range and the
//! latest [`AnalysisResult`]. Every range change re-runs the pipeline on the
//! already-joined records before the next frame is drawn.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing::{debug, info};

use dashboard_core::formatting::CurrencyFormat;
use dashboard_core::models::DateRange;
use dashboard_core::time_utils::{end_of_day, format_date, shift_days, start_of_day};
use dashboard_data::analysis::{analyze_joined, default_range, AnalysisResult, JoinedData};

use crate::components::header::Header;
use crate::dashboard_view;
use crate::table_view;
use crate::themes::Theme;

// ── ViewMode ──────────────────────────────────────────────────────────────────

/// Which tab the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// All dashboard sections on one scrollable screen.
    Overview,
    /// Full daily orders table.
    Daily,
    /// Full per-customer RFM table.
    Customers,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Overview, ViewMode::Daily, ViewMode::Customers];

    pub fn title(&self) -> &'static str {
        match self {
            ViewMode::Overview => "Overview",
            ViewMode::Daily => "Daily Orders",
            ViewMode::Customers => "Customers (RFM)",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ViewMode::Overview => ViewMode::Daily,
            ViewMode::Daily => ViewMode::Customers,
            ViewMode::Customers => ViewMode::Overview,
        }
    }
}

/// Whether keys drive the dashboard or type into the feedback box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Feedback,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    pub theme: Theme,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub currency: CurrencyFormat,
    /// Shown in the header; usually the data directory.
    pub source_label: String,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Currently selected range, `None` only when there is no data at all.
    pub range: Option<DateRange>,
    pub result: AnalysisResult,
    /// Text typed into the feedback box so far.
    pub feedback_draft: String,
    /// Echo of the last submitted feedback, e.g. `"Feedback: great"`.
    pub last_feedback: Option<String>,
    /// Vertical scroll offset of the active view.
    pub scroll: u16,
    joined: JoinedData,
}

impl App {
    /// Build the app and run the pipeline once for `range`.
    ///
    /// `None` selects the full available range.
    pub fn new(
        joined: JoinedData,
        range: Option<DateRange>,
        theme_name: &str,
        currency: CurrencyFormat,
        source_label: String,
    ) -> Self {
        let range = range.or_else(|| default_range(&joined));
        let result = analyze_joined(&joined, range);
        Self {
            theme: Theme::from_name(theme_name),
            view_mode: ViewMode::Overview,
            input_mode: InputMode::Normal,
            currency,
            source_label,
            should_quit: false,
            range,
            result,
            feedback_draft: String::new(),
            last_feedback: None,
            scroll: 0,
            joined,
        }
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the dashboard until `q` or `Ctrl+C`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout; all work happens
    /// on the current thread.
    pub fn run(mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key)
                    }
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    /// Apply one key press to the application state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.input_mode {
            InputMode::Feedback => self.handle_feedback_key(key.code),
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Tab => {
                self.view_mode = self.view_mode.next();
                self.scroll = 0;
            }
            KeyCode::Char('[') => self.shift_start(-1),
            KeyCode::Char(']') => self.shift_start(1),
            KeyCode::Char('{') => self.shift_end(-1),
            KeyCode::Char('}') => self.shift_end(1),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset_range(),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.input_mode = InputMode::Feedback;
                self.feedback_draft.clear();
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::Home => self.scroll = 0,
            _ => {}
        }
    }

    fn handle_feedback_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.submit_feedback(),
            KeyCode::Esc => {
                self.feedback_draft.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.feedback_draft.pop();
            }
            KeyCode::Char(c) => self.feedback_draft.push(c),
            _ => {}
        }
    }

    /// Echo and log the feedback draft, then leave feedback mode.
    ///
    /// Blank feedback is discarded.
    pub fn submit_feedback(&mut self) {
        let text = self.feedback_draft.trim().to_string();
        if !text.is_empty() {
            info!(feedback = %text, "feedback submitted");
            self.last_feedback = Some(format!("Feedback: {}", text));
        }
        self.feedback_draft.clear();
        self.input_mode = InputMode::Normal;
    }

    // ── Range control ─────────────────────────────────────────────────────────

    /// Move the range start by `days`, staying inside the available days.
    pub fn shift_start(&mut self, days: i64) {
        let (Some(range), Some(avail)) = (self.range, self.joined.available) else {
            return;
        };
        let latest = start_of_day(avail.end.date());
        let start = shift_days(range.start, days).clamp(avail.start, latest);
        self.set_range(DateRange::new(start, range.end));
    }

    /// Move the range end by `days`, staying inside the available days.
    pub fn shift_end(&mut self, days: i64) {
        let (Some(range), Some(avail)) = (self.range, self.joined.available) else {
            return;
        };
        let earliest = end_of_day(avail.start.date());
        let end = shift_days(range.end, days).clamp(earliest, avail.end);
        self.set_range(DateRange::new(range.start, end));
    }

    /// Go back to the full available range.
    pub fn reset_range(&mut self) {
        if let Some(avail) = self.joined.available {
            self.set_range(avail);
        }
    }

    fn set_range(&mut self, range: DateRange) {
        if self.range == Some(range) {
            return;
        }
        debug!("range changed to {} .. {}", range.start, range.end);
        self.range = Some(range);
        self.result = analyze_joined(&self.joined, self.range);
    }

    /// Active range as `"YYYY-MM-DD → YYYY-MM-DD"`.
    pub fn range_label(&self) -> String {
        match self.range {
            Some(r) => format!("{} → {}", format_date(r.start), format_date(r.end)),
            None => "no data".to_string(),
        }
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let footer_height = match self.input_mode {
            InputMode::Feedback => 3,
            InputMode::Normal => 1,
        };
        let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(footer_height),
        ])
        .areas(frame.area());

        let range_label = self.range_label();
        let header = Header::new(
            &self.source_label,
            &range_label,
            &self.currency.code,
            &self.theme,
        );
        frame.render_widget(Paragraph::new(header.to_lines()), header_area);

        frame.render_widget(Paragraph::new(self.tab_line()), tabs_area);
        self.render_body(frame, body_area);
        self.render_footer(frame, footer_area);
    }

    fn tab_line(&self) -> Line<'static> {
        let mut spans = Vec::new();
        for mode in ViewMode::ALL {
            spans.push(Span::styled(
                format!(" {} ", mode.title()),
                self.theme.tab_style(mode == self.view_mode),
            ));
            spans.push(Span::raw(" "));
        }
        Line::from(spans)
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        if self.result.is_empty() {
            table_view::render_no_data(frame, area, &self.theme);
            return;
        }
        match self.view_mode {
            ViewMode::Overview => dashboard_view::render_overview(
                frame,
                area,
                &self.result,
                &self.currency,
                self.scroll,
                &self.theme,
            ),
            ViewMode::Daily => table_view::render_daily_table(
                frame,
                area,
                &self.result.daily_orders,
                &self.currency,
                self.scroll as usize,
                &self.theme,
            ),
            ViewMode::Customers => table_view::render_rfm_table(
                frame,
                area,
                &self.result.rfm,
                &self.currency,
                self.scroll as usize,
                &self.theme,
            ),
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        match self.input_mode {
            InputMode::Feedback => {
                let input = Paragraph::new(Line::from(vec![
                    Span::styled(self.feedback_draft.clone(), self.theme.input),
                    Span::styled("_", self.theme.dim),
                ]))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(self.theme.input_border)
                        .title(" Feedback (Enter to submit, Esc to cancel) "),
                );
                frame.render_widget(input, area);
            }
            InputMode::Normal => {
                let mut spans = vec![Span::styled(
                    "Tab view  [ ] start  { } end  r reset  f feedback  q quit",
                    self.theme.dim,
                )];
                if let Some(ref echo) = self.last_feedback {
                    spans.push(Span::styled("   ", self.theme.dim));
                    spans.push(Span::styled(echo.clone(), self.theme.success));
                }
                frame.render_widget(Paragraph::new(Line::from(spans)), area);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use dashboard_core::models::{Customer, Dataset, Order, OrderItem, Product, RawId};
    use dashboard_data::analysis::join_dataset;
    use ratatui::backend::TestBackend;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 5, d).unwrap()
    }

    fn midnight(d: u32) -> NaiveDateTime {
        start_of_day(day(d))
    }

    fn order(id: &str, customer: &str, d: u32) -> Order {
        Order {
            order_id: Some(RawId::from(id)),
            customer_id: Some(RawId::from(customer)),
            order_purchase_timestamp: Some(format!("2018-05-{:02} 09:00:00", d)),
            order_approved_at: Some(format!("2018-05-{:02} 10:00:00", d)),
        }
    }

    fn joined() -> JoinedData {
        let dataset = Dataset {
            orders: vec![order("o1", "c1", 1), order("o2", "c2", 3), order("o3", "c1", 5)],
            order_items: ["o1", "o2", "o3"]
                .iter()
                .map(|o| OrderItem {
                    order_id: Some(RawId::from(*o)),
                    product_id: Some(RawId::from("p1")),
                    price: 10.0,
                    freight_value: 0.0,
                })
                .collect(),
            products: vec![Product {
                product_id: Some(RawId::from("p1")),
                product_category_name: Some("toys".to_string()),
                product_photos_qty: Some(1),
            }],
            customers: vec![
                Customer {
                    customer_id: Some(RawId::from("c1")),
                    customer_city: Some("recife".to_string()),
                },
                Customer {
                    customer_id: Some(RawId::from("c2")),
                    customer_city: Some("natal".to_string()),
                },
            ],
        };
        join_dataset(&dataset)
    }

    fn app() -> App {
        App::new(
            joined(),
            None,
            "dark",
            CurrencyFormat::default(),
            "./data".to_string(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    // ── ViewMode ──────────────────────────────────────────────────────────────

    #[test]
    fn test_view_mode_cycles() {
        assert_eq!(ViewMode::Overview.next(), ViewMode::Daily);
        assert_eq!(ViewMode::Daily.next(), ViewMode::Customers);
        assert_eq!(ViewMode::Customers.next(), ViewMode::Overview);
    }

    // ── App::new ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_starts_on_full_range() {
        let app = app();
        assert_eq!(app.view_mode, ViewMode::Overview);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.should_quit);
        assert_eq!(app.range.unwrap().start, midnight(1));
        assert_eq!(app.result.summary.total_orders, 3);
        assert_eq!(app.range_label(), "2018-05-01 → 2018-05-05");
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_quit_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('q'));
        assert!(a.should_quit);

        let mut b = app();
        b.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(b.should_quit);
    }

    #[test]
    fn test_tab_switches_view_and_resets_scroll() {
        let mut app = app();
        press(&mut app, KeyCode::Down);
        assert_eq!(app.scroll, 1);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view_mode, ViewMode::Daily);
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn test_shift_start_reruns_pipeline() {
        let mut app = app();
        press(&mut app, KeyCode::Char(']'));
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.range.unwrap().start, midnight(3));
        assert_eq!(app.result.summary.total_orders, 2);
    }

    #[test]
    fn test_opening_range_includes_unapproved_purchases() {
        let mut data = joined();
        let mut late = data.records[0].clone();
        late.order_id = "o9".to_string();
        late.purchased_at = Some(midnight(7));
        late.approved_at = None;
        data.records.push(late);
        data.available = dashboard_data::analysis::available_range(&data.records);

        let app = App::new(data, None, "dark", CurrencyFormat::default(), String::new());
        assert_eq!(app.range.unwrap().end.date(), day(7));
        assert_eq!(app.result.metadata.records_filtered, 4);
    }

    #[test]
    fn test_shift_start_bounded_by_available_range() {
        let mut app = app();
        press(&mut app, KeyCode::Char('['));
        assert_eq!(app.range.unwrap().start, midnight(1));
        for _ in 0..10 {
            press(&mut app, KeyCode::Char(']'));
        }
        assert_eq!(app.range.unwrap().start, midnight(5));
    }

    #[test]
    fn test_shift_end_and_reset() {
        let mut app = app();
        press(&mut app, KeyCode::Char('{'));
        press(&mut app, KeyCode::Char('{'));
        assert_eq!(app.range.unwrap().end.date(), day(3));
        assert_eq!(app.result.summary.total_orders, 2);

        press(&mut app, KeyCode::Char('}'));
        press(&mut app, KeyCode::Char('}'));
        press(&mut app, KeyCode::Char('}'));
        assert_eq!(app.range.unwrap().end.date(), day(5));

        press(&mut app, KeyCode::Char('{'));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.range, app.result.available);
        assert_eq!(app.result.summary.total_orders, 3);
    }

    #[test]
    fn test_crossed_range_shows_empty_result() {
        let mut app = app();
        for _ in 0..4 {
            press(&mut app, KeyCode::Char(']'));
            press(&mut app, KeyCode::Char('{'));
        }
        let range = app.range.unwrap();
        assert!(range.start > range.end);
        assert!(app.result.is_empty());
    }

    // ── Feedback ──────────────────────────────────────────────────────────────

    #[test]
    fn test_feedback_submit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        assert_eq!(app.input_mode, InputMode::Feedback);

        // Keys that normally act on the dashboard are typed instead.
        type_text(&mut app, "nice q");
        press(&mut app, KeyCode::Backspace);
        assert!(!app.should_quit);
        assert_eq!(app.feedback_draft, "nice ");

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.last_feedback.as_deref(), Some("Feedback: nice"));
        assert!(app.feedback_draft.is_empty());
    }

    #[test]
    fn test_feedback_cancel_and_blank() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        type_text(&mut app, "draft");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.last_feedback.is_none());

        press(&mut app, KeyCode::Char('f'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.last_feedback.is_none());
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_render_every_view() {
        let mut app = app();
        for _ in ViewMode::ALL {
            let text = draw(&app, 100, 40);
            assert!(text.contains("E-COMMERCE DASHBOARD"));
            assert!(text.contains(app.view_mode.title()));
            press(&mut app, KeyCode::Tab);
        }
    }

    #[test]
    fn test_render_feedback_box_and_echo() {
        let mut app = app();
        press(&mut app, KeyCode::Char('f'));
        type_text(&mut app, "hello");
        assert!(draw(&app, 100, 30).contains("Feedback (Enter to submit"));

        press(&mut app, KeyCode::Enter);
        assert!(draw(&app, 100, 30).contains("Feedback: hello"));
    }

    #[test]
    fn test_render_empty_data() {
        let app = App::new(
            join_dataset(&Dataset::default()),
            None,
            "light",
            CurrencyFormat::default(),
            "./empty".to_string(),
        );
        assert!(app.range.is_none());
        assert!(draw(&app, 80, 20).contains("No orders in the selected range"));
    }
}
