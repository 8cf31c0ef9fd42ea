//! Overview screen: daily orders, product rankings, customer cities and RFM
//! averages stacked top to bottom.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use dashboard_core::formatting::{format_count, format_number_in, CurrencyFormat};
use dashboard_core::models::{label_or_unknown, CategorySales, CityCustomers};
use dashboard_data::analysis::AnalysisResult;

use crate::components::bar_list::{BarEntry, BarList};
use crate::components::metrics::{Metric, MetricRow};
use crate::themes::Theme;

/// How many entries each ranking shows.
pub const RANKING_SIZE: usize = 5;

const TREND_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

// ── Trend ─────────────────────────────────────────────────────────────────────

/// Draw `values` as a one-line block sparkline at most `width` cells wide.
///
/// Longer series are split into `width` consecutive buckets and each bucket
/// is summed. Zero buckets draw as a space.
pub fn trend_line(values: &[u64], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let buckets: Vec<u64> = if values.len() <= width {
        values.to_vec()
    } else {
        (0..width)
            .map(|b| {
                let lo = b * values.len() / width;
                let hi = (b + 1) * values.len() / width;
                values[lo..hi].iter().sum()
            })
            .collect()
    };

    let max = buckets.iter().copied().max().unwrap_or(0);
    buckets
        .iter()
        .map(|&v| {
            if v == 0 || max == 0 {
                ' '
            } else {
                let level = (v * (TREND_LEVELS.len() as u64 - 1)).div_ceil(max) as usize;
                TREND_LEVELS[level.min(TREND_LEVELS.len() - 1)]
            }
        })
        .collect()
}

// ── Section builders ──────────────────────────────────────────────────────────

fn section(title: &'static str, theme: &Theme) -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(title, theme.section)), Line::from("")]
}

fn category_entries(view: &[CategorySales]) -> Vec<BarEntry> {
    view.iter()
        .map(|c| {
            BarEntry::new(
                label_or_unknown(c.category.as_deref()),
                c.photos_qty as f64,
                format_count(c.photos_qty),
            )
        })
        .collect()
}

fn city_entries(view: &[CityCustomers]) -> Vec<BarEntry> {
    view.iter()
        .map(|c| {
            BarEntry::new(
                label_or_unknown(c.city.as_deref()),
                c.customer_count as f64,
                format_count(c.customer_count),
            )
        })
        .collect()
}

fn bars(entries: &[BarEntry], theme: &Theme, bar_width: u16) -> Vec<Line<'static>> {
    if entries.is_empty() {
        return vec![Line::from(Span::styled("  no data", theme.dim))];
    }
    BarList::new(entries, theme).with_width(bar_width).to_lines()
}

/// Build every line of the overview for a viewport `width` columns wide.
pub fn build_overview_lines(
    result: &AnalysisResult,
    currency: &CurrencyFormat,
    theme: &Theme,
    width: u16,
) -> Vec<Line<'static>> {
    let locale = currency.locale;
    let bar_width = width.saturating_sub(50).clamp(10, 40);
    let mut lines = Vec::new();

    // ── Daily orders ──────────────────────────────────────────────────────────
    lines.extend(section("Daily Orders", theme));
    let daily_metrics = [
        Metric::new("Total orders", format_count(result.summary.total_orders)),
        Metric::new("Total Revenue", currency.format(result.summary.total_revenue)),
    ];
    lines.extend(MetricRow::new(&daily_metrics, theme).to_lines());
    lines.push(Line::from(""));

    let counts: Vec<u64> = result.daily_orders.iter().map(|d| d.order_count).collect();
    let trend = trend_line(&counts, width.saturating_sub(4) as usize);
    if let (Some(first), Some(last)) = (result.daily_orders.first(), result.daily_orders.last()) {
        lines.push(Line::from(Span::styled(trend, theme.bar_highlight)));
        lines.push(Line::from(vec![
            Span::styled(first.date.format("%Y-%m-%d").to_string(), theme.dim),
            Span::styled(" … ", theme.dim),
            Span::styled(last.date.format("%Y-%m-%d").to_string(), theme.dim),
            Span::styled(
                format!("  ({} days)", result.daily_orders.len()),
                theme.dim,
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled("  no approved orders", theme.dim)));
    }
    lines.push(Line::from(""));

    // ── Products ──────────────────────────────────────────────────────────────
    lines.extend(section("Best & Worst Performing Product", theme));
    lines.push(Line::from(Span::styled(
        "Best Performing Product (photos)",
        theme.bold,
    )));
    lines.extend(bars(
        &category_entries(&result.best_categories(RANKING_SIZE)),
        theme,
        bar_width,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Worst Performing Product (photos)",
        theme.bold,
    )));
    lines.extend(bars(
        &category_entries(&result.worst_categories(RANKING_SIZE)),
        theme,
        bar_width,
    ));
    lines.push(Line::from(""));

    // ── Cities ────────────────────────────────────────────────────────────────
    lines.extend(section("Number of Customer by City", theme));
    lines.extend(bars(
        &city_entries(&result.top_cities(RANKING_SIZE)),
        theme,
        bar_width,
    ));
    lines.push(Line::from(""));

    // ── RFM ───────────────────────────────────────────────────────────────────
    lines.extend(section("Best Customer Based on RFM Parameters", theme));
    let rfm_metrics = [
        Metric::new(
            "Average Recency (days)",
            format_number_in(result.summary.avg_recency, 1, locale),
        ),
        Metric::new(
            "Average Frequency",
            format_number_in(result.summary.avg_frequency, 2, locale),
        ),
        Metric::new("Average Monetary", currency.format(result.summary.avg_monetary)),
    ];
    lines.extend(MetricRow::new(&rfm_metrics, theme).to_lines());

    lines
}

/// Render the overview into `area`, scrolled down by `offset` lines.
pub fn render_overview(
    frame: &mut Frame,
    area: Rect,
    result: &AnalysisResult,
    currency: &CurrencyFormat,
    offset: u16,
    theme: &Theme,
) {
    let lines = build_overview_lines(result, currency, theme, area.width);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(" Overview "),
        )
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dashboard_core::models::{CustomerRfm, DailyOrders, SummaryMetrics};
    use dashboard_data::analysis::AnalysisMetadata;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn text_of(lines: &[Line]) -> String {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sample_result() -> AnalysisResult {
        let cats = ["toys", "books", "garden", "sports", "health", "auto"];
        AnalysisResult {
            range: None,
            available: None,
            daily_orders: vec![
                DailyOrders {
                    date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
                    order_count: 2,
                    revenue: 30.0,
                },
                DailyOrders {
                    date: NaiveDate::from_ymd_opt(2018, 1, 2).unwrap(),
                    order_count: 1,
                    revenue: 30.0,
                },
            ],
            category_sales: cats
                .iter()
                .enumerate()
                .map(|(i, c)| CategorySales {
                    category: Some(c.to_string()),
                    photos_qty: (10 - i) as u64,
                })
                .collect(),
            city_customers: vec![
                CityCustomers {
                    city: Some("sao paulo".to_string()),
                    customer_count: 7,
                },
                CityCustomers {
                    city: None,
                    customer_count: 1,
                },
            ],
            rfm: vec![CustomerRfm {
                customer_id: "c1".to_string(),
                recency: 1,
                frequency: 1,
                monetary: 10.0,
            }],
            summary: SummaryMetrics {
                total_orders: 3,
                total_revenue: 1_234_567.891,
                avg_recency: 0.7,
                avg_frequency: 1.33,
                avg_monetary: 20.0,
            },
            metadata: AnalysisMetadata {
                generated_at: "2018-01-03T00:00:00Z".to_string(),
                records_joined: 3,
                records_filtered: 3,
                join_time_seconds: 0.0,
                aggregate_time_seconds: 0.0,
            },
        }
    }

    // ── trend_line ────────────────────────────────────────────────────────────

    #[test]
    fn test_trend_line_levels() {
        assert_eq!(trend_line(&[0, 7], 10), " █");
        assert_eq!(trend_line(&[1, 1], 10), "██");
        assert_eq!(trend_line(&[], 10), "");
        assert_eq!(trend_line(&[3], 0), "");
    }

    #[test]
    fn test_trend_line_downsamples_to_width() {
        let values: Vec<u64> = (0..100).collect();
        let line = trend_line(&values, 10);
        assert_eq!(line.chars().count(), 10);
        assert!(line.ends_with('█'));
    }

    // ── build_overview_lines ──────────────────────────────────────────────────

    #[test]
    fn test_overview_contains_all_sections() {
        let theme = Theme::dark();
        let text = text_of(&build_overview_lines(
            &sample_result(),
            &CurrencyFormat::default(),
            &theme,
            100,
        ));
        assert!(text.contains("Daily Orders"));
        assert!(text.contains("Best & Worst Performing Product"));
        assert!(text.contains("Number of Customer by City"));
        assert!(text.contains("Best Customer Based on RFM Parameters"));
    }

    #[test]
    fn test_overview_formats_metrics() {
        let theme = Theme::dark();
        let text = text_of(&build_overview_lines(
            &sample_result(),
            &CurrencyFormat::default(),
            &theme,
            100,
        ));
        assert!(text.contains("IDR 1.234.567,89"));
        assert!(text.contains("0,7"));
        assert!(text.contains("1,33"));
        assert!(text.contains("IDR 20,00"));
    }

    #[test]
    fn test_overview_rankings_limited_to_five() {
        let theme = Theme::dark();
        let text = text_of(&build_overview_lines(
            &sample_result(),
            &CurrencyFormat::default(),
            &theme,
            100,
        ));
        // "auto" is sixth best, so it only shows among the worst five.
        assert_eq!(text.matches("auto").count(), 1);
        assert_eq!(text.matches("toys").count(), 1);
        assert!(text.contains("(unknown)"));
    }

    #[test]
    fn test_overview_empty_result() {
        let theme = Theme::dark();
        let mut result = sample_result();
        result.daily_orders.clear();
        result.category_sales.clear();
        result.city_customers.clear();
        let text = text_of(&build_overview_lines(
            &result,
            &CurrencyFormat::default(),
            &theme,
            80,
        ));
        assert!(text.contains("no approved orders"));
        assert!(text.contains("no data"));
    }

    #[test]
    fn test_render_overview_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        let theme = Theme::classic();
        let result = sample_result();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_overview(frame, area, &result, &CurrencyFormat::default(), 0, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_overview_tiny_area_does_not_panic() {
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        let theme = Theme::dark();
        let result = sample_result();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_overview(frame, area, &result, &CurrencyFormat::default(), 5, &theme);
            })
            .unwrap();
    }
}
