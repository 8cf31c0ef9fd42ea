//! Headless output of one analysis run.

use std::fmt::Write;

use dashboard_core::formatting::{format_count, format_number_in, CurrencyFormat};
use dashboard_core::models::label_or_unknown;
use dashboard_core::time_utils::{format_date, format_timestamp};
use dashboard_data::analysis::AnalysisResult;

const RANKING_SIZE: usize = 5;

/// Pretty-printed JSON of the whole result: range, the four views, summary
/// metrics and metadata. Values are raw numbers.
pub fn render_json(result: &AnalysisResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Plain-text summary mirroring the dashboard sections.
pub fn render_text(result: &AnalysisResult, currency: &CurrencyFormat) -> String {
    let locale = currency.locale;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "E-COMMERCE DASHBOARD");
    let _ = writeln!(out, "{}", "=".repeat(60));
    match result.range {
        Some(r) => {
            let _ = writeln!(out, "Range:    {} → {}", format_date(r.start), format_date(r.end));
        }
        None => {
            let _ = writeln!(out, "Range:    no data");
        }
    }
    if let Some(avail) = result.available {
        let _ = writeln!(
            out,
            "Data:     {} → {}",
            format_timestamp(avail.start),
            format_timestamp(avail.end)
        );
    }
    let _ = writeln!(out, "Currency: {} ({})", currency.code, locale.tag());
    let _ = writeln!(
        out,
        "Records:  {} joined, {} in range",
        format_count(result.metadata.records_joined as u64),
        format_count(result.metadata.records_filtered as u64)
    );

    let _ = writeln!(out, "\nDaily Orders");
    let _ = writeln!(
        out,
        "  Total orders:   {}",
        format_count(result.summary.total_orders)
    );
    let _ = writeln!(
        out,
        "  Total Revenue:  {}",
        currency.format(result.summary.total_revenue)
    );
    if let (Some(first), Some(last)) = (result.daily_orders.first(), result.daily_orders.last()) {
        let _ = writeln!(
            out,
            "  Days:           {} ({} → {})",
            result.daily_orders.len(),
            first.date.format("%Y-%m-%d"),
            last.date.format("%Y-%m-%d")
        );
    }

    let ranking = |out: &mut String, title: &str, rows: Vec<(String, u64)>| {
        let _ = writeln!(out, "\n{}", title);
        if rows.is_empty() {
            let _ = writeln!(out, "  no data");
        }
        for (i, (label, value)) in rows.iter().enumerate() {
            let _ = writeln!(out, "  {}. {:<32} {}", i + 1, label, format_count(*value));
        }
    };

    let categories = |rows: Vec<dashboard_core::models::CategorySales>| {
        rows.into_iter()
            .map(|c| (label_or_unknown(c.category.as_deref()).to_string(), c.photos_qty))
            .collect::<Vec<_>>()
    };

    ranking(
        &mut out,
        "Best Performing Product (photos)",
        categories(result.best_categories(RANKING_SIZE)),
    );
    ranking(
        &mut out,
        "Worst Performing Product (photos)",
        categories(result.worst_categories(RANKING_SIZE)),
    );
    ranking(
        &mut out,
        "Number of Customer by City",
        result
            .top_cities(RANKING_SIZE)
            .into_iter()
            .map(|c| (label_or_unknown(c.city.as_deref()).to_string(), c.customer_count))
            .collect(),
    );

    let _ = writeln!(out, "\nBest Customer Based on RFM Parameters");
    let _ = writeln!(
        out,
        "  Average Recency (days):  {}",
        format_number_in(result.summary.avg_recency, 1, locale)
    );
    let _ = writeln!(
        out,
        "  Average Frequency:       {}",
        format_number_in(result.summary.avg_frequency, 2, locale)
    );
    let _ = writeln!(
        out,
        "  Average Monetary:        {}",
        currency.format(result.summary.avg_monetary)
    );

    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
