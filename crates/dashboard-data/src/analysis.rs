//! Main analysis pipeline for the dashboard.
//!
//! Joins the raw tables once, then filters and aggregates per requested
//! range, returning an [`AnalysisResult`] ready for the UI layer or the
//! headless report.

use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use dashboard_core::models::{
    CategorySales, CityCustomers, CustomerRfm, DailyOrders, Dataset, DateRange,
    EnrichedOrderRecord, SummaryMetrics,
};
use dashboard_core::settings::RangeRequest;
use dashboard_core::time_utils::{end_of_day, start_of_day};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::ViewAggregator;
use crate::joiner::{filter_by_time_range, join_with_stats, JoinStats};

// ── Public types ──────────────────────────────────────────────────────────────

/// Joined records plus everything learned while joining them.
///
/// Built once per load; every range change reuses it.
#[derive(Debug, Clone)]
pub struct JoinedData {
    pub records: Vec<EnrichedOrderRecord>,
    pub stats: JoinStats,
    /// Whole days spanned by the purchase and approval timestamps, if any.
    pub available: Option<DateRange>,
    pub join_time_seconds: f64,
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Records produced by the join.
    pub records_joined: usize,
    /// Records left after the range filter.
    pub records_filtered: usize,
    /// Wall-clock seconds spent joining the tables.
    pub join_time_seconds: f64,
    /// Wall-clock seconds spent filtering and aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`analyze_dataset`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Range actually applied, `None` when there was no data to bound it.
    pub range: Option<DateRange>,
    /// Bounds a range may be moved within.
    pub available: Option<DateRange>,
    pub daily_orders: Vec<DailyOrders>,
    pub category_sales: Vec<CategorySales>,
    pub city_customers: Vec<CityCustomers>,
    pub rfm: Vec<CustomerRfm>,
    pub summary: SummaryMetrics,
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    pub fn best_categories(&self, n: usize) -> Vec<CategorySales> {
        ViewAggregator::best_categories(&self.category_sales, n)
    }

    pub fn worst_categories(&self, n: usize) -> Vec<CategorySales> {
        ViewAggregator::worst_categories(&self.category_sales, n)
    }

    pub fn top_cities(&self, n: usize) -> Vec<CityCustomers> {
        ViewAggregator::top_cities(&self.city_customers, n)
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.records_filtered == 0
    }
}

// ── Range helpers ─────────────────────────────────────────────────────────────

/// Whole-day bounds covering every purchase and approval timestamp in
/// `records`.
///
/// The filter runs on purchase timestamps, so the span must reach orders
/// bought before the first approval and orders never approved.
pub fn available_range(records: &[EnrichedOrderRecord]) -> Option<DateRange> {
    let (lo, hi) = span(
        records
            .iter()
            .flat_map(|r| [r.purchased_at, r.approved_at])
            .flatten(),
    )?;
    Some(DateRange::new(start_of_day(lo.date()), end_of_day(hi.date())))
}

fn span(timestamps: impl Iterator<Item = NaiveDateTime>) -> Option<(NaiveDateTime, NaiveDateTime)> {
    timestamps.fold(None, |acc, t| {
        Some(match acc {
            Some((lo, hi)) => (t.min(lo), t.max(hi)),
            None => (t, t),
        })
    })
}

/// The range the dashboard opens with: everything available.
pub fn default_range(joined: &JoinedData) -> Option<DateRange> {
    joined.available
}

/// Fill the open sides of `request` from `available`.
///
/// With no data and no explicit bounds the result is `None`.
pub fn resolve_range(request: RangeRequest, available: Option<DateRange>) -> Option<DateRange> {
    match (request.start, request.end, available) {
        (Some(start), Some(end), _) => Some(DateRange::new(start, end)),
        (start, end, Some(avail)) => Some(DateRange::new(
            start.unwrap_or(avail.start),
            end.unwrap_or(avail.end),
        )),
        _ => None,
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Join the four tables and record the available range.
pub fn join_dataset(dataset: &Dataset) -> JoinedData {
    let start = Instant::now();
    let (records, stats) = join_with_stats(
        &dataset.orders,
        &dataset.order_items,
        &dataset.products,
        &dataset.customers,
    );
    let join_time_seconds = start.elapsed().as_secs_f64();
    let available = available_range(&records);

    if dataset.has_empty_table() {
        warn!("at least one table has no rows; every view will be empty");
    }
    info!(
        "joined {} records from {} items ({} unmatched, {} duplicate keys)",
        stats.records_out, stats.items_in, stats.unmatched_items, stats.duplicate_keys
    );

    JoinedData {
        records,
        stats,
        available,
        join_time_seconds,
    }
}

/// Filter `joined` to `range` and compute every view.
///
/// `None` analyses the full available range.
pub fn analyze_joined(joined: &JoinedData, range: Option<DateRange>) -> AnalysisResult {
    let start = Instant::now();
    let range = range.or_else(|| default_range(joined));

    let filtered = match range {
        Some(r) => filter_by_time_range(&joined.records, r.start, r.end),
        None => Vec::new(),
    };

    let daily_orders = ViewAggregator::daily_orders(&filtered);
    let category_sales = ViewAggregator::category_sales(&filtered);
    let city_customers = ViewAggregator::city_customers(&filtered);
    let rfm = ViewAggregator::rfm(&filtered);
    let summary = ViewAggregator::summarize(&daily_orders, &rfm);
    let aggregate_time_seconds = start.elapsed().as_secs_f64();

    debug!(
        "aggregated {} of {} records in {:.3}s",
        filtered.len(),
        joined.records.len(),
        aggregate_time_seconds
    );

    AnalysisResult {
        range,
        available: joined.available,
        daily_orders,
        category_sales,
        city_customers,
        rfm,
        summary,
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            records_joined: joined.records.len(),
            records_filtered: filtered.len(),
            join_time_seconds: joined.join_time_seconds,
            aggregate_time_seconds,
        },
    }
}

/// Run the full pipeline: join, filter, aggregate.
pub fn analyze_dataset(dataset: &Dataset, range: Option<DateRange>) -> AnalysisResult {
    analyze_joined(&join_dataset(dataset), range)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
