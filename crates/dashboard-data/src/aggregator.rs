//! The four dashboard views computed from a filtered record set.
//!
//! Every view is a fresh, pure computation; rows missing the field a view
//! groups on are left out of that view only.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use dashboard_core::models::{
    CategorySales, CityCustomers, CustomerRfm, DailyOrders, EnrichedOrderRecord, SummaryMetrics,
};
use dashboard_core::time_utils::days_between;
use tracing::debug;

// ── Accumulators ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct DayBucket<'a> {
    orders: HashSet<&'a str>,
    revenue: f64,
}

struct CustomerBucket<'a> {
    customer_id: &'a str,
    last_purchase: NaiveDateTime,
    orders: HashSet<&'a str>,
    monetary: f64,
}

// ── ViewAggregator ────────────────────────────────────────────────────────────

/// Stateless helper that turns enriched records into dashboard views.
pub struct ViewAggregator;

impl ViewAggregator {
    /// Distinct orders and item revenue per approval day, ascending.
    ///
    /// Revenue sums `price` only; freight is excluded. Days between the
    /// first and last approval day that saw no orders are reported with
    /// zero orders and zero revenue, so the series has no holes.
    pub fn daily_orders(records: &[EnrichedOrderRecord]) -> Vec<DailyOrders> {
        let mut days: BTreeMap<NaiveDate, DayBucket<'_>> = BTreeMap::new();
        let mut unapproved = 0usize;

        for record in records {
            let Some(approved_at) = record.approved_at else {
                unapproved += 1;
                continue;
            };
            let bucket = days.entry(approved_at.date()).or_default();
            bucket.orders.insert(record.order_id.as_str());
            bucket.revenue += record.price;
        }

        if unapproved > 0 {
            debug!("daily view: {} rows without approval date", unapproved);
        }

        let (Some(&first), Some(&last)) = (days.keys().next(), days.keys().next_back()) else {
            return Vec::new();
        };

        let mut view = Vec::with_capacity((days_between(first, last) + 1) as usize);
        let mut day = first;
        while day <= last {
            let row = match days.get(&day) {
                Some(bucket) => DailyOrders {
                    date: day,
                    order_count: bucket.orders.len() as u64,
                    revenue: bucket.revenue,
                },
                None => DailyOrders {
                    date: day,
                    order_count: 0,
                    revenue: 0.0,
                },
            };
            view.push(row);
            day += Duration::days(1);
        }
        view
    }

    /// Summed photo quantity per category, largest first.
    ///
    /// Ties keep the order in which categories were first seen. Products
    /// without a category share one `None` bucket.
    pub fn category_sales(records: &[EnrichedOrderRecord]) -> Vec<CategorySales> {
        let mut view: Vec<CategorySales> = Vec::new();
        let mut slots: HashMap<Option<&str>, usize> = HashMap::new();

        for record in records {
            let key = record.product_category_name.as_deref();
            let slot = *slots.entry(key).or_insert_with(|| {
                view.push(CategorySales {
                    category: key.map(str::to_string),
                    photos_qty: 0,
                });
                view.len() - 1
            });
            view[slot].photos_qty += u64::from(record.product_photos_qty.unwrap_or(0));
        }

        // `sort_by` is stable, which is what keeps ties in first-seen order.
        view.sort_by(|a, b| b.photos_qty.cmp(&a.photos_qty));
        view
    }

    /// Distinct customers per city, in first-seen order.
    pub fn city_customers(records: &[EnrichedOrderRecord]) -> Vec<CityCustomers> {
        let mut cities: Vec<(Option<&str>, HashSet<&str>)> = Vec::new();
        let mut slots: HashMap<Option<&str>, usize> = HashMap::new();

        for record in records {
            let key = record.customer_city.as_deref();
            let slot = *slots.entry(key).or_insert_with(|| {
                cities.push((key, HashSet::new()));
                cities.len() - 1
            });
            cities[slot].1.insert(record.customer_id.as_str());
        }

        cities
            .into_iter()
            .map(|(city, customers)| CityCustomers {
                city: city.map(str::to_string),
                customer_count: customers.len() as u64,
            })
            .collect()
    }

    /// Recency, frequency and monetary value per customer, in first-seen
    /// order.
    ///
    /// Recency is measured against the latest purchase date of the whole
    /// record set, not of the customer, so it cannot be computed one group
    /// at a time.
    pub fn rfm(records: &[EnrichedOrderRecord]) -> Vec<CustomerRfm> {
        let mut customers: Vec<CustomerBucket<'_>> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut latest: Option<NaiveDateTime> = None;

        for record in records {
            let Some(purchased_at) = record.purchased_at else {
                continue;
            };
            latest = latest.max(Some(purchased_at));

            let id = record.customer_id.as_str();
            let slot = *slots.entry(id).or_insert_with(|| {
                customers.push(CustomerBucket {
                    customer_id: id,
                    last_purchase: purchased_at,
                    orders: HashSet::new(),
                    monetary: 0.0,
                });
                customers.len() - 1
            });
            let bucket = &mut customers[slot];
            bucket.last_purchase = bucket.last_purchase.max(purchased_at);
            bucket.orders.insert(record.order_id.as_str());
            bucket.monetary += record.amount;
        }

        let Some(latest) = latest else {
            return Vec::new();
        };
        let reference_day = latest.date();

        customers
            .into_iter()
            .map(|c| CustomerRfm {
                customer_id: c.customer_id.to_string(),
                recency: days_between(c.last_purchase.date(), reference_day),
                frequency: c.orders.len() as u64,
                monetary: c.monetary,
            })
            .collect()
    }

    /// Headline metrics over the daily and RFM views.
    ///
    /// Empty views give all-zero metrics.
    pub fn summarize(daily: &[DailyOrders], rfm: &[CustomerRfm]) -> SummaryMetrics {
        let total_orders = daily.iter().map(|d| d.order_count).sum();
        let total_revenue = daily.iter().map(|d| d.revenue).sum();

        if rfm.is_empty() {
            return SummaryMetrics {
                total_orders,
                total_revenue,
                ..SummaryMetrics::default()
            };
        }

        let n = rfm.len() as f64;
        let mean_recency = rfm.iter().map(|r| r.recency as f64).sum::<f64>() / n;
        let mean_frequency = rfm.iter().map(|r| r.frequency as f64).sum::<f64>() / n;
        let mean_monetary = rfm.iter().map(|r| r.monetary).sum::<f64>() / n;

        SummaryMetrics {
            total_orders,
            total_revenue,
            avg_recency: round_to(mean_recency, 1),
            avg_frequency: round_to(mean_frequency, 2),
            avg_monetary: mean_monetary,
        }
    }

    // ── Rankings ──────────────────────────────────────────────────────────────

    /// The `n` categories with the highest photo quantity.
    pub fn best_categories(view: &[CategorySales], n: usize) -> Vec<CategorySales> {
        let mut ranked = view.to_vec();
        ranked.sort_by(|a, b| b.photos_qty.cmp(&a.photos_qty));
        ranked.truncate(n);
        ranked
    }

    /// The `n` categories with the lowest photo quantity, lowest first.
    pub fn worst_categories(view: &[CategorySales], n: usize) -> Vec<CategorySales> {
        let mut ranked = view.to_vec();
        ranked.sort_by(|a, b| a.photos_qty.cmp(&b.photos_qty));
        ranked.truncate(n);
        ranked
    }

    /// The `n` cities with the most customers, most first.
    pub fn top_cities(view: &[CityCustomers], n: usize) -> Vec<CityCustomers> {
        let mut ranked = view.to_vec();
        ranked.sort_by(|a, b| b.customer_count.cmp(&a.customer_count));
        ranked.truncate(n);
        ranked
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

// ── Tests ─────────────────────────────────────────────────────────────────────
