use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ── Join keys ─────────────────────────────────────────────────────────────────

/// An identifier as it arrived from a source table.
///
/// Exports of the same dataset disagree on id types: one file carries
/// `17`, another `17.0`, a third `"17"`. All of them must join, so every
/// id is reduced to [`RawId::canonical`] before any table is matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawId {
    /// Canonical text form used as the join key.
    ///
    /// * integers → decimal text
    /// * integral floats → integer text (`17.0` → `"17"`)
    /// * text → trimmed; `"17.000"` is treated like the float it spells
    /// * empty text and non-finite floats → `None` (the row has no key)
    ///
    /// # Examples
    ///
    /// ```
    /// use dashboard_core::models::RawId;
    ///
    /// assert_eq!(RawId::Int(17).canonical().as_deref(), Some("17"));
    /// assert_eq!(RawId::Float(17.0).canonical().as_deref(), Some("17"));
    /// assert_eq!(RawId::from(" 17.0 ").canonical().as_deref(), Some("17"));
    /// assert_eq!(RawId::from("a1b2").canonical().as_deref(), Some("a1b2"));
    /// assert_eq!(RawId::from("  ").canonical(), None);
    /// ```
    pub fn canonical(&self) -> Option<String> {
        match self {
            RawId::Int(i) => Some(i.to_string()),
            RawId::Float(f) => {
                if !f.is_finite() {
                    return None;
                }
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(format!("{}", *f as i64))
                } else {
                    Some(f.to_string())
                }
            }
            RawId::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if let Some(caps) = integral_float_re().captures(trimmed) {
                    let digits = caps.get(1).map_or(trimmed, |m| m.as_str());
                    return Some(digits.trim_start_matches('+').to_string());
                }
                Some(trimmed.to_string())
            }
        }
    }
}

impl From<&str> for RawId {
    fn from(s: &str) -> Self {
        RawId::Text(s.to_string())
    }
}

impl From<String> for RawId {
    fn from(s: String) -> Self {
        RawId::Text(s)
    }
}

/// Canonical key of an optional id; missing ids have no key.
pub fn canonical_key(id: Option<&RawId>) -> Option<String> {
    id.and_then(RawId::canonical)
}

fn integral_float_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([+-]?\d+)\.0+$").expect("regex is valid"))
}

// ── Raw tables ────────────────────────────────────────────────────────────────

/// One row of the orders table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Option<RawId>,
    pub customer_id: Option<RawId>,
    /// Purchase time as written in the source; parsed during the join.
    #[serde(default)]
    pub order_purchase_timestamp: Option<String>,
    /// Payment approval time as written in the source.
    #[serde(default)]
    pub order_approved_at: Option<String>,
}

/// One row of the order-items table. An order has one row per item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: Option<RawId>,
    pub product_id: Option<RawId>,
    pub price: f64,
    pub freight_value: f64,
}

/// One row of the products table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Option<RawId>,
    #[serde(default)]
    pub product_category_name: Option<String>,
    #[serde(default)]
    pub product_photos_qty: Option<u32>,
}

/// One row of the customers table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: Option<RawId>,
    #[serde(default)]
    pub customer_city: Option<String>,
}

/// The four raw tables the dashboard is built from.
///
/// Owned by the caller for the whole session; the analysis pipeline only
/// ever borrows it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
}

impl Dataset {
    /// `true` when any of the four tables has no rows.
    pub fn has_empty_table(&self) -> bool {
        self.orders.is_empty()
            || self.order_items.is_empty()
            || self.products.is_empty()
            || self.customers.is_empty()
    }

    /// Total number of raw rows across all tables.
    pub fn total_rows(&self) -> usize {
        self.orders.len() + self.order_items.len() + self.products.len() + self.customers.len()
    }
}

// ── Derived records ───────────────────────────────────────────────────────────

/// One (order, item) pair after the four-way join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedOrderRecord {
    pub order_id: String,
    pub product_id: String,
    pub customer_id: String,
    /// `None` when the source timestamp was missing or unparseable.
    pub purchased_at: Option<NaiveDateTime>,
    /// `None` when the source timestamp was missing or unparseable.
    pub approved_at: Option<NaiveDateTime>,
    pub price: f64,
    pub freight_value: f64,
    /// `price + freight_value`.
    pub amount: f64,
    pub product_category_name: Option<String>,
    pub product_photos_qty: Option<u32>,
    pub customer_city: Option<String>,
}

/// Inclusive time window applied to the purchase timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// A range whose start lies after its end selects nothing.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Whether `ts` lies within `[start, end]`.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.is_valid() && self.start <= ts && ts <= self.end
    }
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Orders and revenue approved on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOrders {
    pub date: NaiveDate,
    /// Distinct orders approved that day.
    pub order_count: u64,
    /// Sum of item prices; freight is not revenue.
    pub revenue: f64,
}

/// Summed photo quantity for one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySales {
    /// `None` collects every product without a category.
    pub category: Option<String>,
    pub photos_qty: u64,
}

/// Distinct customers living in one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCustomers {
    pub city: Option<String>,
    pub customer_count: u64,
}

/// Recency / frequency / monetary scores for one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Whole days between the customer's last purchase date and the latest
    /// purchase date in the filtered set.
    pub recency: i64,
    /// Distinct orders placed.
    pub frequency: u64,
    /// Sum of `amount` over all the customer's items.
    pub monetary: f64,
}

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub total_orders: u64,
    pub total_revenue: f64,
    /// Mean recency in days, rounded to one decimal.
    pub avg_recency: f64,
    /// Mean frequency, rounded to two decimals.
    pub avg_frequency: f64,
    pub avg_monetary: f64,
}

/// Display label for an optional grouping key.
pub fn label_or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or("(unknown)")
}
