//! Four-way inner join of the raw tables into [`EnrichedOrderRecord`]s.
//!
//! Every id is canonicalized with
//! [`RawId::canonical`](dashboard_core::models::RawId::canonical) before any table is
//! matched, so `17`, `17.0` and `"17"` all meet. Rows without a usable key
//! or without a partner in the next table are dropped silently; the counts
//! only show up in debug logs.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use dashboard_core::models::{
    canonical_key, Customer, DateRange, EnrichedOrderRecord, Order, OrderItem, Product,
};
use dashboard_core::time_utils::parse_optional;
use tracing::debug;

/// Counters describing what the join threw away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub items_in: usize,
    pub records_out: usize,
    /// Rows in any table whose key was missing or empty.
    pub missing_keys: usize,
    /// Rows in a keyed table that repeated an earlier key.
    pub duplicate_keys: usize,
    /// Items whose order, product or customer was not found.
    pub unmatched_items: usize,
}

/// Per-order fields resolved once, shared by all of the order's items.
struct OrderFacts<'a> {
    customer_id: String,
    customer: &'a Customer,
    purchased_at: Option<NaiveDateTime>,
    approved_at: Option<NaiveDateTime>,
}

/// Inner-join orders → items → products → customers.
///
/// Output follows the order-item table's row order. The caller's tables
/// are only borrowed.
pub fn join(
    orders: &[Order],
    items: &[OrderItem],
    products: &[Product],
    customers: &[Customer],
) -> Vec<EnrichedOrderRecord> {
    join_with_stats(orders, items, products, customers).0
}

/// [`join`] plus the [`JoinStats`] of the run.
pub fn join_with_stats(
    orders: &[Order],
    items: &[OrderItem],
    products: &[Product],
    customers: &[Customer],
) -> (Vec<EnrichedOrderRecord>, JoinStats) {
    let mut stats = JoinStats {
        items_in: items.len(),
        ..JoinStats::default()
    };

    if orders.is_empty() || items.is_empty() || products.is_empty() || customers.is_empty() {
        debug!("join skipped: at least one input table is empty");
        return (Vec::new(), stats);
    }

    let customer_index =
        index_by_key(customers, |c| canonical_key(c.customer_id.as_ref()), &mut stats);
    let product_index =
        index_by_key(products, |p| canonical_key(p.product_id.as_ref()), &mut stats);
    let order_index = index_by_key(orders, |o| canonical_key(o.order_id.as_ref()), &mut stats);

    // Resolve each order's customer up front; an order whose customer is
    // unknown can never produce a record.
    let mut order_facts: HashMap<&str, OrderFacts<'_>> = HashMap::with_capacity(order_index.len());
    for (order_id, order) in &order_index {
        let Some(customer_id) = canonical_key(order.customer_id.as_ref()) else {
            stats.missing_keys += 1;
            continue;
        };
        let Some(&customer) = customer_index.get(customer_id.as_str()) else {
            continue;
        };
        order_facts.insert(
            order_id.as_str(),
            OrderFacts {
                customer,
                purchased_at: parse_optional(order.order_purchase_timestamp.as_deref()),
                approved_at: parse_optional(order.order_approved_at.as_deref()),
                customer_id,
            },
        );
    }

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let (Some(order_id), Some(product_id)) = (
            canonical_key(item.order_id.as_ref()),
            canonical_key(item.product_id.as_ref()),
        ) else {
            stats.missing_keys += 1;
            continue;
        };
        let (Some(facts), Some(product)) = (
            order_facts.get(order_id.as_str()),
            product_index.get(product_id.as_str()),
        ) else {
            stats.unmatched_items += 1;
            continue;
        };

        records.push(EnrichedOrderRecord {
            order_id,
            product_id,
            customer_id: facts.customer_id.clone(),
            purchased_at: facts.purchased_at,
            approved_at: facts.approved_at,
            price: item.price,
            freight_value: item.freight_value,
            amount: item.price + item.freight_value,
            product_category_name: product.product_category_name.clone(),
            product_photos_qty: product.product_photos_qty,
            customer_city: facts.customer.customer_city.clone(),
        });
    }

    stats.records_out = records.len();
    debug!(
        items_in = stats.items_in,
        records_out = stats.records_out,
        missing_keys = stats.missing_keys,
        duplicate_keys = stats.duplicate_keys,
        unmatched_items = stats.unmatched_items,
        "join complete"
    );
    (records, stats)
}

/// Keep the records whose purchase timestamp lies in `[start, end]`.
///
/// Input order is preserved. `start > end` selects nothing, as does a
/// missing purchase timestamp.
pub fn filter_by_time_range(
    records: &[EnrichedOrderRecord],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<EnrichedOrderRecord> {
    let range = DateRange::new(start, end);
    if !range.is_valid() {
        debug!("empty filter: start {} is after end {}", start, end);
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| r.purchased_at.is_some_and(|ts| range.contains(ts)))
        .cloned()
        .collect()
}

/// Index `rows` by canonical key; the first row with a key wins.
fn index_by_key<'a, T>(
    rows: &'a [T],
    key: impl Fn(&T) -> Option<String>,
    stats: &mut JoinStats,
) -> HashMap<String, &'a T> {
    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        match key(row) {
            Some(k) => {
                if index.contains_key(&k) {
                    stats.duplicate_keys += 1;
                } else {
                    index.insert(k, row);
                }
            }
            None => stats.missing_keys += 1,
        }
    }
    index
}
