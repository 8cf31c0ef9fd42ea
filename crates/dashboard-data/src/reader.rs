//! CSV discovery and loading for the dashboard.
//!
//! Locates the four source tables inside a data directory and deserializes
//! them into the raw [`Dataset`] types. Bad rows are skipped and counted;
//! only an unreadable file or a broken header aborts a load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{Customer, Dataset, Order, OrderItem, Product, RawId};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

// ── Table kinds ───────────────────────────────────────────────────────────────

/// The four tables the dashboard needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Orders,
    OrderItems,
    Products,
    Customers,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Orders,
        TableKind::OrderItems,
        TableKind::Products,
        TableKind::Customers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders",
            TableKind::OrderItems => "order items",
            TableKind::Products => "products",
            TableKind::Customers => "customers",
        }
    }

    /// File stems accepted for this table, English names first, then the
    /// Indonesian spellings the dataset was first published with.
    fn stems(&self) -> &'static [&'static str] {
        match self {
            TableKind::Orders => &["orders", "order", "orders_dataset", "olist_orders_dataset"],
            TableKind::OrderItems => &[
                "order_items",
                "order_item",
                "order_items_dataset",
                "olist_order_items_dataset",
            ],
            TableKind::Products => &[
                "products",
                "product",
                "produk",
                "products_dataset",
                "olist_products_dataset",
            ],
            TableKind::Customers => &[
                "customers",
                "customer",
                "costumer",
                "customers_dataset",
                "olist_customers_dataset",
            ],
        }
    }
}

// ── DataSources ───────────────────────────────────────────────────────────────

/// Where each table lives and how its fields are separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub orders: PathBuf,
    pub order_items: PathBuf,
    pub products: PathBuf,
    pub customers: PathBuf,
    /// `None` sniffs the delimiter of each file from its header line.
    pub delimiter: Option<u8>,
}

impl DataSources {
    /// Resolve all four tables inside `dir`.
    pub fn discover(dir: &Path, delimiter: Option<u8>) -> Result<Self> {
        if !dir.is_dir() {
            return Err(DashboardError::DataPathNotFound(dir.to_path_buf()));
        }
        let files = find_csv_files(dir);
        let locate = |kind: TableKind| {
            locate_table(&files, kind).ok_or_else(|| DashboardError::MissingTable {
                table: kind.name(),
                dir: dir.to_path_buf(),
            })
        };

        Ok(Self {
            orders: locate(TableKind::Orders)?,
            order_items: locate(TableKind::OrderItems)?,
            products: locate(TableKind::Products)?,
            customers: locate(TableKind::Customers)?,
            delimiter,
        })
    }

    /// Replace the discovered path of one table.
    pub fn set_path(&mut self, kind: TableKind, path: PathBuf) {
        match kind {
            TableKind::Orders => self.orders = path,
            TableKind::OrderItems => self.order_items = path,
            TableKind::Products => self.products = path,
            TableKind::Customers => self.customers = path,
        }
    }

    pub fn path(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Orders => &self.orders,
            TableKind::OrderItems => &self.order_items,
            TableKind::Products => &self.products,
            TableKind::Customers => &self.customers,
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `data_path`, sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Pick the file for `kind`, preferring earlier stems in its list.
pub fn locate_table(files: &[PathBuf], kind: TableKind) -> Option<PathBuf> {
    kind.stems().iter().find_map(|stem| {
        files
            .iter()
            .find(|path| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.eq_ignore_ascii_case(stem))
                    .unwrap_or(false)
            })
            .cloned()
    })
}

/// Guess the field delimiter from the header line: whichever of `,` `;`
/// and tab occurs most often. Ties and empty files default to `,`.
pub fn sniff_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|source| DashboardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let count = |c: char| header.matches(c).count();
    let candidates = [(b',', count(',')), (b';', count(';')), (b'\t', count('\t'))];
    let best = candidates
        .iter()
        .fold((b',', 0usize), |best, &(d, n)| if n > best.1 { (d, n) } else { best });
    Ok(best.0)
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Rows read from one table plus how many were rejected.
#[derive(Debug, Clone)]
pub struct TableLoad<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

/// Deserialize every row of a headed CSV file into `T`.
///
/// Rows that fail to deserialize are skipped and counted. I/O failures and
/// a missing header abort with an error.
pub fn read_table<T: DeserializeOwned>(path: &Path, delimiter: Option<u8>) -> Result<TableLoad<T>> {
    let delimiter = match delimiter {
        Some(d) => d,
        None => sniff_delimiter(path)?,
    };
    let file = File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(BufReader::new(file));

    // Surface a broken header before touching any row.
    rdr.headers()?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.deserialize::<T>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                skipped += 1;
                debug!("{}: skipping row {}: {}", path.display(), line + 2, e);
            }
        }
    }

    Ok(TableLoad { rows, skipped })
}

/// Read all four tables into a [`Dataset`].
pub fn load_dataset(sources: &DataSources) -> Result<Dataset> {
    let orders = load_mapped::<OrderRow, Order>(sources, TableKind::Orders, |r| Some(r.into()))?;
    let order_items =
        load_mapped::<OrderItemRow, OrderItem>(sources, TableKind::OrderItems, OrderItemRow::parse)?;
    let products = load_mapped::<ProductRow, Product>(sources, TableKind::Products, |r| Some(r.into()))?;
    let customers =
        load_mapped::<CustomerRow, Customer>(sources, TableKind::Customers, |r| Some(r.into()))?;

    let dataset = Dataset {
        orders,
        order_items,
        products,
        customers,
    };
    debug!("Loaded {} rows across 4 tables", dataset.total_rows());
    Ok(dataset)
}

fn load_mapped<R: DeserializeOwned, T>(
    sources: &DataSources,
    kind: TableKind,
    map: impl Fn(R) -> Option<T>,
) -> Result<Vec<T>> {
    let path = sources.path(kind);
    let load = read_table::<R>(path, sources.delimiter)?;

    let read = load.rows.len();
    let rows: Vec<T> = load.rows.into_iter().filter_map(map).collect();
    let rejected = load.skipped + (read - rows.len());

    if rejected > 0 {
        warn!(
            "{}: skipped {} malformed {} rows",
            path.display(),
            rejected,
            kind.name()
        );
    }
    debug!("{}: {} {} rows", path.display(), rows.len(), kind.name());
    Ok(rows)
}

// ── CSV row shapes ────────────────────────────────────────────────────────────

// Every cell is read as text: CSV carries no types, and inferring numbers
// would mangle hex ids such as "3e1f…" into floats.

#[derive(Debug, Deserialize)]
struct OrderRow {
    order_id: Option<String>,
    customer_id: Option<String>,
    order_purchase_timestamp: Option<String>,
    order_approved_at: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Order {
            order_id: r.order_id.map(RawId::from),
            customer_id: r.customer_id.map(RawId::from),
            order_purchase_timestamp: r.order_purchase_timestamp,
            order_approved_at: r.order_approved_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrderItemRow {
    order_id: Option<String>,
    product_id: Option<String>,
    price: Option<String>,
    freight_value: Option<String>,
}

impl OrderItemRow {
    /// Items without a readable price or freight cannot contribute to any
    /// monetary view, so they are rejected at load.
    fn parse(self) -> Option<OrderItem> {
        Some(OrderItem {
            order_id: self.order_id.map(RawId::from),
            product_id: self.product_id.map(RawId::from),
            price: parse_decimal(self.price.as_deref()?)?,
            freight_value: parse_decimal(self.freight_value.as_deref()?)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProductRow {
    product_id: Option<String>,
    product_category_name: Option<String>,
    product_photos_qty: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            product_id: r.product_id.map(RawId::from),
            product_category_name: r.product_category_name,
            product_photos_qty: r
                .product_photos_qty
                .as_deref()
                .and_then(parse_decimal)
                .filter(|q| *q >= 0.0 && *q <= u32::MAX as f64)
                .map(|q| q.round() as u32),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerRow {
    customer_id: Option<String>,
    customer_city: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            customer_id: r.customer_id.map(RawId::from),
            customer_city: r.customer_city,
        }
    }
}

/// Parse a decimal cell, accepting a comma decimal separator when the cell
/// has no dot (`"12,5"` from semicolon exports).
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value = if s.contains(',') && !s.contains('.') {
        s.replace(',', ".").parse::<f64>().ok()?
    } else {
        s.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn write_dataset(dir: &Path) {
        write_csv(
            dir,
            "order.csv",
            &[
                "order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at",
                "o1,c1,delivered,2018-01-01 10:00:00,2018-01-01 11:00:00",
                "o2,c2,delivered,2018-01-02 10:00:00,",
            ],
        );
        write_csv(
            dir,
            "order_item.csv",
            &[
                "order_id;order_item_id;product_id;price;freight_value",
                "o1;1;p1;10,5;2,0",
                "o2;1;p2;20.0;3.5",
                "o2;2;p2;oops;3.5",
            ],
        );
        write_csv(
            dir,
            "produk.csv",
            &[
                "product_id;product_category_name;product_photos_qty",
                "p1;perfumaria;2",
                "p2;;1.0",
            ],
        );
        write_csv(
            dir,
            "costumer.csv",
            &["customer_id,customer_city", "c1,sao paulo", "c2,rio de janeiro"],
        );
    }

    // ── find_csv_files / locate_table ─────────────────────────────────────────

    #[test]
    fn test_find_csv_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("nested");
        std::fs::create_dir_all(&sub).unwrap();
        write_csv(dir.path(), "b.csv", &["x"]);
        write_csv(dir.path(), "a.CSV", &["x"]);
        write_csv(&sub, "c.csv", &["x"]);
        write_csv(dir.path(), "notes.txt", &["x"]);

        let files = find_csv_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_find_csv_files_nonexistent_path() {
        assert!(find_csv_files(Path::new("/tmp/does-not-exist-dashboard-xyz")).is_empty());
    }

    #[test]
    fn test_locate_table_prefers_english_name() {
        let files = vec![PathBuf::from("/d/order.csv"), PathBuf::from("/d/orders.csv")];
        assert_eq!(
            locate_table(&files, TableKind::Orders),
            Some(PathBuf::from("/d/orders.csv"))
        );
    }

    #[test]
    fn test_locate_table_does_not_confuse_orders_with_items() {
        let files = vec![PathBuf::from("/d/order_item.csv")];
        assert_eq!(locate_table(&files, TableKind::Orders), None);
        assert!(locate_table(&files, TableKind::OrderItems).is_some());
    }

    // ── DataSources ───────────────────────────────────────────────────────────

    #[test]
    fn test_discover_indonesian_file_names() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let sources = DataSources::discover(dir.path(), None).unwrap();
        assert!(sources.products.ends_with("produk.csv"));
        assert!(sources.customers.ends_with("costumer.csv"));
    }

    #[test]
    fn test_discover_missing_table() {
        let dir = TempDir::new().unwrap();
        write_csv(dir.path(), "orders.csv", &["order_id"]);
        let err = DataSources::discover(dir.path(), None).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingTable {
                table: "order items",
                ..
            }
        ));
    }

    #[test]
    fn test_discover_missing_dir() {
        let err = DataSources::discover(Path::new("/tmp/no-such-dashboard-dir"), None).unwrap_err();
        assert!(matches!(err, DashboardError::DataPathNotFound(_)));
    }

    #[test]
    fn test_set_path_overrides_one_table() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let mut sources = DataSources::discover(dir.path(), None).unwrap();
        sources.set_path(TableKind::Customers, PathBuf::from("/elsewhere/c.csv"));
        assert_eq!(
            sources.path(TableKind::Customers),
            Path::new("/elsewhere/c.csv")
        );
    }

    // ── sniff_delimiter ───────────────────────────────────────────────────────

    #[test]
    fn test_sniff_delimiter() {
        let dir = TempDir::new().unwrap();
        let comma = write_csv(dir.path(), "c.csv", &["a,b,c", "1,2,3"]);
        let semi = write_csv(dir.path(), "s.csv", &["a;b;c", "1;2,5;3"]);
        let tab = write_csv(dir.path(), "t.csv", &["a\tb\tc"]);
        let empty = write_csv(dir.path(), "e.csv", &[]);
        assert_eq!(sniff_delimiter(&comma).unwrap(), b',');
        assert_eq!(sniff_delimiter(&semi).unwrap(), b';');
        assert_eq!(sniff_delimiter(&tab).unwrap(), b'\t');
        assert_eq!(sniff_delimiter(&empty).unwrap(), b',');
    }

    // ── read_table / load_dataset ─────────────────────────────────────────────

    #[test]
    fn test_read_table_missing_file() {
        let err = read_table::<CustomerRow>(Path::new("/tmp/no-such-file.csv"), Some(b','))
            .unwrap_err();
        assert!(matches!(err, DashboardError::FileRead { .. }));
    }

    #[test]
    fn test_read_table_ignores_extra_columns() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "customers.csv",
            &["customer_id,customer_zip,customer_city", "c1,01000,sao paulo"],
        );
        let load = read_table::<CustomerRow>(&path, None).unwrap();
        assert_eq!(load.rows.len(), 1);
        assert_eq!(load.rows[0].customer_city.as_deref(), Some("sao paulo"));
        assert_eq!(load.skipped, 0);
    }

    #[test]
    fn test_load_dataset_mixed_delimiters() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let sources = DataSources::discover(dir.path(), None).unwrap();
        let ds = load_dataset(&sources).unwrap();

        assert_eq!(ds.orders.len(), 2);
        assert_eq!(ds.customers.len(), 2);
        assert_eq!(ds.products.len(), 2);
        // "oops" price is rejected.
        assert_eq!(ds.order_items.len(), 2);
    }

    #[test]
    fn test_load_dataset_decimal_comma_and_nulls() {
        let dir = TempDir::new().unwrap();
        write_dataset(dir.path());
        let ds = load_dataset(&DataSources::discover(dir.path(), None).unwrap()).unwrap();

        assert!((ds.order_items[0].price - 10.5).abs() < 1e-9);
        assert!((ds.order_items[0].freight_value - 2.0).abs() < 1e-9);
        assert_eq!(ds.orders[1].order_approved_at, None);
        assert_eq!(ds.products[1].product_category_name, None);
        assert_eq!(ds.products[1].product_photos_qty, Some(1));
        assert_eq!(ds.orders[0].order_id, Some(RawId::from("o1")));
    }

    // ── parse_decimal ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_decimal("7"), Some(7.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("1,234.5"), None);
    }
}
