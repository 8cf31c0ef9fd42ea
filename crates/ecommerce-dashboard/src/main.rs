mod bootstrap;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dashboard_core::error::DashboardError;
use dashboard_core::settings::Settings;
use dashboard_data::analysis::{analyze_joined, join_dataset, resolve_range};
use dashboard_data::reader::{load_dataset, DataSources, TableKind};
use dashboard_ui::app::App;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    let interactive = settings.view != "report";

    bootstrap::ensure_directories()?;
    let log_file = match (&settings.log_file, interactive) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(bootstrap::default_log_file()),
        (None, false) => None,
    };
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("E-Commerce Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Currency: {} ({})",
        settings.view,
        settings.theme,
        settings.currency,
        settings.locale
    );

    let request = settings.requested_range()?;
    let (sources, source_label) = resolve_sources(&settings)?;
    let dataset = load_dataset(&sources).context("loading dataset")?;
    tracing::info!("loaded {} rows from {}", dataset.total_rows(), source_label);

    let joined = join_dataset(&dataset);
    let range = resolve_range(request, joined.available);

    match settings.view.as_str() {
        "report" => {
            let result = analyze_joined(&joined, range);
            let output = match settings.format.as_str() {
                "json" => report::render_json(&result)?,
                _ => report::render_text(&result, &settings.currency_format()),
            };
            println!("{}", output);
        }
        _ => {
            let app = App::new(
                joined,
                range,
                &settings.theme,
                settings.currency_format(),
                source_label,
            );
            app.run()
                .map_err(|e| DashboardError::Terminal(e.to_string()))?;
        }
    }

    Ok(())
}

/// Work out where the four tables live.
///
/// Explicit per-table paths win over whatever is found in the data
/// directory. When all four are given no directory is needed.
fn resolve_sources(settings: &Settings) -> Result<(DataSources, String)> {
    let delimiter = settings.delimiter_byte();

    if let (Some(orders), Some(order_items), Some(products), Some(customers)) = (
        &settings.orders,
        &settings.order_items,
        &settings.products,
        &settings.customers,
    ) {
        let sources = DataSources {
            orders: orders.clone(),
            order_items: order_items.clone(),
            products: products.clone(),
            customers: customers.clone(),
            delimiter,
        };
        return Ok((sources, "explicit files".to_string()));
    }

    let dir = settings
        .data_dir
        .clone()
        .or_else(bootstrap::discover_data_dir)
        .ok_or_else(|| DashboardError::DataPathNotFound(PathBuf::from("./data")))?;

    let mut sources = DataSources::discover(&dir, delimiter)?;
    let overrides = [
        (TableKind::Orders, &settings.orders),
        (TableKind::OrderItems, &settings.order_items),
        (TableKind::Products, &settings.products),
        (TableKind::Customers, &settings.customers),
    ];
    for (kind, path) in overrides {
        if let Some(path) = path {
            sources.set_path(kind, path.clone());
        }
    }
    Ok((sources, dir.display().to_string()))
}
