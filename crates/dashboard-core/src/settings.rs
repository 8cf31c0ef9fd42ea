use chrono::NaiveDateTime;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DashboardError, Result};
use crate::formatting::{CurrencyFormat, Locale};
use crate::time_utils::{parse_range_bound, RangeBound};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Interactive sales dashboard for an e-commerce dataset
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ecommerce-dashboard",
    about = "Interactive sales dashboard for an e-commerce dataset",
    version
)]
pub struct Settings {
    /// Directory holding the orders, order items, products and customers CSV files
    #[arg(long, env = "DASHBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Explicit path to the orders table
    #[arg(long)]
    pub orders: Option<PathBuf>,

    /// Explicit path to the order items table
    #[arg(long)]
    pub order_items: Option<PathBuf>,

    /// Explicit path to the products table
    #[arg(long)]
    pub products: Option<PathBuf>,

    /// Explicit path to the customers table
    #[arg(long)]
    pub customers: Option<PathBuf>,

    /// CSV field delimiter (auto-detected per file by default)
    #[arg(long, default_value = "auto", value_parser = ["auto", ",", ";", "tab"])]
    pub delimiter: String,

    /// Start of the purchase date range (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)
    #[arg(long)]
    pub start: Option<String>,

    /// End of the purchase date range (a bare date includes the whole day)
    #[arg(long)]
    pub end: Option<String>,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = ["dashboard", "report"])]
    pub view: String,

    /// Report output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Currency code used for revenue and monetary values
    #[arg(long, default_value = "IDR")]
    pub currency: String,

    /// Locale used for number and currency separators
    #[arg(long, default_value = "es_CO", value_parser = ["es_CO", "id_ID", "en_US", "de_DE"])]
    pub locale: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

/// Range bounds requested on the command line; a missing side defaults to
/// the edge of the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.ecommerce-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl LastUsedParams {
    /// Default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".ecommerce-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Accepts args and an explicit config path so tests can redirect to a
    /// temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. The range is never restored: it depends on the data.
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "data_dir") && settings.data_dir.is_none() {
            settings.data_dir = last.data_dir;
        }
        if !is_arg_explicitly_set(&matches, "delimiter") {
            if let Some(v) = last.delimiter {
                settings.delimiter = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "currency") {
            if let Some(v) = last.currency {
                settings.currency = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "locale") {
            if let Some(v) = last.locale {
                settings.locale = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings: {}", e);
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Parse `--start` / `--end`, rejecting a start that lies after the end.
    pub fn requested_range(&self) -> Result<RangeRequest> {
        let start = self
            .start
            .as_deref()
            .map(|s| parse_range_bound(s, RangeBound::Start))
            .transpose()?;
        let end = self
            .end
            .as_deref()
            .map(|s| parse_range_bound(s, RangeBound::End))
            .transpose()?;

        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(DashboardError::Config(format!(
                    "start {} is after end {}",
                    s, e
                )));
            }
        }

        Ok(RangeRequest { start, end })
    }

    /// Field delimiter byte, or `None` for per-file detection.
    pub fn delimiter_byte(&self) -> Option<u8> {
        match self.delimiter.as_str() {
            "," => Some(b','),
            ";" => Some(b';'),
            "tab" => Some(b'\t'),
            _ => None,
        }
    }

    /// Currency display derived from `--currency` and `--locale`.
    pub fn currency_format(&self) -> CurrencyFormat {
        CurrencyFormat::new(self.currency.clone(), Locale::from_tag(&self.locale))
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            data_dir: s.data_dir.clone(),
            delimiter: Some(s.delimiter.clone()),
            currency: Some(s.currency.clone()),
            locale: Some(s.locale.clone()),
            view: Some(s.view.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
