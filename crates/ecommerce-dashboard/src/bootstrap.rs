use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the per-user directory under `$HOME`.
pub const APP_DIR: &str = ".ecommerce-dashboard";

// ── Directory bootstrap ────────────────────────────────────────────────────────

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Ensure `~/.ecommerce-dashboard/` and its `logs/` and `data/`
/// subdirectories exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let dir = app_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::create_dir_all(dir.join("logs"))?;
    std::fs::create_dir_all(dir.join("data"))?;
    Ok(())
}

/// Default log file used by the interactive dashboard.
pub fn default_log_file() -> PathBuf {
    app_dir().join("logs").join("dashboard.log")
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name onto an [`EnvFilter`] directive.
///
/// Unrecognised names are passed through so `RUST_LOG`-style directives
/// still work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// With `log_file` set, output is appended to that file without ANSI colours
/// so the terminal UI is left alone. Otherwise it goes to stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        None => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

// ── Data-dir discovery ─────────────────────────────────────────────────────────

/// Locate a data directory when none was given.
///
/// Checks, in order, `./data`, `./dataset` and `~/.ecommerce-dashboard/data`
/// and returns the first that exists.
pub fn discover_data_dir() -> Option<PathBuf> {
    discover_data_dir_from(Path::new("."))
}

fn discover_data_dir_from(cwd: &Path) -> Option<PathBuf> {
    let candidates = [
        cwd.join("data"),
        cwd.join("dataset"),
        app_dir().join("data"),
    ];
    candidates.into_iter().find(|p| p.is_dir())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Tests run in parallel and HOME is process-wide.
    static HOME_LOCK: Mutex<()> = Mutex::new(());

    fn with_home<T>(home: &Path, f: impl FnOnce() -> T) -> T {
        let _guard = HOME_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let saved_home = std::env::var_os("HOME");
        std::env::set_var("HOME", home);
        let out = f();
        match saved_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }
        out
    }

    #[test]
    fn test_ensure_directories() {
        let tmp = TempDir::new().expect("tempdir");
        with_home(tmp.path(), ensure_directories).expect("ensure_directories should succeed");

        let dir = tmp.path().join(APP_DIR);
        assert!(dir.is_dir());
        assert!(dir.join("logs").is_dir());
        assert!(dir.join("data").is_dir());
    }

    #[test]
    fn test_default_log_file_under_home() {
        let tmp = TempDir::new().expect("tempdir");
        let path = with_home(tmp.path(), default_log_file);
        assert_eq!(
            path,
            tmp.path().join(APP_DIR).join("logs").join("dashboard.log")
        );
    }

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("info"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("dashboard_data=trace"), "dashboard_data=trace");
    }

    #[test]
    fn test_discover_prefers_local_data_dir() {
        let cwd = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(cwd.path().join("dataset")).unwrap();
        std::fs::create_dir_all(cwd.path().join("data")).unwrap();
        assert_eq!(
            discover_data_dir_from(cwd.path()),
            Some(cwd.path().join("data"))
        );
    }

    #[test]
    fn test_discover_falls_back_to_dataset_then_home() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        let home_data = home.path().join(APP_DIR).join("data");
        std::fs::create_dir_all(&home_data).unwrap();

        let found = with_home(home.path(), || discover_data_dir_from(cwd.path()));
        assert_eq!(found, Some(home_data));

        std::fs::create_dir_all(cwd.path().join("dataset")).unwrap();
        let found = with_home(home.path(), || discover_data_dir_from(cwd.path()));
        assert_eq!(found, Some(cwd.path().join("dataset")));
    }

    #[test]
    fn test_discover_none_when_absent() {
        let cwd = TempDir::new().expect("tempdir");
        let home = TempDir::new().expect("tempdir");
        let found = with_home(home.path(), || discover_data_dir_from(cwd.path()));
        assert!(found.is_none());
    }
}
