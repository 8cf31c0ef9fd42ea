//! Terminal UI layer for the e-commerce dashboard.
//!
//! Provides themes, header, metric and bar-list components, the overview and
//! table views, and the main application event loop built on top of
//! [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod table_view;
pub mod themes;

pub use dashboard_core as core;
