//! Data layer for the e-commerce dashboard.
//!
//! Responsible for discovering and reading the four CSV tables, joining
//! them into enriched order records, aggregating the dashboard views and
//! running the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod joiner;
pub mod reader;

pub use dashboard_core as core;
