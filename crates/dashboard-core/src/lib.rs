//! Shared domain layer for the e-commerce dashboard.
//!
//! Holds the raw and derived record types, join-key canonicalization,
//! timestamp parsing, display formatting, the error type and the CLI
//! settings used by the data, UI and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
