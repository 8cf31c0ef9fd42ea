//! Reusable line builders shared by the dashboard views.

pub mod bar_list;
pub mod header;
pub mod metrics;
