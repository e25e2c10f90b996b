//! Core domain types and logic.

pub mod aggregation;
pub mod analytics;
pub mod config_validation;
pub mod error;
pub mod instrumentation;
pub mod modifier_table;
pub mod point_query;
pub mod price_record;
pub mod record_store;
pub mod reducer;
