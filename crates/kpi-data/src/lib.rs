//! Data ingestion layer for the KPI dashboard.
//!
//! Discovers and parses the CSV extracts of a data folder into typed tables
//! and runs the top-level analysis pipeline over them.

pub mod analysis;
pub mod reader;

pub use kpi_core as core;
