//! Pure KPI aggregation engine.
//!
//! Takes already-parsed tables keyed by logical name and derives per-formation
//! KPIs: enrollment counts, revenue, cost, margin, average grade and pass
//! rate. Only [`settings`] touches the filesystem; no transform mutates its
//! inputs, each returns a fresh [`models::Dataset`].

pub mod aggregate;
pub mod enrich;
pub mod error;
pub mod formatting;
pub mod kpis;
pub mod models;
pub mod normalize;
pub mod pass_rate;
pub mod profile;
pub mod settings;
pub mod top_n;
pub mod validate;

pub use error::{KpiError, Result};
