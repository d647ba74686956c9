//! Main analysis pipeline for the KPI dashboard.
//!
//! Loads every extract in a folder, computes the KPIs the tables support and
//! returns an [`AnalysisResult`] ready for the presentation layer.

use std::path::Path;

use chrono::Utc;
use kpi_core::error::Result;
use kpi_core::kpis::{calculate_kpis, KpiConfig, KpiReport};
use kpi_core::models::{Dataset, Tables};
use kpi_core::normalize::normalize_columns;
use kpi_core::profile::{correlation, describe, missing_counts};
use tracing::info;

use crate::reader::{load_tables, LoadFailure};

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    /// RFC 3339 timestamp when this result was generated.
    pub generated_at: String,
    pub data_path: String,
    pub tables_loaded: usize,
    /// Files that were found but could not be parsed.
    pub load_failures: usize,
    pub kpis_computed: usize,
    pub kpis_failed: usize,
    /// Wall-clock seconds spent reading the CSV files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent computing KPIs.
    pub compute_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug)]
pub struct AnalysisResult {
    /// Loaded tables keyed by logical name.
    pub tables: Tables,
    pub load_failures: Vec<LoadFailure>,
    pub report: KpiReport,
    pub metadata: AnalysisMetadata,
}

/// Exploration views of one table.
#[derive(Debug)]
pub struct TableProfile {
    pub name: String,
    pub rows: usize,
    pub summary: Result<Dataset>,
    pub missing: Result<Dataset>,
    pub correlation: Result<Dataset>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Load every CSV in `data_path` (bad files are recorded and skipped).
/// 2. Compute the KPIs via [`calculate_kpis`].
/// 3. Return an [`AnalysisResult`].
///
/// Fails only when `data_path` is not a directory.
pub fn analyze(data_path: &Path, config: &KpiConfig) -> Result<AnalysisResult> {
    let load_start = std::time::Instant::now();
    let loaded = load_tables(data_path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let compute_start = std::time::Instant::now();
    let report = calculate_kpis(&loaded.tables, config);
    let compute_time = compute_start.elapsed().as_secs_f64();

    let metadata = AnalysisMetadata {
        generated_at: Utc::now().to_rfc3339(),
        data_path: data_path.display().to_string(),
        tables_loaded: loaded.tables.len(),
        load_failures: loaded.failures.len(),
        kpis_computed: report.computed().count(),
        kpis_failed: report.failures().count(),
        load_time_seconds: load_time,
        compute_time_seconds: compute_time,
    };

    info!(
        "Analyzed {}: {} tables, {} KPIs ({} failed)",
        metadata.data_path, metadata.tables_loaded, metadata.kpis_computed, metadata.kpis_failed
    );

    Ok(AnalysisResult {
        tables: loaded.tables,
        load_failures: loaded.failures,
        report,
        metadata,
    })
}

/// Describe, missing-value and correlation views for every table.
///
/// Column labels are normalized first; a table whose labels collide after
/// normalization reports that error in each view.
pub fn profile_tables(tables: &Tables) -> Vec<TableProfile> {
    tables
        .iter()
        .map(|(name, table)| {
            let view = |f: fn(&Dataset) -> Result<Dataset>| {
                normalize_columns(table).and_then(|ds| f(&ds))
            };
            TableProfile {
                name: name.clone(),
                rows: table.len(),
                summary: view(describe),
                missing: view(missing_counts),
                correlation: view(correlation),
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
