//! Plain-text and JSON rendering for the three dashboard views.
//!
//! Text tables are aligned on display width so accented labels line up;
//! numeric columns are right-aligned.

use std::fmt::Write as _;

use kpi_core::error::KpiError;
use kpi_core::formatting::format_value;
use kpi_core::kpis::KpiReport;
use kpi_core::models::{Dataset, Tables};
use kpi_data::analysis::{AnalysisMetadata, TableProfile};
use kpi_data::reader::LoadFailure;
use serde_json::{json, Value as Json};
use unicode_width::UnicodeWidthStr;

pub const NO_KPI_MESSAGE: &str = "Aucun KPI calculé";
const NO_ROWS: &str = "(aucune ligne)";
const NO_TABLES: &str = "Aucune table chargée";

// ── Text ──────────────────────────────────────────────────────────────────────

/// Render a dataset as an aligned text table.
pub fn render_dataset(dataset: &Dataset) -> String {
    let columns = dataset.columns();
    if columns.is_empty() {
        return NO_ROWS.to_string();
    }

    let cells: Vec<Vec<String>> = dataset
        .rows()
        .iter()
        .map(|row| row.iter().map(format_value).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(c.name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(&c.name, *w, c.ty.is_numeric()))
        .collect();
    out.push_str(header.join(" | ").trim_end());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));

    if cells.is_empty() {
        out.push('\n');
        out.push_str(NO_ROWS);
        return out;
    }

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(columns.iter().zip(&widths))
            .map(|(cell, (c, w))| pad(cell, *w, c.ty.is_numeric()))
            .collect();
        out.push('\n');
        out.push_str(line.join(" | ").trim_end());
    }
    out
}

/// Every KPI in computation order; failures show what was missing.
pub fn render_report(report: &KpiReport) -> String {
    if report.is_empty() {
        return NO_KPI_MESSAGE.to_string();
    }

    let mut out = String::new();
    for outcome in &report.outcomes {
        let _ = writeln!(out, "## {} ({})", outcome.name, outcome.source);
        match &outcome.result {
            Ok(dataset) => out.push_str(&render_dataset(dataset)),
            Err(error) => out.push_str(&render_failure(error)),
        }
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// First `preview_rows` rows of every table.
pub fn render_raw(tables: &Tables, preview_rows: usize) -> String {
    if tables.is_empty() {
        return NO_TABLES.to_string();
    }

    let mut out = String::new();
    for (name, table) in tables {
        let _ = writeln!(
            out,
            "## {} ({} lignes, {} colonnes)",
            name,
            table.len(),
            table.columns().len()
        );
        out.push_str(&render_dataset(&table.head(preview_rows)));
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// Summary, missing values and correlations for every table.
pub fn render_profiles(profiles: &[TableProfile]) -> String {
    if profiles.is_empty() {
        return NO_TABLES.to_string();
    }

    let mut out = String::new();
    for profile in profiles {
        let _ = writeln!(out, "## {} ({} lignes)", profile.name, profile.rows);
        for (title, view) in [
            ("Statistiques", &profile.summary),
            ("Valeurs manquantes", &profile.missing),
            ("Corrélations", &profile.correlation),
        ] {
            let _ = writeln!(out, "### {}", title);
            match view {
                Ok(dataset) => out.push_str(&render_dataset(dataset)),
                Err(error) => out.push_str(&render_failure(error)),
            }
            out.push_str("\n\n");
        }
    }
    out.trim_end().to_string()
}

/// One line per file that could not be loaded; empty when all loaded.
pub fn render_load_failures(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("⚠ {}: {}", f.path.display(), f.error))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_failure(error: &KpiError) -> String {
    match error {
        KpiError::Schema { missing, available } => format!(
            "⚠ Colonnes manquantes : {}\n  Colonnes disponibles : {}",
            missing.join(", "),
            available.join(", ")
        ),
        other => format!("⚠ {}", other),
    }
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(text.width()));
    if right {
        format!("{fill}{text}")
    } else {
        format!("{text}{fill}")
    }
}

// ── JSON ──────────────────────────────────────────────────────────────────────

/// KPI results and failures, with the run metadata.
pub fn report_json(
    report: &KpiReport,
    metadata: &AnalysisMetadata,
    failures: &[LoadFailure],
) -> Json {
    let kpis: Vec<Json> = report
        .outcomes
        .iter()
        .map(|outcome| {
            let mut entry = json!({
                "name": outcome.name,
                "source": outcome.source,
            });
            match &outcome.result {
                Ok(dataset) => entry["rows"] = json!(dataset.to_records()),
                Err(error) => entry["error"] = error_json(error),
            }
            entry
        })
        .collect();

    json!({
        "metadata": metadata,
        "load_failures": load_failures_json(failures),
        "kpis": kpis,
    })
}

/// Column descriptors and a row preview for every table.
pub fn raw_json(tables: &Tables, preview_rows: usize, failures: &[LoadFailure]) -> Json {
    let tables: serde_json::Map<String, Json> = tables
        .iter()
        .map(|(name, table)| {
            let columns: Vec<Json> = table
                .columns()
                .iter()
                .map(|c| json!({ "name": c.name, "type": c.ty.to_string() }))
                .collect();
            let body = json!({
                "rows": table.len(),
                "columns": columns,
                "preview": table.head(preview_rows).to_records(),
            });
            (name.clone(), body)
        })
        .collect();

    json!({
        "tables": tables,
        "load_failures": load_failures_json(failures),
    })
}

pub fn profiles_json(profiles: &[TableProfile], failures: &[LoadFailure]) -> Json {
    let view = |result: &kpi_core::Result<Dataset>| match result {
        Ok(dataset) => json!(dataset.to_records()),
        Err(error) => json!({ "error": error_json(error) }),
    };
    let tables: serde_json::Map<String, Json> = profiles
        .iter()
        .map(|p| {
            let body = json!({
                "rows": p.rows,
                "describe": view(&p.summary),
                "missing": view(&p.missing),
                "correlation": view(&p.correlation),
            });
            (p.name.clone(), body)
        })
        .collect();

    json!({
        "tables": tables,
        "load_failures": load_failures_json(failures),
    })
}

fn error_json(error: &KpiError) -> Json {
    match error {
        KpiError::Schema { missing, available } => json!({
            "message": error.to_string(),
            "missing": missing,
            "available": available,
        }),
        other => json!({ "message": other.to_string() }),
    }
}

fn load_failures_json(failures: &[LoadFailure]) -> Json {
    failures
        .iter()
        .map(|f| json!({ "path": f.path.display().to_string(), "error": f.error.to_string() }))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
