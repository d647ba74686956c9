//! Descriptive statistics for exploring a loaded table.
//!
//! Each function returns a plain [`Dataset`] so the caller can render it the
//! same way as any KPI result.

use crate::error::Result;
use crate::models::{Column, ColumnType, Dataset, Value};

pub const STATISTIC_COLUMN: &str = "statistic";
pub const NAME_COLUMN: &str = "column";
pub const MISSING_COLUMN: &str = "missing";

const STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using linear
/// interpolation between the closest ranks.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> Option<f64> {
    let len = sorted_data.len();
    if len == 0 {
        return None;
    }
    if len == 1 {
        return Some(sorted_data[0]);
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted_data[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo]))
}

// ── describe ──────────────────────────────────────────────────────────────────

/// Summary statistics for every numeric column.
///
/// One row per statistic (`count`, `mean`, `std`, `min`, `25%`, `50%`,
/// `75%`, `max`) and one float column per numeric input column. Nulls are
/// ignored; `std` is the sample standard deviation and is null below two
/// observations.
pub fn describe(dataset: &Dataset) -> Result<Dataset> {
    let numeric = numeric_columns(dataset);

    let mut columns = vec![Column::new(STATISTIC_COLUMN, ColumnType::Text)];
    columns.extend(
        numeric
            .iter()
            .map(|&i| Column::new(dataset.columns()[i].name.clone(), ColumnType::Float)),
    );

    let summaries: Vec<[Option<f64>; 8]> = numeric
        .iter()
        .map(|&i| summarize(&non_null(dataset, i)))
        .collect();

    let rows = STATISTICS
        .iter()
        .enumerate()
        .map(|(s, name)| {
            let mut row = vec![Value::from(*name)];
            row.extend(summaries.iter().map(|summary| Value::from(summary[s])));
            row
        })
        .collect();

    Dataset::new(columns, rows)
}

fn summarize(values: &[f64]) -> [Option<f64>; 8] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(m), n) if n > 1 => {
            let ss: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (n - 1) as f64).sqrt())
        }
        _ => None,
    };

    [
        Some(count as f64),
        mean,
        std,
        sorted.first().copied(),
        percentile(&sorted, 25.0),
        percentile(&sorted, 50.0),
        percentile(&sorted, 75.0),
        sorted.last().copied(),
    ]
}

// ── missing_counts ────────────────────────────────────────────────────────────

/// Number of null cells per column, in column order.
pub fn missing_counts(dataset: &Dataset) -> Result<Dataset> {
    let rows = dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let missing = dataset.column_values(i).filter(|v| v.is_null()).count();
            vec![Value::from(c.name.as_str()), Value::Int(missing as i64)]
        })
        .collect();

    Dataset::new(
        vec![
            Column::new(NAME_COLUMN, ColumnType::Text),
            Column::new(MISSING_COLUMN, ColumnType::Integer),
        ],
        rows,
    )
}

// ── correlation ───────────────────────────────────────────────────────────────

/// Pearson correlation matrix of the numeric columns.
///
/// Each pair uses only rows where both values are present. A pair with
/// fewer than two such rows, or with zero variance, yields null.
pub fn correlation(dataset: &Dataset) -> Result<Dataset> {
    let numeric = numeric_columns(dataset);

    let mut columns = vec![Column::new(NAME_COLUMN, ColumnType::Text)];
    columns.extend(
        numeric
            .iter()
            .map(|&i| Column::new(dataset.columns()[i].name.clone(), ColumnType::Float)),
    );

    let rows = numeric
        .iter()
        .map(|&a| {
            let mut row = vec![Value::from(dataset.columns()[a].name.as_str())];
            row.extend(numeric.iter().map(|&b| Value::from(pearson(dataset, a, b))));
            row
        })
        .collect();

    Dataset::new(columns, rows)
}

fn pearson(dataset: &Dataset, a: usize, b: usize) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = dataset
        .rows()
        .iter()
        .filter_map(|row| Some((row[a].as_f64()?, row[b].as_f64()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    if a == b {
        return Some(1.0);
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn numeric_columns(dataset: &Dataset) -> Vec<usize> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.ty.is_numeric())
        .map(|(i, _)| i)
        .collect()
}

fn non_null(dataset: &Dataset, idx: usize) -> Vec<f64> {
    dataset.column_values(idx).filter_map(Value::as_f64).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
