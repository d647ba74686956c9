//! Per-group pass rate over a score column.

use crate::aggregate::GroupedAggregator;
use crate::error::{KpiError, Result};
use crate::formatting::percentage;
use crate::models::{Column, ColumnType, Dataset, Value};

/// Passing grade on the 0–20 scale, inclusive.
pub const DEFAULT_PASS_THRESHOLD: f64 = 10.0;

pub const TOTAL_COLUMN: &str = "Total_Inscrits";
pub const PASSED_COLUMN: &str = "Total_Reussis";
pub const RATE_COLUMN: &str = "Taux_Reussite_%";

/// Computes, per group, how many rows reach the threshold.
///
/// Output columns: the key columns, [`TOTAL_COLUMN`] (rows in the group),
/// [`PASSED_COLUMN`] (rows with `score >= threshold`) and [`RATE_COLUMN`]
/// (`passed / total * 100`, two decimals, ties to even). Rows with a missing
/// score count toward the total but never pass.
#[derive(Debug, Clone, Copy)]
pub struct PassRateCalculator {
    threshold: f64,
}

impl Default for PassRateCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_PASS_THRESHOLD)
    }
}

impl PassRateCalculator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn calculate(&self, dataset: &Dataset, keys: &[&str], score: &str) -> Result<Dataset> {
        let score_idx = dataset.require_column(score)?;
        if !dataset.columns()[score_idx].ty.is_numeric() {
            return Err(KpiError::NonNumericColumn(score.to_string()));
        }

        let groups = GroupedAggregator::group_rows(dataset, keys)?;

        let mut columns = Vec::with_capacity(keys.len() + 3);
        for key in keys {
            let idx = dataset.require_column(key)?;
            columns.push(dataset.columns()[idx].clone());
        }
        columns.push(Column::new(TOTAL_COLUMN, ColumnType::Integer));
        columns.push(Column::new(PASSED_COLUMN, ColumnType::Integer));
        columns.push(Column::new(RATE_COLUMN, ColumnType::Float));

        let rows = groups
            .into_iter()
            .map(|(mut key, members)| {
                let total = members.len();
                let passed = members
                    .iter()
                    .filter_map(|&r| dataset.rows()[r][score_idx].as_f64())
                    .filter(|&s| s >= self.threshold)
                    .count();
                key.push(Value::Int(total as i64));
                key.push(Value::Int(passed as i64));
                key.push(percentage(passed as f64, total as f64, 2).into());
                key
            })
            .collect();

        Dataset::new(columns, rows)
    }
}
