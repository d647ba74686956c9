//! Per-group reductions over one or more key columns.

use std::collections::{BTreeMap, HashSet};

use crate::error::{KpiError, Result};
use crate::models::{Column, ColumnType, Dataset, Value};

// ── Reduction ─────────────────────────────────────────────────────────────────

/// How the values of one column collapse into a single value per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Number of distinct non-null values (e.g. distinct student codes).
    CountDistinct,
    /// Number of rows in the group, nulls included.
    RowCount,
    /// Sum of non-null values; `0` for a group with none.
    Sum,
    /// Mean of non-null values; null for a group with none.
    Mean,
}

impl Reduction {
    fn output_type(self, input: ColumnType) -> ColumnType {
        match self {
            Self::CountDistinct | Self::RowCount => ColumnType::Integer,
            Self::Sum if input == ColumnType::Integer => ColumnType::Integer,
            Self::Sum | Self::Mean => ColumnType::Float,
        }
    }

    fn needs_numeric(self) -> bool {
        matches!(self, Self::Sum | Self::Mean)
    }

    fn apply<'a>(self, values: impl Iterator<Item = &'a Value>, output: ColumnType) -> Value {
        match self {
            Self::CountDistinct => {
                let distinct: HashSet<&Value> = values.filter(|v| !v.is_null()).collect();
                Value::Int(distinct.len() as i64)
            }
            Self::RowCount => Value::Int(values.count() as i64),
            Self::Sum if output == ColumnType::Integer => Value::Int(
                values
                    .filter_map(|v| match v {
                        Value::Int(i) => Some(*i),
                        _ => None,
                    })
                    .fold(0i64, i64::saturating_add),
            ),
            Self::Sum => Value::Float(values.filter_map(Value::as_f64).sum()),
            Self::Mean => {
                let (sum, count) = values
                    .filter_map(Value::as_f64)
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count == 0 {
                    Value::Null
                } else {
                    Value::Float(sum / count as f64)
                }
            }
        }
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// One output column of a grouped aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Source column the reduction reads.
    pub column: String,
    pub reduction: Reduction,
    /// Name of the produced column.
    pub output: String,
}

impl Aggregation {
    pub fn new(column: impl Into<String>, reduction: Reduction, output: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reduction,
            output: output.into(),
        }
    }
}

// ── GroupedAggregator ─────────────────────────────────────────────────────────

/// Stateless helper that groups dataset rows by key columns and reduces
/// each group.
///
/// Every distinct key tuple present in the input, null keys included,
/// yields exactly one output row. Output rows come in ascending key order.
pub struct GroupedAggregator;

impl GroupedAggregator {
    /// Reduce `value` per group of `keys` into a column named `output`.
    pub fn aggregate(
        dataset: &Dataset,
        keys: &[&str],
        value: &str,
        reduction: Reduction,
        output: &str,
    ) -> Result<Dataset> {
        Self::aggregate_many(dataset, keys, &[Aggregation::new(value, reduction, output)])
    }

    /// Apply several reductions over the same grouping in one pass.
    ///
    /// The result holds the key columns followed by one column per
    /// aggregation, in the given order.
    pub fn aggregate_many(
        dataset: &Dataset,
        keys: &[&str],
        aggregations: &[Aggregation],
    ) -> Result<Dataset> {
        let key_idx = key_indices(dataset, keys)?;

        let mut plan = Vec::with_capacity(aggregations.len());
        for agg in aggregations {
            let idx = dataset.require_column(&agg.column)?;
            let input = dataset.columns()[idx].ty;
            if agg.reduction.needs_numeric() && !input.is_numeric() {
                return Err(KpiError::NonNumericColumn(agg.column.clone()));
            }
            plan.push((idx, agg, agg.reduction.output_type(input)));
        }

        let groups = Self::group_rows(dataset, keys)?;

        let mut columns: Vec<Column> = key_idx
            .iter()
            .map(|&i| dataset.columns()[i].clone())
            .collect();
        columns.extend(
            plan.iter()
                .map(|(_, agg, ty)| Column::new(agg.output.clone(), *ty)),
        );

        let rows = groups
            .into_iter()
            .map(|(mut key, members)| {
                for (idx, agg, ty) in &plan {
                    let values = members.iter().map(|&r| &dataset.rows()[r][*idx]);
                    key.push(agg.reduction.apply(values, *ty));
                }
                key
            })
            .collect();

        Dataset::new(columns, rows)
    }

    /// Row indices of `dataset` bucketed by their key tuple.
    pub fn group_rows(dataset: &Dataset, keys: &[&str]) -> Result<BTreeMap<Vec<Value>, Vec<usize>>> {
        let key_idx = key_indices(dataset, keys)?;

        let mut groups: BTreeMap<Vec<Value>, Vec<usize>> = BTreeMap::new();
        for (row_idx, row) in dataset.rows().iter().enumerate() {
            let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
            groups.entry(key).or_default().push(row_idx);
        }
        Ok(groups)
    }
}

fn key_indices(dataset: &Dataset, keys: &[&str]) -> Result<Vec<usize>> {
    keys.iter().map(|k| dataset.require_column(k)).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
