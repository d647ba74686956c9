//! Ranking of aggregated rows by one metric.

use std::cmp::Ordering;

use crate::error::{KpiError, Result};
use crate::models::{Dataset, Value};

/// Sort direction for [`TopNSelector::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Stateless helper that keeps the best `n` rows of a dataset.
pub struct TopNSelector;

impl TopNSelector {
    /// Stable-sort `dataset` on `column` and keep the first `n` rows.
    ///
    /// Rows with equal values keep their input order; nulls sort last in
    /// either direction. Fails with [`KpiError::InvalidRange`] unless
    /// `1 <= n <= dataset.len()`.
    pub fn select(
        dataset: &Dataset,
        column: &str,
        direction: SortDirection,
        n: usize,
    ) -> Result<Dataset> {
        let idx = dataset.require_column(column)?;
        if n == 0 || n > dataset.len() {
            return Err(KpiError::InvalidRange {
                requested: n,
                available: dataset.len(),
            });
        }

        let mut order: Vec<usize> = (0..dataset.len()).collect();
        order.sort_by(|&a, &b| {
            compare(&dataset.rows()[a][idx], &dataset.rows()[b][idx], direction)
        });
        order.truncate(n);

        Ok(dataset.take_rows(&order))
    }

    /// Clamp a user-supplied count into `1..=available`.
    ///
    /// Returns `None` when there is nothing to select.
    pub fn clamp(requested: i64, available: usize) -> Option<usize> {
        if available == 0 {
            return None;
        }
        let clamped = requested.clamp(1, available.min(i64::MAX as usize) as i64);
        Some(clamped as usize)
    }
}

fn compare(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match direction {
            SortDirection::Ascending => a.cmp(b),
            SortDirection::Descending => b.cmp(a),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType};

    fn revenue() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("CA_Total", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(1), Value::Float(300.0)],
                vec![Value::Int(2), Value::Null],
                vec![Value::Int(3), Value::Float(900.0)],
                vec![Value::Int(4), Value::Float(300.0)],
                vec![Value::Int(5), Value::Float(50.0)],
            ],
        )
        .unwrap()
    }

    fn ids(ds: &Dataset) -> Vec<i64> {
        ds.column_values(0)
            .map(|v| match v {
                Value::Int(i) => *i,
                _ => panic!("expected int"),
            })
            .collect()
    }

    #[test]
    fn test_select_descending_stable() {
        let top = TopNSelector::select(&revenue(), "CA_Total", SortDirection::Descending, 3).unwrap();
        assert_eq!(ids(&top), vec![3, 1, 4]);
    }

    #[test]
    fn test_select_nulls_last() {
        let all = TopNSelector::select(&revenue(), "CA_Total", SortDirection::Descending, 5).unwrap();
        assert_eq!(ids(&all), vec![3, 1, 4, 5, 2]);
        let asc = TopNSelector::select(&revenue(), "CA_Total", SortDirection::Ascending, 5).unwrap();
        assert_eq!(ids(&asc), vec![5, 1, 4, 3, 2]);
    }

    #[test]
    fn test_select_reselection_is_idempotent() {
        let ds = revenue();
        let top4 = TopNSelector::select(&ds, "CA_Total", SortDirection::Descending, 4).unwrap();
        for m in 1..=4 {
            let nested = TopNSelector::select(&top4, "CA_Total", SortDirection::Descending, m).unwrap();
            let direct = TopNSelector::select(&ds, "CA_Total", SortDirection::Descending, m).unwrap();
            assert_eq!(nested, direct);
        }
    }

    #[test]
    fn test_select_rejects_zero() {
        let err = TopNSelector::select(&revenue(), "CA_Total", SortDirection::Descending, 0).unwrap_err();
        assert!(matches!(
            err,
            KpiError::InvalidRange {
                requested: 0,
                available: 5
            }
        ));
    }

    #[test]
    fn test_select_rejects_more_than_rows() {
        let err = TopNSelector::select(&revenue(), "CA_Total", SortDirection::Descending, 6).unwrap_err();
        assert!(matches!(err, KpiError::InvalidRange { requested: 6, .. }));
    }

    #[test]
    fn test_select_missing_column() {
        let err = TopNSelector::select(&revenue(), "CA", SortDirection::Descending, 1).unwrap_err();
        assert!(matches!(err, KpiError::MissingColumn(_)));
    }

    #[test]
    fn test_select_does_not_touch_input() {
        let ds = revenue();
        let _ = TopNSelector::select(&ds, "CA_Total", SortDirection::Descending, 2).unwrap();
        assert_eq!(ids(&ds), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(TopNSelector::clamp(0, 5), Some(1));
        assert_eq!(TopNSelector::clamp(-3, 5), Some(1));
        assert_eq!(TopNSelector::clamp(3, 5), Some(3));
        assert_eq!(TopNSelector::clamp(50, 5), Some(5));
        assert_eq!(TopNSelector::clamp(3, 0), None);
    }
}
