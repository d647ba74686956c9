//! Left outer join of a fact table against a dimension table.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::models::{Column, Dataset, Value};

/// Suffix given to a dimension column whose name already exists on the left.
pub const RIGHT_SUFFIX: &str = "_y";

/// Attach the non-key columns of `right` to every row of `left`, matched on
/// the `key` column present in both.
///
/// * Every left row is kept, in order; the result always has `left.len()`
///   rows.
/// * A left row without a match gets nulls in the attached columns.
/// * Null keys never match.
/// * When the dimension repeats a key, the first occurrence wins.
/// * An attached column whose name collides with a left column is renamed
///   with [`RIGHT_SUFFIX`].
pub fn left_join(left: &Dataset, right: &Dataset, key: &str) -> Result<Dataset> {
    let left_key = left.require_column(key)?;
    let right_key = right.require_column(key)?;

    let mut lookup: HashMap<&Value, usize> = HashMap::with_capacity(right.len());
    let mut duplicates = 0usize;
    for (idx, value) in right.column_values(right_key).enumerate() {
        if value.is_null() {
            continue;
        }
        if lookup.contains_key(value) {
            duplicates += 1;
        } else {
            lookup.insert(value, idx);
        }
    }
    if duplicates > 0 {
        debug!(
            "left_join on {}: {} duplicate dimension keys ignored",
            key, duplicates
        );
    }

    let attached: Vec<usize> = (0..right.columns().len())
        .filter(|&i| i != right_key)
        .collect();

    let mut columns = left.columns().to_vec();
    for &i in &attached {
        let source = &right.columns()[i];
        let name = if left.column_index(&source.name).is_some() {
            format!("{}{}", source.name, RIGHT_SUFFIX)
        } else {
            source.name.clone()
        };
        columns.push(Column::new(name, source.ty));
    }

    let rows = left
        .rows()
        .iter()
        .map(|row| {
            let matched = lookup.get(&row[left_key]).map(|&r| &right.rows()[r]);
            let mut out = row.clone();
            out.extend(attached.iter().map(|&i| match matched {
                Some(dim) => dim[i].clone(),
                None => Value::Null,
            }));
            out
        })
        .collect();

    Dataset::new(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KpiError;
    use crate::models::ColumnType;

    fn revenue() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("CA_Total", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(1), Value::Float(1000.0)],
                vec![Value::Int(2), Value::Float(500.0)],
                vec![Value::Int(3), Value::Float(250.0)],
                vec![Value::Null, Value::Float(10.0)],
            ],
        )
        .unwrap()
    }

    fn formations() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("nom_formation", ColumnType::Text),
                Column::new("CA_Total", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(2), "Master Data".into(), Value::Float(1.0)],
                vec![Value::Int(1), "Licence Info".into(), Value::Null],
                vec![Value::Int(1), "Doublon".into(), Value::Null],
                vec![Value::Null, "Sans clé".into(), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_left_join_attaches_labels() {
        let joined = left_join(&revenue(), &formations(), "id_formation").unwrap();
        assert_eq!(
            joined.column_names(),
            vec!["id_formation", "CA_Total", "nom_formation", "CA_Total_y"]
        );
        assert_eq!(joined.get(0, "nom_formation"), Some(&Value::from("Licence Info")));
        assert_eq!(joined.get(1, "nom_formation"), Some(&Value::from("Master Data")));
        assert_eq!(joined.get(1, "CA_Total_y"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_left_join_keeps_unmatched_rows_with_nulls() {
        let joined = left_join(&revenue(), &formations(), "id_formation").unwrap();
        assert_eq!(joined.get(2, "id_formation"), Some(&Value::Int(3)));
        assert_eq!(joined.get(2, "nom_formation"), Some(&Value::Null));
        // null key does not pick up the dimension's null-keyed row
        assert_eq!(joined.get(3, "nom_formation"), Some(&Value::Null));
    }

    #[test]
    fn test_left_join_preserves_row_count() {
        let left = revenue();
        for right in [formations(), formations().head(0), formations().head(1)] {
            assert_eq!(left_join(&left, &right, "id_formation").unwrap().len(), left.len());
        }
    }

    #[test]
    fn test_left_join_first_duplicate_wins() {
        let joined = left_join(&revenue(), &formations(), "id_formation").unwrap();
        assert_eq!(joined.get(0, "nom_formation"), Some(&Value::from("Licence Info")));
    }

    #[test]
    fn test_left_join_preserves_left_order_and_values() {
        let left = revenue();
        let joined = left_join(&left, &formations(), "id_formation").unwrap();
        for (i, row) in left.rows().iter().enumerate() {
            assert_eq!(&joined.rows()[i][..2], &row[..]);
        }
    }

    #[test]
    fn test_left_join_missing_key() {
        let dim = Dataset::empty(vec![Column::new("code", ColumnType::Text)]).unwrap();
        let err = left_join(&revenue(), &dim, "id_formation").unwrap_err();
        assert!(matches!(err, KpiError::MissingColumn(c) if c == "id_formation"));
    }
}
