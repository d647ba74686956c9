//! Required-column checks run before any aggregation.

use crate::error::{KpiError, Result};
use crate::models::Dataset;

/// Ensure every name in `required` is a column of `dataset`.
///
/// On failure the error lists the missing names in `required` order and
/// every available column in dataset order.
pub fn validate_columns(dataset: &Dataset, required: &[&str]) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| dataset.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    Err(KpiError::Schema {
        missing,
        available: dataset
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnType};

    fn enrollments() -> Dataset {
        Dataset::empty(vec![
            Column::new("id_formation", ColumnType::Integer),
            Column::new("CODE_ETUDIANT", ColumnType::Text),
        ])
        .unwrap()
    }

    #[test]
    fn test_validate_columns_ok() {
        assert!(validate_columns(&enrollments(), &["id_formation", "CODE_ETUDIANT"]).is_ok());
        assert!(validate_columns(&enrollments(), &[]).is_ok());
    }

    #[test]
    fn test_validate_columns_reports_missing_and_available() {
        let err = validate_columns(&enrollments(), &["id_formation", "Montant_Paye"]).unwrap_err();
        match err {
            KpiError::Schema { missing, available } => {
                assert_eq!(missing, vec!["Montant_Paye"]);
                assert_eq!(available, vec!["id_formation", "CODE_ETUDIANT"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_columns_is_case_sensitive() {
        let err = validate_columns(&enrollments(), &["code_etudiant"]).unwrap_err();
        assert!(matches!(err, KpiError::Schema { missing, .. } if missing == vec!["code_etudiant"]));
    }
}
