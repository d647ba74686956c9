//! Column label normalization.
//!
//! Extracts arrive with inconsistent header casing and stray whitespace
//! (`" CODE_ETUDIANT"`, `"Id_Formation "`). Normalizing trims and
//! lower-cases every label so that such datasets compare equal.

use crate::error::Result;
use crate::models::Dataset;

/// Trim surrounding whitespace and lower-case a single label.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Return `dataset` with every column label normalized. Row values are
/// untouched.
///
/// Fails with [`crate::error::KpiError::DuplicateColumn`] when two labels
/// collapse onto the same normalized name.
pub fn normalize_columns(dataset: &Dataset) -> Result<Dataset> {
    dataset.rename_columns(normalize_label)
}
