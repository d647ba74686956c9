use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{KpiError, Result};

/// Logical table name (lower-cased, extension stripped) to parsed dataset.
pub type Tables = BTreeMap<String, Dataset>;

// ── ColumnType ────────────────────────────────────────────────────────────────

/// Declared semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Whole numbers (identifiers, counts, years).
    Integer,
    /// Decimal numbers (amounts, grades).
    Float,
    /// Free text.
    Text,
}

impl ColumnType {
    /// Integer and float columns can be reduced with sum / mean.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A single typed cell.
///
/// Values are totally ordered and hashable so they can serve as group keys.
/// Ordering ranks variants `Null < Int < Float < Text`; floats compare with
/// [`f64::total_cmp`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value; `None` for nulls and text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value may be stored in a column of type `ty`.
    pub fn fits(&self, ty: ColumnType) -> bool {
        matches!(
            (self, ty),
            (Self::Null, _)
                | (Self::Int(_), ColumnType::Integer)
                | (Self::Float(_), ColumnType::Float)
                | (Self::Text(_), ColumnType::Text)
        )
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Null => {}
            Self::Int(v) => v.hash(state),
            // total_cmp equality is bit equality
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Self::Null
        } else {
            Self::Float(v)
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ── Column ────────────────────────────────────────────────────────────────────

/// One entry of a dataset's schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

// ── Dataset ───────────────────────────────────────────────────────────────────

/// An immutable, typed table: an ordered column list plus row-major values.
///
/// Every row holds exactly one value per column and every non-null value
/// matches its column's declared type. Transformations never touch `self`;
/// they return a new dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, enforcing the schema descriptor.
    ///
    /// `Int` values in a `Float` column are widened to `Float`.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(KpiError::DuplicateColumn(column.name.clone()));
            }
        }

        let mut checked = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(KpiError::RaggedRow {
                    row: row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            let row = row
                .into_iter()
                .zip(&columns)
                .map(|(value, column)| match value {
                    Value::Int(v) if column.ty == ColumnType::Float => Ok(Value::Float(v as f64)),
                    Value::Float(v) if v.is_nan() => Ok(Value::Null),
                    v if v.fits(column.ty) => Ok(v),
                    _ => Err(KpiError::TypeMismatch {
                        column: column.name.clone(),
                        row: row_idx,
                        expected: column.ty,
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            checked.push(row);
        }

        Ok(Self {
            columns,
            rows: checked,
        })
    }

    /// A dataset with the given columns and no rows.
    pub fn empty(columns: Vec<Column>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Like [`Dataset::column_index`] but fails with
    /// [`KpiError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| KpiError::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All values of the column at `idx`, in row order.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Value at (`row`, column `name`), if both exist.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// A new dataset with `column` appended.
    pub fn with_column(&self, column: Column, values: Vec<Value>) -> Result<Self> {
        if values.len() != self.rows.len() {
            return Err(KpiError::RaggedRow {
                row: self.rows.len().min(values.len()),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        let mut columns = self.columns.clone();
        columns.push(column);
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.push(value);
                row
            })
            .collect();
        Self::new(columns, rows)
    }

    /// A new dataset with every column label passed through `rename`.
    pub fn rename_columns(&self, rename: impl Fn(&str) -> String) -> Result<Self> {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(rename(&c.name), c.ty))
            .collect();
        Self::new(columns, self.rows.clone())
    }

    /// The first `n` rows (all rows when `n` exceeds the length).
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// The rows at `indices`, in the given order.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(c, v)| {
                        let json = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
                        (c.name.clone(), json)
                    })
                    .collect()
            })
            .collect()
    }
}
