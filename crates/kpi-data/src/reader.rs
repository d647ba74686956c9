//! CSV discovery and loading.
//!
//! Scans a folder for `*.csv` extracts and turns each into a typed
//! [`Dataset`] keyed by its lower-cased file stem. A file that fails to load
//! is reported and skipped; the rest of the batch still loads.

use std::path::{Path, PathBuf};

use kpi_core::error::{KpiError, Result};
use kpi_core::models::{Column, ColumnType, Dataset, Tables, Value};
use tracing::{debug, warn};

/// Delimiters tried by [`sniff_delimiter`], in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines inspected when sniffing the delimiter.
const SNIFF_LINES: usize = 10;

/// Cell spellings read as missing.
const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ── Public API ────────────────────────────────────────────────────────────────

/// A file that could not be turned into a table.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: KpiError,
}

/// Outcome of loading a folder.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tables: Tables,
    pub failures: Vec<LoadFailure>,
}

/// Find the `.csv` files directly under `data_path` (extension matched
/// case-insensitively), sorted by path.
pub fn find_csv_files(data_path: &Path) -> Vec<PathBuf> {
    if !data_path.exists() {
        warn!("Data path does not exist: {}", data_path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(data_path)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Logical table name for a file: the lower-cased stem.
///
/// `Table_Inscription1.csv` → `table_inscription1`.
pub fn table_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
}

/// Load every CSV under `data_path`.
///
/// Fails only when the folder itself is missing. When two files map to the
/// same table name the first one (by path) is kept.
pub fn load_tables(data_path: &Path) -> Result<LoadReport> {
    if !data_path.is_dir() {
        return Err(KpiError::DataPathNotFound(data_path.to_path_buf()));
    }

    let mut report = LoadReport::default();
    let files = find_csv_files(data_path);
    if files.is_empty() {
        warn!("No CSV files found in {}", data_path.display());
    }

    for path in files {
        let Some(name) = table_name(&path) else {
            continue;
        };
        if report.tables.contains_key(&name) {
            warn!("Skipping {}: table {} already loaded", path.display(), name);
            continue;
        }
        match read_csv_table(&path) {
            Ok(table) => {
                debug!(
                    "Loaded {} from {}: {} rows, {} columns",
                    name,
                    path.display(),
                    table.len(),
                    table.columns().len()
                );
                report.tables.insert(name, table);
            }
            Err(error) => {
                warn!("Error loading {}: {}", path.display(), error);
                report.failures.push(LoadFailure { path, error });
            }
        }
    }

    Ok(report)
}

/// Read one CSV file into a typed dataset.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn read_csv_table(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path).map_err(|source| KpiError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&String::from_utf8_lossy(&bytes), path)
}

/// Parse CSV text, sniffing the delimiter and inferring column types.
///
/// `origin` only labels errors.
pub fn parse_csv(content: &str, origin: &Path) -> Result<Dataset> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let delimiter = sniff_delimiter(content);

    let csv_error = |e: csv::Error| KpiError::CsvParse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(KpiError::CsvParse {
            path: origin.to_path_buf(),
            message: "no header row".to_string(),
        });
    }

    let mut cells: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if record.len() > headers.len() {
            return Err(KpiError::CsvParse {
                path: origin.to_path_buf(),
                message: format!(
                    "line {}: {} fields, header has {}",
                    idx + 2,
                    record.len(),
                    headers.len()
                ),
            });
        }
        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|cell| (!NA_VALUES.contains(&cell)).then(|| cell.to_string()))
            .collect();
        row.resize(headers.len(), None);
        cells.push(row);
    }

    let types: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_type(cells.iter().filter_map(|row| row[i].as_deref())))
        .collect();

    let columns = headers
        .into_iter()
        .zip(&types)
        .map(|(name, ty)| Column::new(name, *ty))
        .collect();
    let rows = cells
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&types)
                .map(|(cell, ty)| typed_value(cell, *ty))
                .collect()
        })
        .collect();

    Dataset::new(columns, rows)
}

/// Pick the delimiter that splits the first lines most consistently.
///
/// A candidate that appears the same non-zero number of times on every
/// sampled line wins, preferring the highest count; otherwise the candidate
/// most frequent on the header line; otherwise `,`.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    if lines.is_empty() {
        return b',';
    }

    let counts: Vec<Vec<usize>> = DELIMITERS
        .iter()
        .map(|&d| lines.iter().map(|l| count_unquoted(l, d)).collect())
        .collect();

    let consistent = DELIMITERS
        .iter()
        .zip(&counts)
        .filter(|(_, c)| c[0] > 0 && c.iter().all(|n| *n == c[0]))
        .max_by(|a, b| a.1[0].cmp(&b.1[0]).then(std::cmp::Ordering::Greater));
    if let Some((&d, _)) = consistent {
        return d;
    }

    DELIMITERS
        .iter()
        .zip(&counts)
        .filter(|(_, c)| c[0] > 0)
        .max_by(|a, b| a.1[0].cmp(&b.1[0]).then(std::cmp::Ordering::Greater))
        .map(|(&d, _)| d)
        .unwrap_or(b',')
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Occurrences of `delimiter` outside double-quoted sections.
fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for b in line.bytes() {
        if b == b'"' {
            quoted = !quoted;
        } else if b == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Integer when every present cell parses as `i64`, float when every cell is
/// numeric, text otherwise. A column with no present cell is float, so sums
/// and means over it still apply.
fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut seen = false;
    let mut all_int = true;
    for cell in cells {
        seen = true;
        if all_int && cell.parse::<i64>().is_ok() {
            continue;
        }
        all_int = false;
        if cell.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }
    match (seen, all_int) {
        (false, _) => ColumnType::Float,
        (true, true) => ColumnType::Integer,
        (true, false) => ColumnType::Float,
    }
}

fn typed_value(cell: Option<String>, ty: ColumnType) -> Value {
    let Some(cell) = cell else {
        return Value::Null;
    };
    match ty {
        ColumnType::Integer => cell.parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
        ColumnType::Float => cell.parse::<f64>().map(Value::from).unwrap_or(Value::Null),
        ColumnType::Text => Value::Text(cell),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
