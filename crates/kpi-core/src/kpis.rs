//! KPI composition over the loaded tables.
//!
//! Turns a [`Tables`] mapping into named result datasets: enrollment counts,
//! revenue, average grade and pass rate per formation from the inscription
//! table, plus revenue / cost / margin from the star-schema fact table.
//! Every KPI succeeds or fails on its own; a failure carries the missing and
//! available columns and never stops the remaining KPIs.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{Aggregation, GroupedAggregator, Reduction};
use crate::enrich::left_join;
use crate::error::{KpiError, Result};
use crate::formatting::percentage;
use crate::models::{Column, ColumnType, Dataset, Tables, Value};
use crate::normalize::{normalize_columns, normalize_label};
use crate::pass_rate::{PassRateCalculator, DEFAULT_PASS_THRESHOLD};
use crate::top_n::{SortDirection, TopNSelector};
use crate::validate::validate_columns;

// ── Table and column contract ─────────────────────────────────────────────────

/// Inscription table names, in lookup order.
pub const INSCRIPTION_TABLES: [&str; 2] = ["table_inscription", "table_inscription1"];
pub const FORMATION_TABLE: &str = "table_formation";
pub const FACT_TABLE: &str = "fait_kpi";

pub const ID_FORMATION: &str = "id_formation";
pub const CODE_ETUDIANT: &str = "CODE_ETUDIANT";
pub const MONTANT_PAYE: &str = "Montant_Paye";
pub const MOYENNE_GENERALE: &str = "MOYENNE_GENERALE";
pub const CA_TOTAL_MILLIONS: &str = "ca_total_millions";
pub const COUT_TOTAL_PROFESSEUR_MILLIONS: &str = "cout_total_professeur_millions";
pub const ANNEE_ACADEMIQUE: &str = "annee_academique";

pub const NB_ETUDIANTS: &str = "Nb_Etudiants";
pub const CA_TOTAL: &str = "CA_Total";
pub const MOYENNE: &str = "Moyenne_Generale";
pub const CA_MILLIONS: &str = "CA_Total_Millions";
pub const COUT_MILLIONS: &str = "Cout_Total_Millions";
pub const MARGE_MILLIONS: &str = "Marge_Millions";
pub const MARGE_PERCENT: &str = "Marge_%";

pub const KPI_STUDENTS: &str = "Nombre d'étudiants par formation";
pub const KPI_REVENUE: &str = "Chiffre d'affaires par formation";
pub const KPI_AVERAGE: &str = "Moyenne générale par formation";
pub const KPI_PASS_RATE: &str = "Taux de réussite par formation";
pub const KPI_FINANCE: &str = "Indicateurs financiers par formation";
pub const KPI_TOP_REVENUE: &str = "Top formations par chiffre d'affaires";

const YEAR_SUFFIX: &str = " et année";

// ── Configuration ─────────────────────────────────────────────────────────────

/// How `Nb_Etudiants` counts a formation's students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StudentCountMode {
    /// Distinct `CODE_ETUDIANT` values.
    #[default]
    Distinct,
    /// Every inscription row.
    Rows,
}

impl StudentCountMode {
    fn reduction(self) -> Reduction {
        match self {
            Self::Distinct => Reduction::CountDistinct,
            Self::Rows => Reduction::RowCount,
        }
    }
}

/// Options for [`calculate_kpis`].
#[derive(Debug, Clone, PartialEq)]
pub struct KpiConfig {
    /// Inclusive passing grade.
    pub pass_threshold: f64,
    pub student_count: StudentCountMode,
    /// Also group by (`id_formation`, `annee_academique`).
    pub by_year: bool,
    /// Requested size of the revenue ranking; clamped to the groups present.
    pub top_n: Option<i64>,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            student_count: StudentCountMode::default(),
            by_year: false,
            top_n: None,
        }
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Result of one KPI computation.
#[derive(Debug)]
pub struct KpiOutcome {
    /// Human-readable KPI name.
    pub name: String,
    /// Table the KPI was computed from.
    pub source: String,
    pub result: Result<Dataset>,
}

/// All KPI outcomes, in computation order.
#[derive(Debug, Default)]
pub struct KpiReport {
    pub outcomes: Vec<KpiOutcome>,
}

impl KpiReport {
    /// Successfully computed KPIs.
    pub fn computed(&self) -> impl Iterator<Item = (&str, &Dataset)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|d| (o.name.as_str(), d)))
    }

    /// KPIs that could not be computed, with their error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &KpiError)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.computed().find(|(n, _)| *n == name).map(|(_, d)| d)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn push(&mut self, name: String, source: &str, result: Result<Dataset>) {
        match &result {
            Ok(d) => debug!("KPI '{}' computed from {}: {} rows", name, source, d.len()),
            Err(e) => warn!("KPI '{}' skipped for {}: {}", name, source, e),
        }
        self.outcomes.push(KpiOutcome {
            name,
            source: source.to_string(),
            result,
        });
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Compute every KPI the available tables support.
///
/// Tables are looked up by their logical name; column labels are matched
/// after normalization, so `" Code_Etudiant"` satisfies `CODE_ETUDIANT`.
/// When [`FORMATION_TABLE`] is present, per-formation results gain its
/// descriptive columns.
pub fn calculate_kpis(tables: &Tables, config: &KpiConfig) -> KpiReport {
    let mut report = KpiReport::default();
    let formations = formation_dimension(tables);

    if let Some((name, table)) = INSCRIPTION_TABLES
        .iter()
        .find_map(|n| tables.get(*n).map(|t| (*n, t)))
    {
        inscription_kpis(&mut report, name, table, formations.as_ref(), config);
    }

    if let Some(table) = tables.get(FACT_TABLE) {
        finance_kpis(&mut report, table, formations.as_ref(), config);
    }

    if report.is_empty() {
        debug!("No KPI source table among {:?}", tables.keys().collect::<Vec<_>>());
    }
    report
}

// ── Inscription table ─────────────────────────────────────────────────────────

fn inscription_kpis(
    report: &mut KpiReport,
    source: &str,
    table: &Dataset,
    formations: Option<&Dataset>,
    config: &KpiConfig,
) {
    let dataset = normalize_columns(table);

    for by_year in groupings(config, &dataset, source) {
        let keys = group_keys(by_year);
        let suffix = if by_year { YEAR_SUFFIX } else { "" };
        let calculator = PassRateCalculator::new(config.pass_threshold);

        let students = with_table(&dataset, |ds| {
            let mode = config.student_count.reduction();
            reduce(ds, table, &keys, CODE_ETUDIANT, mode, NB_ETUDIANTS)
        });
        report.push(format!("{KPI_STUDENTS}{suffix}"), source, enrich(students, formations));

        let revenue = enrich(
            with_table(&dataset, |ds| {
                reduce(ds, table, &keys, MONTANT_PAYE, Reduction::Sum, CA_TOTAL)
            }),
            formations,
        );
        if let (false, Some(requested)) = (by_year, config.top_n) {
            let top = match &revenue {
                Ok(revenue) => top_by_revenue(revenue, requested),
                Err(e) => Err(carry(e)),
            };
            report.push(KPI_TOP_REVENUE.to_string(), source, top);
        }
        report.push(format!("{KPI_REVENUE}{suffix}"), source, revenue);

        let average = with_table(&dataset, |ds| {
            reduce(ds, table, &keys, MOYENNE_GENERALE, Reduction::Mean, MOYENNE)
        });
        report.push(format!("{KPI_AVERAGE}{suffix}"), source, enrich(average, formations));

        let pass_rate = with_table(&dataset, |ds| {
            require(ds, table, &with_key(&keys, MOYENNE_GENERALE))?;
            let key_names = normalized(&keys);
            calculator.calculate(ds, &as_refs(&key_names), &normalize_label(MOYENNE_GENERALE))
        });
        report.push(format!("{KPI_PASS_RATE}{suffix}"), source, enrich(pass_rate, formations));
    }
}

fn top_by_revenue(revenue: &Dataset, requested: i64) -> Result<Dataset> {
    let n = TopNSelector::clamp(requested, revenue.len()).ok_or(KpiError::InvalidRange {
        requested: requested.max(0) as usize,
        available: 0,
    })?;
    TopNSelector::select(revenue, CA_TOTAL, SortDirection::Descending, n)
}

// ── Star-schema fact table ────────────────────────────────────────────────────

fn finance_kpis(
    report: &mut KpiReport,
    table: &Dataset,
    formations: Option<&Dataset>,
    config: &KpiConfig,
) {
    let dataset = normalize_columns(table);

    for by_year in groupings(config, &dataset, FACT_TABLE) {
        let keys = group_keys(by_year);
        let suffix = if by_year { YEAR_SUFFIX } else { "" };
        let result = with_table(&dataset, |ds| finance(ds, table, &keys));
        report.push(format!("{KPI_FINANCE}{suffix}"), FACT_TABLE, enrich(result, formations));
    }
}

/// Revenue and teaching cost sums per group, with the derived margin.
fn finance(dataset: &Dataset, raw: &Dataset, keys: &[&str]) -> Result<Dataset> {
    let mut contract = keys.to_vec();
    contract.extend([CA_TOTAL_MILLIONS, COUT_TOTAL_PROFESSEUR_MILLIONS]);
    require(dataset, raw, &contract)?;
    let key_names = normalized(keys);

    let sums = GroupedAggregator::aggregate_many(
        dataset,
        &as_refs(&key_names),
        &[
            Aggregation::new(normalize_label(CA_TOTAL_MILLIONS), Reduction::Sum, CA_MILLIONS),
            Aggregation::new(
                normalize_label(COUT_TOTAL_PROFESSEUR_MILLIONS),
                Reduction::Sum,
                COUT_MILLIONS,
            ),
        ],
    )?;

    let ca_idx = sums.require_column(CA_MILLIONS)?;
    let cost_idx = sums.require_column(COUT_MILLIONS)?;
    let margins: Vec<Option<f64>> = sums
        .rows()
        .iter()
        .map(|row| Some(row[ca_idx].as_f64()? - row[cost_idx].as_f64()?))
        .collect();
    let margin_rates: Vec<Value> = sums
        .rows()
        .iter()
        .zip(&margins)
        .map(|(row, margin)| {
            let ca = row[ca_idx].as_f64()?;
            percentage((*margin)?, ca, 2)
        })
        .map(Value::from)
        .collect();

    sums.with_column(
        Column::new(MARGE_MILLIONS, ColumnType::Float),
        margins.into_iter().map(Value::from).collect(),
    )?
    .with_column(Column::new(MARGE_PERCENT, ColumnType::Float), margin_rates)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Per-formation always; per (formation, year) only when asked for and the
/// table carries a year column.
fn groupings(config: &KpiConfig, dataset: &Result<Dataset>, source: &str) -> Vec<bool> {
    if !config.by_year {
        return vec![false];
    }
    let year = normalize_label(ANNEE_ACADEMIQUE);
    match dataset {
        Ok(ds) if ds.column_index(&year).is_some() => vec![false, true],
        _ => {
            debug!("{} has no {} column, skipping per-year KPIs", source, ANNEE_ACADEMIQUE);
            vec![false]
        }
    }
}

fn group_keys(by_year: bool) -> Vec<&'static str> {
    if by_year {
        vec![ID_FORMATION, ANNEE_ACADEMIQUE]
    } else {
        vec![ID_FORMATION]
    }
}

fn with_key<'a>(keys: &[&'a str], column: &'a str) -> Vec<&'a str> {
    let mut all = keys.to_vec();
    all.push(column);
    all
}

/// Run `kpi` against a table that normalized cleanly.
fn with_table(
    dataset: &Result<Dataset>,
    kpi: impl FnOnce(&Dataset) -> Result<Dataset>,
) -> Result<Dataset> {
    match dataset {
        Ok(ds) => kpi(ds),
        Err(e) => Err(carry(e)),
    }
}

/// Copy an error that several outcomes report; structured variants keep
/// their fields.
fn carry(error: &KpiError) -> KpiError {
    match error {
        KpiError::Schema { missing, available } => KpiError::Schema {
            missing: missing.clone(),
            available: available.clone(),
        },
        KpiError::MissingColumn(c) => KpiError::MissingColumn(c.clone()),
        KpiError::NonNumericColumn(c) => KpiError::NonNumericColumn(c.clone()),
        KpiError::DuplicateColumn(c) => KpiError::DuplicateColumn(c.clone()),
        other => KpiError::Other(anyhow::anyhow!("{other}")),
    }
}

fn normalized(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| normalize_label(l)).collect()
}

fn as_refs(labels: &[String]) -> Vec<&str> {
    labels.iter().map(String::as_str).collect()
}

/// Validate the contract columns against the normalized copy of `raw`.
///
/// Missing columns are reported under their contract spelling, available
/// ones as `raw` spells them.
fn require(dataset: &Dataset, raw: &Dataset, contract: &[&str]) -> Result<()> {
    let names = normalized(contract);
    match validate_columns(dataset, &as_refs(&names)) {
        Err(KpiError::Schema { missing, .. }) => Err(KpiError::Schema {
            missing: contract
                .iter()
                .zip(&names)
                .filter(|(_, n)| missing.contains(n))
                .map(|(c, _)| c.to_string())
                .collect(),
            available: raw.column_names().into_iter().map(str::to_string).collect(),
        }),
        other => other,
    }
}

fn reduce(
    dataset: &Dataset,
    raw: &Dataset,
    keys: &[&str],
    value: &str,
    reduction: Reduction,
    output: &str,
) -> Result<Dataset> {
    require(dataset, raw, &with_key(keys, value))?;
    let key_names = normalized(keys);
    GroupedAggregator::aggregate(
        dataset,
        &as_refs(&key_names),
        &normalize_label(value),
        reduction,
        output,
    )
}

/// Normalized formation dimension, when present and joinable.
fn formation_dimension(tables: &Tables) -> Option<Dataset> {
    let table = tables.get(FORMATION_TABLE)?;
    match normalize_columns(table).and_then(|ds| {
        validate_columns(&ds, &[ID_FORMATION])?;
        Ok(ds)
    }) {
        Ok(ds) => Some(ds),
        Err(e) => {
            warn!("{} not usable for enrichment: {}", FORMATION_TABLE, e);
            None
        }
    }
}

/// Attach formation labels to a successful result; a failed join keeps the
/// bare result.
fn enrich(result: Result<Dataset>, formations: Option<&Dataset>) -> Result<Dataset> {
    let (Ok(kpi), Some(dim)) = (&result, formations) else {
        return result;
    };
    match left_join(kpi, dim, ID_FORMATION) {
        Ok(joined) => Ok(joined),
        Err(e) => {
            warn!("Formation enrichment failed: {}", e);
            result
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass_rate::{PASSED_COLUMN, RATE_COLUMN, TOTAL_COLUMN};

    fn inscriptions() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new(" Code_Etudiant", ColumnType::Text),
                Column::new("Montant_Paye ", ColumnType::Float),
                Column::new("MOYENNE_GENERALE", ColumnType::Float),
                Column::new("annee_academique", ColumnType::Text),
            ],
            vec![
                vec![Value::Int(1), "A".into(), Value::Float(1000.0), Value::Float(12.0), "2022-2023".into()],
                vec![Value::Int(1), "A".into(), Value::Float(500.0), Value::Float(9.0), "2023-2024".into()],
                vec![Value::Int(1), "B".into(), Value::Float(700.0), Value::Float(10.0), "2023-2024".into()],
                vec![Value::Int(1), "C".into(), Value::Null, Value::Float(5.0), "2023-2024".into()],
                vec![Value::Int(2), "D".into(), Value::Float(3000.0), Value::Float(8.0), "2023-2024".into()],
                vec![Value::Int(3), "E".into(), Value::Float(50.0), Value::Float(15.0), "2023-2024".into()],
            ],
        )
        .unwrap()
    }

    fn formations() -> Dataset {
        Dataset::new(
            vec![
                Column::new("ID_FORMATION", ColumnType::Integer),
                Column::new("nom_formation", ColumnType::Text),
            ],
            vec![
                vec![Value::Int(1), "Licence Informatique".into()],
                vec![Value::Int(2), "Master Data Science".into()],
            ],
        )
        .unwrap()
    }

    fn fact() -> Dataset {
        Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("annee_academique", ColumnType::Text),
                Column::new("ca_total_millions", ColumnType::Float),
                Column::new("cout_total_professeur_millions", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(1), "2022-2023".into(), Value::Float(2.0), Value::Float(1.5)],
                vec![Value::Int(1), "2023-2024".into(), Value::Float(3.0), Value::Float(1.0)],
                vec![Value::Int(2), "2023-2024".into(), Value::Float(0.0), Value::Float(0.5)],
            ],
        )
        .unwrap()
    }

    fn tables(entries: Vec<(&str, Dataset)>) -> Tables {
        entries.into_iter().map(|(n, d)| (n.to_string(), d)).collect()
    }

    fn lookup<'a>(ds: &'a Dataset, id: i64, column: &str) -> &'a Value {
        let row = ds
            .rows()
            .iter()
            .position(|r| r[0] == Value::Int(id))
            .unwrap();
        ds.get(row, column).unwrap()
    }

    #[test]
    fn test_inscription_kpis() {
        let report = calculate_kpis(
            &tables(vec![("table_inscription", inscriptions())]),
            &KpiConfig::default(),
        );

        let names: Vec<&str> = report.computed().map(|(n, _)| n).collect();
        assert_eq!(names, vec![KPI_STUDENTS, KPI_REVENUE, KPI_AVERAGE, KPI_PASS_RATE]);

        let students = report.get(KPI_STUDENTS).unwrap();
        assert_eq!(students.column_names(), vec![ID_FORMATION, NB_ETUDIANTS]);
        assert_eq!(lookup(students, 1, NB_ETUDIANTS), &Value::Int(3));

        let revenue = report.get(KPI_REVENUE).unwrap();
        assert_eq!(lookup(revenue, 1, CA_TOTAL), &Value::Float(2200.0));

        let average = report.get(KPI_AVERAGE).unwrap();
        assert_eq!(lookup(average, 1, MOYENNE), &Value::Float(9.0));

        let rate = report.get(KPI_PASS_RATE).unwrap();
        assert_eq!(lookup(rate, 1, TOTAL_COLUMN), &Value::Int(4));
        assert_eq!(lookup(rate, 1, PASSED_COLUMN), &Value::Int(2));
        assert_eq!(lookup(rate, 1, RATE_COLUMN), &Value::Float(50.0));
        assert_eq!(lookup(rate, 2, RATE_COLUMN), &Value::Float(0.0));
    }

    #[test]
    fn test_row_count_mode() {
        let config = KpiConfig {
            student_count: StudentCountMode::Rows,
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("table_inscription1", inscriptions())]), &config);
        let students = report.get(KPI_STUDENTS).unwrap();
        assert_eq!(lookup(students, 1, NB_ETUDIANTS), &Value::Int(4));
    }

    #[test]
    fn test_missing_column_fails_only_that_kpi() {
        let table = Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("CODE_ETUDIANT", ColumnType::Text),
            ],
            vec![vec![Value::Int(1), "A".into()]],
        )
        .unwrap();
        let report = calculate_kpis(&tables(vec![("table_inscription", table)]), &KpiConfig::default());

        assert!(report.get(KPI_STUDENTS).is_some());
        let failures: Vec<(&str, &KpiError)> = report.failures().collect();
        assert_eq!(failures.len(), 3);
        match failures[0] {
            (KPI_REVENUE, KpiError::Schema { missing, available }) => {
                assert_eq!(missing, &vec![MONTANT_PAYE.to_string()]);
                assert_eq!(available, &vec!["id_formation".to_string(), "CODE_ETUDIANT".to_string()]);
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_enrichment_with_formation_table() {
        let report = calculate_kpis(
            &tables(vec![
                ("table_inscription", inscriptions()),
                ("table_formation", formations()),
            ]),
            &KpiConfig::default(),
        );

        let revenue = report.get(KPI_REVENUE).unwrap();
        assert_eq!(
            revenue.column_names(),
            vec![ID_FORMATION, CA_TOTAL, "nom_formation"]
        );
        assert_eq!(lookup(revenue, 2, "nom_formation"), &Value::from("Master Data Science"));
        assert_eq!(lookup(revenue, 3, "nom_formation"), &Value::Null);
        assert_eq!(revenue.len(), 3);
    }

    #[test]
    fn test_top_n_ranks_revenue_and_clamps() {
        let config = KpiConfig {
            top_n: Some(2),
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("table_inscription", inscriptions())]), &config);
        let top = report.get(KPI_TOP_REVENUE).unwrap();
        let ids: Vec<&Value> = top.column_values(0).collect();
        assert_eq!(ids, vec![&Value::Int(2), &Value::Int(1)]);

        let config = KpiConfig {
            top_n: Some(99),
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("table_inscription", inscriptions())]), &config);
        assert_eq!(report.get(KPI_TOP_REVENUE).unwrap().len(), 3);
    }

    #[test]
    fn test_by_year_variants() {
        let config = KpiConfig {
            by_year: true,
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("table_inscription", inscriptions())]), &config);

        let name = format!("{KPI_STUDENTS}{YEAR_SUFFIX}");
        let per_year = report.get(&name).unwrap();
        assert_eq!(
            per_year.column_names(),
            vec![ID_FORMATION, ANNEE_ACADEMIQUE, NB_ETUDIANTS]
        );
        assert_eq!(per_year.len(), 4);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_finance_kpis() {
        let report = calculate_kpis(&tables(vec![("fait_kpi", fact())]), &KpiConfig::default());
        let finance = report.get(KPI_FINANCE).unwrap();
        assert_eq!(
            finance.column_names(),
            vec![ID_FORMATION, CA_MILLIONS, COUT_MILLIONS, MARGE_MILLIONS, MARGE_PERCENT]
        );
        assert_eq!(lookup(finance, 1, CA_MILLIONS), &Value::Float(5.0));
        assert_eq!(lookup(finance, 1, COUT_MILLIONS), &Value::Float(2.5));
        assert_eq!(lookup(finance, 1, MARGE_MILLIONS), &Value::Float(2.5));
        assert_eq!(lookup(finance, 1, MARGE_PERCENT), &Value::Float(50.0));
        // zero revenue leaves the margin rate undefined
        assert_eq!(lookup(finance, 2, MARGE_MILLIONS), &Value::Float(-0.5));
        assert_eq!(lookup(finance, 2, MARGE_PERCENT), &Value::Null);
    }

    #[test]
    fn test_finance_by_year() {
        let config = KpiConfig {
            by_year: true,
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("fait_kpi", fact())]), &config);
        let per_year = report.get(&format!("{KPI_FINANCE}{YEAR_SUFFIX}")).unwrap();
        assert_eq!(per_year.len(), 3);
        assert_eq!(per_year.rows()[0][1], Value::from("2022-2023"));
    }

    #[test]
    fn test_no_source_tables() {
        let report = calculate_kpis(&tables(vec![("dim_temps", formations())]), &KpiConfig::default());
        assert!(report.is_empty());
    }

    #[test]
    fn test_input_tables_untouched() {
        let input = tables(vec![("table_inscription", inscriptions())]);
        let before = input.clone();
        let _ = calculate_kpis(&input, &KpiConfig::default());
        assert_eq!(input, before);
    }

    #[test]
    fn test_schema_failure_lists_columns_as_spelled() {
        let report = calculate_kpis(&tables(vec![("fait_kpi", inscriptions())]), &KpiConfig::default());
        match report.failures().next() {
            Some((KPI_FINANCE, KpiError::Schema { missing, available })) => {
                assert_eq!(
                    missing,
                    &vec![CA_TOTAL_MILLIONS.to_string(), COUT_TOTAL_PROFESSEUR_MILLIONS.to_string()]
                );
                assert_eq!(available[1], " Code_Etudiant");
                assert_eq!(available[2], "Montant_Paye ");
            }
            other => panic!("unexpected outcome: {other:?}"),
        };
    }

    #[test]
    fn test_by_year_without_year_column_skips_year_pass() {
        let table = Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("CODE_ETUDIANT", ColumnType::Text),
                Column::new("Montant_Paye", ColumnType::Float),
                Column::new("MOYENNE_GENERALE", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(1), "A".into(), Value::Float(100.0), Value::Float(11.0)],
                vec![Value::Int(2), "B".into(), Value::Float(200.0), Value::Float(7.0)],
            ],
        )
        .unwrap();
        let config = KpiConfig {
            by_year: true,
            ..KpiConfig::default()
        };

        let report = calculate_kpis(&tables(vec![("table_inscription1", table)]), &config);
        assert_eq!(report.failures().count(), 0);
        let names: Vec<&str> = report.computed().map(|(n, _)| n).collect();
        assert_eq!(names, vec![KPI_STUDENTS, KPI_REVENUE, KPI_AVERAGE, KPI_PASS_RATE]);

        let fact = fact().rename_columns(|c| c.replace("annee_academique", "periode")).unwrap();
        let report = calculate_kpis(&tables(vec![("fait_kpi", fact)]), &config);
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.get(KPI_FINANCE).is_some());
    }

    #[test]
    fn test_top_n_reports_revenue_failure() {
        let table = Dataset::new(
            vec![
                Column::new("id_formation", ColumnType::Integer),
                Column::new("CODE_ETUDIANT", ColumnType::Text),
            ],
            vec![vec![Value::Int(1), "A".into()]],
        )
        .unwrap();
        let config = KpiConfig {
            top_n: Some(3),
            ..KpiConfig::default()
        };
        let report = calculate_kpis(&tables(vec![("table_inscription", table)]), &config);

        let top = report
            .outcomes
            .iter()
            .find(|o| o.name == KPI_TOP_REVENUE)
            .unwrap();
        match &top.result {
            Err(KpiError::Schema { missing, .. }) => {
                assert_eq!(missing, &vec![MONTANT_PAYE.to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
