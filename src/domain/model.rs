use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

// `%Y` alone accepts any digit count
static DATE_BOUND_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("date bound regex"));

/// One cell of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Null or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(n) => n.is_nan(),
            Value::Date(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// A row; values line up with [`Table::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }
}

/// Read-only table. Filtering always yields a new table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// 每一列必須與欄位數相同
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(EtlError::configuration(format!(
                    "duplicate column name '{}'",
                    column
                )));
            }
        }

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, values)| {
                if values.len() != columns.len() {
                    return Err(EtlError::configuration(format!(
                        "row {} has {} values, expected {}",
                        index + 1,
                        values.len(),
                        columns.len()
                    )));
                }
                Ok(Record { values })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns, records })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Record) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Split into (matching, non-matching), preserving row order in both.
    pub fn partition<F>(&self, mut matches: F) -> (Table, Table)
    where
        F: FnMut(&Record) -> bool,
    {
        let (matched, unmatched): (Vec<Record>, Vec<Record>) =
            self.records.iter().cloned().partition(|r| matches(r));
        (
            Table {
                columns: self.columns.clone(),
                records: matched,
            },
            Table {
                columns: self.columns.clone(),
                records: unmatched,
            },
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnRole {
    IncidentType,
    TransferFlag,
    Date,
    Category,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnRole::IncidentType => "incident_type",
            ColumnRole::TransferFlag => "transfer_flag",
            ColumnRole::Date => "date",
            ColumnRole::Category => "category",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column chosen for each role; at most one per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRoles {
    pub incident_type: Option<String>,
    pub transfer_flag: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
}

impl ColumnRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: ColumnRole, column: impl Into<String>) -> Self {
        self.assign(role, column);
        self
    }

    pub fn assign(&mut self, role: ColumnRole, column: impl Into<String>) {
        let slot = match role {
            ColumnRole::IncidentType => &mut self.incident_type,
            ColumnRole::TransferFlag => &mut self.transfer_flag,
            ColumnRole::Date => &mut self.date,
            ColumnRole::Category => &mut self.category,
        };
        *slot = Some(column.into());
    }

    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::IncidentType => self.incident_type.as_deref(),
            ColumnRole::TransferFlag => self.transfer_flag.as_deref(),
            ColumnRole::Date => self.date.as_deref(),
            ColumnRole::Category => self.category.as_deref(),
        }
    }

    /// Index of the column bound to `role`, failing if unassigned or absent from `table`.
    pub fn require(&self, role: ColumnRole, table: &Table) -> Result<usize> {
        let column = self.get(role).ok_or_else(|| {
            EtlError::configuration(format!("no column selected for role '{}'", role))
        })?;
        table.column_index(column).ok_or_else(|| {
            EtlError::configuration(format!(
                "column '{}' selected for role '{}' is not in the table",
                column, role
            ))
        })
    }
}

/// Inclusive date bounds; `start <= end` is enforced on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub const INPUT_FORMAT: &'static str = "%d/%m/%Y";

    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EtlError::configuration(format!(
                "start date {} is after end date {}",
                start.format(Self::INPUT_FORMAT),
                end.format(Self::INPUT_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `dd/mm/YYYY` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(Self::parse_bound("start", start)?, Self::parse_bound("end", end)?)
    }

    fn parse_bound(which: &str, raw: &str) -> Result<NaiveDate> {
        let invalid = || {
            EtlError::configuration(format!(
                "{} date '{}' is not in dd/mm/YYYY format",
                which, raw
            ))
        };
        let trimmed = raw.trim();
        if !DATE_BOUND_SHAPE.is_match(trimmed) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(trimmed, Self::INPUT_FORMAT).map_err(|_| invalid())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(Self::INPUT_FORMAT),
            self.end.format(Self::INPUT_FORMAT)
        )
    }
}

/// Partition by `column == match_value` after trimming and upper-casing both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySplit {
    column: String,
    match_value: String,
}

impl CategorySplit {
    pub const DEFAULT_MATCH_VALUE: &'static str = "SM";

    pub fn new(column: impl Into<String>, match_value: impl Into<String>) -> Result<Self> {
        let match_value = match_value.into();
        if match_value.trim().is_empty() {
            return Err(EtlError::configuration("category match value cannot be blank"));
        }
        Ok(Self {
            column: column.into(),
            match_value,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn match_value(&self) -> &str {
        &self.match_value
    }

    pub fn matches(&self, value: &Value) -> bool {
        value.to_string().trim().to_uppercase() == self.match_value.trim().to_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Overall,
    Matched,
    Unmatched,
}

/// Display names for each produced table and transfer total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLabels {
    pub overall_incidents: String,
    pub matched_incidents: String,
    pub unmatched_incidents: String,
    pub overall_transfers: String,
    pub matched_transfers: String,
    pub unmatched_transfers: String,
}

impl Default for ReportLabels {
    fn default() -> Self {
        Self {
            overall_incidents: "Total de Incidentes".to_string(),
            matched_incidents: "Incidentes atendidos por Servicios Médicos MAC".to_string(),
            unmatched_incidents: "Incidentes atendidos por Operativa Médica Protección Civil"
                .to_string(),
            overall_transfers: "Total de traslados".to_string(),
            matched_transfers: "Traslados por Servicios Médicos MAC".to_string(),
            unmatched_transfers: "Traslados por Operativa Médica Protección Civil".to_string(),
        }
    }
}

impl ReportLabels {
    pub fn incidents(&self, partition: Partition) -> &str {
        match partition {
            Partition::Overall => &self.overall_incidents,
            Partition::Matched => &self.matched_incidents,
            Partition::Unmatched => &self.unmatched_incidents,
        }
    }

    pub fn transfers(&self, partition: Partition) -> &str {
        match partition {
            Partition::Overall => &self.overall_transfers,
            Partition::Matched => &self.matched_transfers,
            Partition::Unmatched => &self.unmatched_transfers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub label: String,
    pub count: u64,
}

/// Incident counts sorted by descending count, ties in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountTable {
    pub name: String,
    pub partition: Partition,
    pub entries: Vec<CountEntry>,
}

impl CountTable {
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries.iter().find(|e| e.label == label).map(|e| e.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEntry {
    pub label: String,
    pub partition: Partition,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub entries: Vec<TransferEntry>,
}

impl TransferSummary {
    pub fn get(&self, partition: Partition) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.partition == partition)
            .map(|e| e.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the renderers need from one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub count_tables: Vec<CountTable>,
    pub transfers: TransferSummary,
    pub total_records: usize,
    pub considered_records: usize,
    pub date_range: Option<DateRange>,
    pub category_split: Option<CategorySplit>,
}

impl AggregateReport {
    pub fn table(&self, partition: Partition) -> Option<&CountTable> {
        self.count_tables.iter().find(|t| t.partition == partition)
    }

    pub fn overall(&self) -> Option<&CountTable> {
        self.table(Partition::Overall)
    }
}
