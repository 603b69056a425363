use crate::domain::model::{Table, Value};
use crate::utils::error::Result;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Days, NaiveDate};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Builds a [`Table`] from delimited text (CSV, TSV or `;`-separated) or the
/// first sheet of a workbook.
#[derive(Debug, Clone, Default)]
pub struct TableReader {
    delimiter: Option<u8>,
}

impl TableReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a delimiter instead of guessing from the file name and header.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    pub fn read(&self, file_name: &str, data: &[u8]) -> Result<Table> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let (columns, rows) = if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
            read_workbook(data)?
        } else {
            self.read_delimited(&extension, data)?
        };

        tracing::info!(
            "📥 Loaded {} rows x {} columns from {}",
            rows.len(),
            columns.len(),
            file_name
        );
        Table::from_rows(columns, rows)
    }

    fn read_delimited(&self, extension: &str, data: &[u8]) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| guess_delimiter(extension, data));
        tracing::debug!("Reading delimited text with delimiter {:?}", delimiter as char);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        let mut records = reader.byte_records();
        let header = match records.next() {
            Some(header) => header?,
            None => return Ok((Vec::new(), Vec::new())),
        };
        let columns = header_names(header.iter().map(|f| String::from_utf8_lossy(f)));

        let mut rows = Vec::new();
        for (line, record) in records.enumerate() {
            let record = record?;
            let cells = record.iter().map(|field| coerce_cell(&String::from_utf8_lossy(field)));
            rows.push(fit_row(cells, record.len(), columns.len(), line + 2));
        }
        Ok((columns, rows))
    }
}

/// First worksheet only; the first non-empty row is the header.
fn read_workbook(data: &[u8]) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    tracing::debug!("Workbook sheets: {:?}", workbook.sheet_names());

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok((Vec::new(), Vec::new())),
    };

    let mut sheet_rows = range.rows();
    let header = match sheet_rows.next() {
        Some(header) => header,
        None => return Ok((Vec::new(), Vec::new())),
    };
    let columns = header_names(header.iter().map(|cell| Cow::Owned(cell.to_string())));

    let rows = sheet_rows
        .enumerate()
        .map(|(line, cells)| {
            fit_row(cells.iter().map(spreadsheet_cell), cells.len(), columns.len(), line + 2)
        })
        .collect();
    Ok((columns, rows))
}

/// Drop fields beyond the header, pad missing ones with `Null`.
fn fit_row<I>(cells: I, field_count: usize, width: usize, line: usize) -> Vec<Value>
where
    I: Iterator<Item = Value>,
{
    if field_count > width {
        tracing::warn!(
            "Row {} has {} fields, ignoring {} beyond the header",
            line,
            field_count,
            field_count - width
        );
    }
    let mut values: Vec<Value> = cells.take(width).collect();
    values.resize(width, Value::Null);
    values
}

fn spreadsheet_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(text) => coerce_cell(text),
        Data::Float(n) => Value::Number(*n),
        Data::Int(n) => Value::Number(*n as f64),
        Data::Bool(b) => Value::text(b.to_string()),
        Data::DateTime(dt) if dt.is_datetime() => excel_serial_date(dt.as_f64())
            .map(Value::Date)
            .unwrap_or(Value::Null),
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(text) => text
            .get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            .map(Value::Date)
            .unwrap_or_else(|| Value::text(text.as_str())),
        other => Value::text(other.to_string()),
    }
}

// 1900 日期系統：序號 0 對應 1899-12-30
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn guess_delimiter(extension: &str, data: &[u8]) -> u8 {
    if extension == "tsv" {
        return b'\t';
    }
    let first_line = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |needle: u8| first_line.iter().filter(|b| **b == needle).count();
    if count(b'\t') > count(b',') && count(b'\t') > count(b';') {
        b'\t'
    } else if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}

/// Blank names become `Unnamed: N`, repeats get a `.N` suffix.
fn header_names<'a, I>(raw: I) -> Vec<String>
where
    I: Iterator<Item = Cow<'a, str>>,
{
    let mut seen = HashSet::new();
    raw.enumerate()
        .map(|(index, name)| {
            let base = match name.trim() {
                "" => format!("Unnamed: {}", index),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            candidate
        })
        .collect()
}

fn coerce_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    let looks_numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if looks_numeric {
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }
    }
    Value::Text(raw.to_string())
}
