//! Canonical forms for comparing cell values: folded text, dates and yes/no flags.
//!
//! None of these functions fail. Unparseable input resolves to `None`/`false`,
//! which callers treat as "excluded" rather than as an error.

use crate::domain::model::Value;
use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Values read as "yes" after trimming and lower-casing.
const AFFIRMATIVE_TOKENS: &[&str] = &[
    "sí", "si", "s", "yes", "y", "true", "verdadero", "1", "confirmado", "confirmada",
    "confirmed", "ok", "x", "✓", "✔", "☑", "✅",
];

/// Earliest year accepted by the date plausibility check.
const MIN_PLAUSIBLE_YEAR: i32 = 2000;

const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("enero", "january"),
    ("febrero", "february"),
    ("marzo", "march"),
    ("abril", "april"),
    ("mayo", "may"),
    ("junio", "june"),
    ("julio", "july"),
    ("agosto", "august"),
    ("septiembre", "september"),
    ("setiembre", "september"),
    ("octubre", "october"),
    ("noviembre", "november"),
    ("diciembre", "december"),
    ("ene", "jan"),
    ("abr", "apr"),
    ("ago", "aug"),
    ("set", "sep"),
    ("dic", "dec"),
];

struct DatePattern {
    shape: Regex,
    format: &'static str,
    with_time: bool,
    month_names: bool,
}

impl DatePattern {
    fn date(shape: &str, format: &'static str) -> Self {
        Self::build(shape, format, false, false)
    }

    fn date_time(shape: &str, format: &'static str) -> Self {
        Self::build(shape, format, true, false)
    }

    fn named(shape: &str, format: &'static str) -> Self {
        Self::build(shape, format, false, true)
    }

    fn build(shape: &str, format: &'static str, with_time: bool, month_names: bool) -> Self {
        Self {
            shape: Regex::new(shape).expect("date shape regex"),
            format,
            with_time,
            month_names,
        }
    }

    fn parse(&self, input: &str) -> Option<NaiveDate> {
        if !self.shape.is_match(input) {
            return None;
        }
        if self.with_time {
            NaiveDateTime::parse_from_str(input, self.format)
                .ok()
                .map(|dt| dt.date())
        } else {
            NaiveDate::parse_from_str(input, self.format).ok()
        }
    }
}

// 順序固定：第一個成功解析的格式勝出
static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        DatePattern::date(r"^\d{1,2}/\d{1,2}/\d{4}$", "%d/%m/%Y"),
        DatePattern::date(r"^\d{1,2}/\d{1,2}/\d{2}$", "%d/%m/%y"),
        DatePattern::date(r"^\d{4}-\d{1,2}-\d{1,2}$", "%Y-%m-%d"),
        DatePattern::date(r"^\d{1,2}-\d{1,2}-\d{4}$", "%d-%m-%Y"),
        DatePattern::date(r"^\d{1,2}-\d{1,2}-\d{2}$", "%d-%m-%y"),
        DatePattern::date(r"^\d{1,2}\.\d{1,2}\.\d{4}$", "%d.%m.%Y"),
        DatePattern::date(r"^\d{1,2}\.\d{1,2}\.\d{2}$", "%d.%m.%y"),
        DatePattern::date(r"^\d{4}/\d{1,2}/\d{1,2}$", "%Y/%m/%d"),
        // US month-first, only reached when the day-first reading is impossible
        DatePattern::date(r"^\d{1,2}/\d{1,2}/\d{4}$", "%m/%d/%Y"),
        DatePattern::date(r"^\d{1,2}-\d{1,2}-\d{4}$", "%m-%d-%Y"),
        DatePattern::date_time(
            r"^\d{4}-\d{1,2}-\d{1,2} \d{1,2}:\d{2}:\d{2}(\.\d+)?$",
            "%Y-%m-%d %H:%M:%S%.f",
        ),
        DatePattern::date_time(
            r"^\d{4}-\d{1,2}-\d{1,2}T\d{1,2}:\d{2}:\d{2}(\.\d+)?$",
            "%Y-%m-%dT%H:%M:%S%.f",
        ),
        DatePattern::date_time(r"^\d{4}-\d{1,2}-\d{1,2} \d{1,2}:\d{2}$", "%Y-%m-%d %H:%M"),
        DatePattern::date_time(r"^\d{4}-\d{1,2}-\d{1,2}T\d{1,2}:\d{2}$", "%Y-%m-%dT%H:%M"),
        DatePattern::date_time(
            r"^\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}:\d{2}$",
            "%d/%m/%Y %H:%M:%S",
        ),
        DatePattern::date_time(r"^\d{1,2}/\d{1,2}/\d{4} \d{1,2}:\d{2}$", "%d/%m/%Y %H:%M"),
        DatePattern::named(r"(?i)^\d{1,2} [a-z]+ \d{4}$", "%d %B %Y"),
        DatePattern::named(r"(?i)^[a-z]+ \d{1,2}, \d{4}$", "%B %d, %Y"),
        DatePattern::named(r"(?i)^[a-z]+ \d{1,2} \d{4}$", "%B %d %Y"),
        DatePattern::named(r"(?i)^\d{1,2}-[a-z]+-\d{4}$", "%d-%B-%Y"),
    ]
});

static SPANISH_CONNECTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+del?\s+").expect("connector regex"));

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}+").expect("word regex"));

/// Lower-case, strip diacritics, trim.
pub fn normalize_str(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Folds text values; anything else is returned unchanged.
pub fn normalize_text(value: &Value) -> Value {
    match value {
        Value::Text(text) => Value::Text(normalize_str(text)),
        other => other.clone(),
    }
}

/// [`parse_date_at`] against today's local date.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    parse_date_at(value, Local::now().date_naive())
}

/// Parse a cell as a calendar date, `None` when unparseable or implausible.
///
/// Plausible means a year of at least 2000 and no later than one year after `today`.
/// Cells that already hold a date are returned as-is.
pub fn parse_date_at(value: &Value, today: NaiveDate) -> Option<NaiveDate> {
    let raw = match value {
        Value::Null => return None,
        Value::Date(date) => return Some(*date),
        Value::Text(text) => text.clone(),
        Value::Number(_) => value.to_string(),
    };

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    let translated = translate_month_names(&collapsed);

    let parsed = DATE_PATTERNS.iter().find_map(|pattern| {
        let input = if pattern.month_names {
            translated.as_str()
        } else {
            collapsed.as_str()
        };
        pattern.parse(input)
    })?;

    is_plausible(parsed, today).then_some(parsed)
}

fn is_plausible(date: NaiveDate, today: NaiveDate) -> bool {
    let latest = today
        .checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX);
    date.year() >= MIN_PLAUSIBLE_YEAR && date <= latest
}

/// "5 de marzo de 2024" -> "5 march 2024"
fn translate_month_names(input: &str) -> String {
    let without_connectors = SPANISH_CONNECTOR.replace_all(input, " ");
    WORD.replace_all(&without_connectors, |caps: &regex::Captures| {
        let word = normalize_str(&caps[0]);
        SPANISH_MONTHS
            .iter()
            .find(|(es, _)| *es == word)
            .map(|(_, en)| (*en).to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Whether a transfer-flag cell means "yes".
pub fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Null | Value::Date(_) => false,
        Value::Number(n) => *n > 0.0,
        Value::Text(text) => is_affirmative_str(text),
    }
}

fn is_affirmative_str(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    if AFFIRMATIVE_TOKENS.contains(&lowered.as_str())
        || AFFIRMATIVE_TOKENS.contains(&normalize_str(&lowered).as_str())
    {
        return true;
    }
    trimmed.parse::<f64>().map(|n| n > 0.0).unwrap_or(false)
}
