//! Grouped incident counts and transfer totals over a [`Table`].

use crate::core::normalizer::{is_affirmative, normalize_str, parse_date_at};
use crate::domain::model::{
    AggregateReport, CategorySplit, ColumnRole, ColumnRoles, CountEntry, CountTable, DateRange,
    Partition, ReportLabels, Table, TransferEntry, TransferSummary, Value,
};
use crate::utils::error::{EtlError, Result};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;

/// Stateless aggregation; each call is independent of the previous one.
#[derive(Debug, Clone)]
pub struct Aggregator {
    reference_date: NaiveDate,
    labels: ReportLabels,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Uses today's local date for the date plausibility check.
    pub fn new() -> Self {
        Self::with_reference_date(Local::now().date_naive())
    }

    pub fn with_reference_date(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            labels: ReportLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: ReportLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Count incidents and transfers, optionally restricted to `date_range` and
    /// split by `category_split`.
    ///
    /// Either every table is produced or a single error is returned: configuration
    /// problems first, then [`EtlError::EmptyResultError`] when filtering leaves nothing.
    pub fn aggregate(
        &self,
        table: &Table,
        roles: &ColumnRoles,
        date_range: Option<&DateRange>,
        category_split: Option<&CategorySplit>,
    ) -> Result<AggregateReport> {
        let incident_idx = roles.require(ColumnRole::IncidentType, table)?;
        let transfer_idx = roles.require(ColumnRole::TransferFlag, table)?;
        let date_idx = match date_range {
            Some(_) => Some(roles.require(ColumnRole::Date, table).map_err(|e| {
                EtlError::configuration(format!("a date range needs a date column: {}", e))
            })?),
            None => None,
        };
        let split_idx = match category_split {
            Some(split) => Some(table.column_index(split.column()).ok_or_else(|| {
                EtlError::configuration(format!(
                    "category column '{}' is not in the table",
                    split.column()
                ))
            })?),
            None => None,
        };

        if table.is_empty() {
            return Err(EtlError::empty_result("the input table has no records"));
        }

        let filtered = match (date_range, date_idx) {
            (Some(range), Some(idx)) => {
                let kept = table.filter(|record| {
                    parse_date_at(record.get(idx), self.reference_date)
                        .map(|date| range.contains(date))
                        .unwrap_or(false)
                });
                tracing::debug!(
                    "Date filter {} kept {} of {} records",
                    range,
                    kept.len(),
                    table.len()
                );
                if kept.is_empty() {
                    return Err(EtlError::empty_result(format!(
                        "0 of {} records fall between {}",
                        table.len(),
                        range
                    )));
                }
                kept
            }
            _ => table.clone(),
        };

        let mut count_tables = vec![self.count_table(&filtered, incident_idx, Partition::Overall)];
        let mut transfers = TransferSummary {
            entries: vec![self.transfer_entry(&filtered, transfer_idx, Partition::Overall)],
        };

        if let (Some(split), Some(idx)) = (category_split, split_idx) {
            let (matched, unmatched) = filtered.partition(|record| split.matches(record.get(idx)));
            tracing::debug!(
                "Category split on '{}' = '{}': {} matched, {} unmatched",
                split.column(),
                split.match_value(),
                matched.len(),
                unmatched.len()
            );
            for (part, partition) in [
                (&matched, Partition::Matched),
                (&unmatched, Partition::Unmatched),
            ] {
                count_tables.push(self.count_table(part, incident_idx, partition));
                transfers
                    .entries
                    .push(self.transfer_entry(part, transfer_idx, partition));
            }
        }

        Ok(AggregateReport {
            count_tables,
            transfers,
            total_records: table.len(),
            considered_records: filtered.len(),
            date_range: date_range.copied(),
            category_split: category_split.cloned(),
        })
    }

    fn count_table(&self, table: &Table, column: usize, partition: Partition) -> CountTable {
        CountTable {
            name: self.labels.incidents(partition).to_string(),
            partition,
            entries: count_by_label(table, column),
        }
    }

    fn transfer_entry(&self, table: &Table, column: usize, partition: Partition) -> TransferEntry {
        let count = table
            .records()
            .iter()
            .filter(|record| is_affirmative(record.get(column)))
            .count() as u64;
        TransferEntry {
            label: self.labels.transfers(partition).to_string(),
            partition,
            count,
        }
    }
}

/// Convenience wrapper around [`Aggregator::aggregate`] with default labels and today's date.
pub fn aggregate(
    table: &Table,
    roles: &ColumnRoles,
    date_range: Option<&DateRange>,
    category_split: Option<&CategorySplit>,
) -> Result<AggregateReport> {
    Aggregator::new().aggregate(table, roles, date_range, category_split)
}

fn group_key(value: &Value) -> String {
    match value {
        Value::Text(text) => normalize_str(text),
        other => other.to_string(),
    }
}

/// 以正規化後的值分組，保留第一次出現的原始寫法
fn count_by_label(table: &Table, column: usize) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in table.records() {
        let value = record.get(column);
        if value.is_blank() {
            continue;
        }
        let key = group_key(value);
        match positions.get(&key) {
            Some(&pos) => entries[pos].count += 1,
            None => {
                positions.insert(key, entries.len());
                entries.push(CountEntry {
                    label: value.to_string().trim().to_string(),
                    count: 1,
                });
            }
        }
    }

    // stable: ties keep first-seen order
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aggregator() -> Aggregator {
        Aggregator::with_reference_date(ymd(2024, 6, 15))
    }

    fn table(rows: &[(&str, &str, &str, &str)]) -> Table {
        Table::from_rows(
            vec![
                "Tipo".to_string(),
                "Traslado".to_string(),
                "Fecha".to_string(),
                "Servicio".to_string(),
            ],
            rows.iter()
                .map(|(tipo, traslado, fecha, servicio)| {
                    [*tipo, *traslado, *fecha, *servicio]
                        .iter()
                        .map(|s| {
                            if s.is_empty() {
                                Value::Null
                            } else {
                                Value::text(*s)
                            }
                        })
                        .collect()
                })
                .collect(),
        )
        .unwrap()
    }

    fn roles() -> ColumnRoles {
        ColumnRoles::new()
            .with(ColumnRole::IncidentType, "Tipo")
            .with(ColumnRole::TransferFlag, "Traslado")
            .with(ColumnRole::Date, "Fecha")
    }

    #[test]
    fn test_groups_accent_and_case_variants() {
        let table = table(&[
            ("Caída", "Sí", "", ""),
            ("caida", "no", "", ""),
            ("CAÍDA", "1", "", ""),
            ("Quemadura", "", "", ""),
            ("caida", "SI", "", ""),
        ]);

        let report = aggregator().aggregate(&table, &roles(), None, None).unwrap();

        assert_eq!(report.count_tables.len(), 1);
        let overall = report.overall().unwrap();
        assert_eq!(overall.name, "Total de Incidentes");
        assert_eq!(
            overall.entries,
            vec![
                CountEntry { label: "Caída".to_string(), count: 4 },
                CountEntry { label: "Quemadura".to_string(), count: 1 },
            ]
        );
        assert_eq!(report.transfers.len(), 1);
        assert_eq!(report.transfers.get(Partition::Overall), Some(3));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let table = table(&[
            ("Mareo", "", "", ""),
            ("Herida", "", "", ""),
            ("Golpe", "", "", ""),
            ("Herida", "", "", ""),
            ("Mareo", "", "", ""),
        ]);

        let report = aggregator().aggregate(&table, &roles(), None, None).unwrap();
        let labels: Vec<&str> = report
            .overall()
            .unwrap()
            .entries
            .iter()
            .map(|e| e.label.as_str())
            .collect();

        assert_eq!(labels, vec!["Mareo", "Herida", "Golpe"]);
    }

    #[test]
    fn test_blank_incident_values_are_not_counted() {
        let table = table(&[("Caída", "sí", "", ""), ("", "sí", "", ""), ("  ", "", "", "")]);

        let report = aggregator().aggregate(&table, &roles(), None, None).unwrap();

        assert_eq!(report.overall().unwrap().total(), 1);
        assert_eq!(report.transfers.get(Partition::Overall), Some(2));
        assert_eq!(report.considered_records, 3);
    }

    #[test]
    fn test_date_range_keeps_only_records_inside() {
        let table = table(&[
            ("Caída", "sí", "05/01/2024", ""),
            ("Golpe", "no", "2024-01-31", ""),
            ("Caída", "sí", "01/02/2024", ""),
            ("Mareo", "sí", "no consta", ""),
            ("Mareo", "sí", "31/12/2023", ""),
        ]);
        let range = DateRange::parse("01/01/2024", "31/01/2024").unwrap();

        let report = aggregator()
            .aggregate(&table, &roles(), Some(&range), None)
            .unwrap();

        assert_eq!(report.total_records, 5);
        assert_eq!(report.considered_records, 2);
        let overall = report.overall().unwrap();
        assert_eq!(overall.get("Caída"), Some(1));
        assert_eq!(overall.get("Golpe"), Some(1));
        assert_eq!(overall.get("Mareo"), None);
        assert_eq!(report.transfers.get(Partition::Overall), Some(1));
        assert_eq!(report.date_range, Some(range));
    }

    #[test]
    fn test_date_range_with_no_matches_is_empty_result() {
        let table = table(&[("Caída", "sí", "05/03/2024", ""), ("Golpe", "no", "", "")]);
        let range = DateRange::parse("01/01/2024", "31/01/2024").unwrap();

        let err = aggregator()
            .aggregate(&table, &roles(), Some(&range), None)
            .unwrap_err();

        assert!(matches!(err, EtlError::EmptyResultError { .. }));
    }

    #[test]
    fn test_date_range_without_date_column_is_configuration_error() {
        let table = table(&[("Caída", "sí", "05/01/2024", "")]);
        let roles = ColumnRoles::new()
            .with(ColumnRole::IncidentType, "Tipo")
            .with(ColumnRole::TransferFlag, "Traslado");
        let range = DateRange::parse("01/01/2024", "31/01/2024").unwrap();

        let err = aggregator()
            .aggregate(&table, &roles, Some(&range), None)
            .unwrap_err();

        assert!(matches!(err, EtlError::ConfigurationError { .. }));
    }

    #[test]
    fn test_category_split_partitions_records() {
        let table = table(&[
            ("Caída", "sí", "", "sm"),
            ("Caída", "no", "", " SM"),
            ("Golpe", "sí", "", "OTRO"),
            ("Mareo", "1", "", "Sm"),
            ("Golpe", "no", "", "otro"),
        ]);
        let split = CategorySplit::new("Servicio", "SM").unwrap();

        let report = aggregator()
            .aggregate(&table, &roles(), None, Some(&split))
            .unwrap();

        assert_eq!(report.count_tables.len(), 3);
        let matched = report.table(Partition::Matched).unwrap();
        let unmatched = report.table(Partition::Unmatched).unwrap();
        assert_eq!(matched.total(), 3);
        assert_eq!(unmatched.total(), 2);
        assert_eq!(matched.name, "Incidentes atendidos por Servicios Médicos MAC");
        assert_eq!(matched.get("Caída"), Some(2));
        assert_eq!(unmatched.get("Golpe"), Some(2));

        assert_eq!(report.transfers.len(), 3);
        assert_eq!(report.transfers.get(Partition::Overall), Some(3));
        assert_eq!(report.transfers.get(Partition::Matched), Some(2));
        assert_eq!(report.transfers.get(Partition::Unmatched), Some(1));
    }

    #[test]
    fn test_empty_partition_still_produces_tables() {
        let table = table(&[("Caída", "sí", "", "OTRO"), ("Golpe", "no", "", "OTRO")]);
        let split = CategorySplit::new("Servicio", "SM").unwrap();

        let report = aggregator()
            .aggregate(&table, &roles(), None, Some(&split))
            .unwrap();

        let matched = report.table(Partition::Matched).unwrap();
        assert!(matched.is_empty());
        assert_eq!(report.transfers.get(Partition::Matched), Some(0));
    }

    #[test]
    fn test_missing_roles_fail_before_counting() {
        let table = table(&[("Caída", "sí", "", "")]);

        let no_incident = ColumnRoles::new().with(ColumnRole::TransferFlag, "Traslado");
        let err = aggregator().aggregate(&table, &no_incident, None, None).unwrap_err();
        assert!(matches!(err, EtlError::ConfigurationError { .. }));

        let absent_transfer = ColumnRoles::new()
            .with(ColumnRole::IncidentType, "Tipo")
            .with(ColumnRole::TransferFlag, "Hospital");
        let err = aggregator().aggregate(&table, &absent_transfer, None, None).unwrap_err();
        assert!(matches!(err, EtlError::ConfigurationError { .. }));
    }

    #[test]
    fn test_unknown_split_column_is_configuration_error() {
        let table = table(&[("Caída", "sí", "", "SM")]);
        let split = CategorySplit::new("Unidad", "SM").unwrap();

        let err = aggregator()
            .aggregate(&table, &roles(), None, Some(&split))
            .unwrap_err();

        assert!(matches!(err, EtlError::ConfigurationError { .. }));
    }

    #[test]
    fn test_empty_table_is_empty_result() {
        let table = table(&[]);
        let err = aggregator().aggregate(&table, &roles(), None, None).unwrap_err();
        assert!(matches!(err, EtlError::EmptyResultError { .. }));
    }

    #[test]
    fn test_custom_labels() {
        let table = table(&[("Caída", "sí", "", "")]);
        let labels = ReportLabels {
            overall_incidents: "All incidents".to_string(),
            overall_transfers: "All transfers".to_string(),
            ..ReportLabels::default()
        };

        let report = aggregator()
            .with_labels(labels)
            .aggregate(&table, &roles(), None, None)
            .unwrap();

        assert_eq!(report.overall().unwrap().name, "All incidents");
        assert_eq!(report.transfers.entries[0].label, "All transfers");
    }
}
