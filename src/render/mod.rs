//! Report renderers: turn an [`AggregateReport`](crate::domain::model::AggregateReport) into downloadable files.

pub mod json;
pub mod markdown;
pub mod text;

use crate::domain::model::{AggregateReport, Partition};
use crate::domain::ports::ReportRenderer;
use crate::utils::error::{EtlError, Result};

pub use json::JsonReportRenderer;
pub use markdown::MarkdownReportRenderer;
pub use text::TextReportRenderer;

pub const SUPPORTED_FORMATS: &[&str] = &["txt", "md", "json"];

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Headline numbers shown above the count tables: records considered,
/// distinct incident types and overall transfers.
fn summary_metrics(report: &AggregateReport) -> [(&'static str, u64); 3] {
    let incident_types = report.overall().map(|t| t.entries.len()).unwrap_or(0) as u64;
    let transfers = report.transfers.get(Partition::Overall).unwrap_or(0);
    [
        ("Total de registros", report.considered_records as u64),
        ("Tipos de Incidentes", incident_types),
        ("Total de Traslados", transfers),
    ]
}

pub fn renderer_for(format: &str) -> Result<Box<dyn ReportRenderer>> {
    match format.trim().to_ascii_lowercase().as_str() {
        "txt" => Ok(Box::new(TextReportRenderer)),
        "md" => Ok(Box::new(MarkdownReportRenderer::default())),
        "json" => Ok(Box::new(JsonReportRenderer)),
        other => Err(EtlError::InvalidConfigValueError {
            field: "output_formats".to_string(),
            value: other.to_string(),
            reason: format!(
                "Unsupported format. Valid formats: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        }),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::model::{
        AggregateReport, CountEntry, CountTable, Partition, TransferEntry, TransferSummary,
    };
    use crate::domain::ports::ReportContext;
    use chrono::NaiveDate;

    pub fn context() -> ReportContext {
        ReportContext {
            title: "Análisis de Incidentes".to_string(),
            generated_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 7, 0)
                .unwrap(),
            source_name: "incidentes.csv".to_string(),
        }
    }

    pub fn report() -> AggregateReport {
        AggregateReport {
            count_tables: vec![
                CountTable {
                    name: "Total de Incidentes".to_string(),
                    partition: Partition::Overall,
                    entries: vec![
                        CountEntry {
                            label: "Caída".to_string(),
                            count: 4,
                        },
                        CountEntry {
                            label: "Quemadura".to_string(),
                            count: 1,
                        },
                    ],
                },
                CountTable {
                    name: "Incidentes atendidos por Servicios Médicos MAC".to_string(),
                    partition: Partition::Matched,
                    entries: vec![],
                },
            ],
            transfers: TransferSummary {
                entries: vec![TransferEntry {
                    label: "Total de traslados".to_string(),
                    partition: Partition::Overall,
                    count: 3,
                }],
            },
            total_records: 5,
            considered_records: 5,
            date_range: None,
            category_split: None,
        }
    }
}
