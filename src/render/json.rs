use crate::domain::model::AggregateReport;
use crate::domain::ports::{ReportContext, ReportRenderer};
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'a str,
    generated_at: String,
    source: &'a str,
    #[serde(flatten)]
    report: &'a AggregateReport,
}

/// Machine-readable copy of the aggregated numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer;

impl ReportRenderer for JsonReportRenderer {
    fn file_name(&self) -> &str {
        "reporte_incidentes.json"
    }

    fn render(&self, report: &AggregateReport, context: &ReportContext) -> Result<Vec<u8>> {
        let document = JsonReport {
            title: &context.title,
            generated_at: context.generated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            source: &context.source_name,
            report,
        };
        Ok(serde_json::to_vec_pretty(&document)?)
    }
}
