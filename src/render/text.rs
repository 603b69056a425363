use super::{summary_metrics, TIMESTAMP_FORMAT};
use crate::domain::model::AggregateReport;
use crate::domain::ports::{ReportContext, ReportRenderer};
use crate::utils::error::Result;

/// Plain-text report.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn file_name(&self) -> &str {
        "reporte_incidentes.txt"
    }

    fn render(&self, report: &AggregateReport, context: &ReportContext) -> Result<Vec<u8>> {
        let mut lines = vec![format!("{}\n", context.title)];
        lines.push("=".repeat(40));
        lines.push(format!(
            "Generado el: {}",
            context.generated_at.format(TIMESTAMP_FORMAT)
        ));
        lines.push(format!("Fuente: {}", context.source_name));
        if let Some(range) = &report.date_range {
            lines.push(format!(
                "Filtro de fechas: {} ({} de {} registros)",
                range, report.considered_records, report.total_records
            ));
        }
        lines.push("\nMétricas".to_string());
        for (name, value) in summary_metrics(report) {
            lines.push(format!("  {}: {}", name, value));
        }
        lines.push("\nResumen de Conteos\n".to_string());

        for table in &report.count_tables {
            lines.push(format!("\n{}", table.name.to_uppercase()));
            lines.push("-".repeat(table.name.chars().count()));
            lines.push(format!("Total de incidentes: {}", table.total()));
            if table.is_empty() {
                lines.push("  Sin datos".to_string());
            }
            for entry in &table.entries {
                lines.push(format!("  {}: {}", entry.label, entry.count));
            }
        }

        if !report.transfers.is_empty() {
            lines.push("\n\nResumen de Traslados".to_string());
            lines.push("-".repeat(20));
            for entry in &report.transfers.entries {
                lines.push(format!("{}: {}", entry.label, entry.count));
            }
        }

        Ok(lines.join("\n").into_bytes())
    }
}
