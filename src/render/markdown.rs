use super::{summary_metrics, TIMESTAMP_FORMAT};
use crate::domain::model::{AggregateReport, CountTable};
use crate::domain::ports::{ReportContext, ReportRenderer};
use crate::utils::error::Result;
use std::fmt::Write;

/// Document report: count tables, transfer summary and a bar chart per table.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownReportRenderer {
    /// Width of the longest bar in the charts.
    pub chart_width: usize,
}

impl Default for MarkdownReportRenderer {
    fn default() -> Self {
        Self { chart_width: 40 }
    }
}

impl MarkdownReportRenderer {
    fn write_table(out: &mut String, table: &CountTable) {
        let _ = writeln!(out, "### {}\n", table.name);
        let _ = writeln!(out, "Total de incidentes: {}\n", table.total());
        if table.is_empty() {
            out.push_str("_Sin datos_\n\n");
            return;
        }
        out.push_str("| Tipo de Incidente | Cantidad |\n|---|---:|\n");
        for entry in &table.entries {
            let _ = writeln!(out, "| {} | {} |", escape_cell(&entry.label), entry.count);
        }
        out.push('\n');
    }

    fn write_chart(&self, out: &mut String, table: &CountTable) {
        let _ = writeln!(out, "### {}\n", table.name);
        if table.is_empty() {
            out.push_str("_Sin datos_\n\n");
            return;
        }
        let max = table.entries.iter().map(|e| e.count).max().unwrap_or(1).max(1);
        let label_width = table
            .entries
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0);

        out.push_str("```text\n");
        for entry in &table.entries {
            let bar = ((entry.count as f64 / max as f64) * self.chart_width as f64).round() as usize;
            let padding = label_width - entry.label.chars().count();
            let _ = writeln!(
                out,
                "{}{} │{} {}",
                entry.label,
                " ".repeat(padding),
                "█".repeat(bar.max(1)),
                entry.count
            );
        }
        out.push_str("```\n\n");
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

impl ReportRenderer for MarkdownReportRenderer {
    fn file_name(&self) -> &str {
        "reporte_incidentes.md"
    }

    fn render(&self, report: &AggregateReport, context: &ReportContext) -> Result<Vec<u8>> {
        let mut out = String::new();
        let _ = writeln!(out, "# {}\n", context.title);
        let _ = writeln!(
            out,
            "Generado el: {}  \nFuente: {}\n",
            context.generated_at.format(TIMESTAMP_FORMAT),
            context.source_name
        );
        if let Some(range) = &report.date_range {
            let _ = writeln!(
                out,
                "Filtro de fechas: {} ({} de {} registros)\n",
                range, report.considered_records, report.total_records
            );
        }

        out.push_str("## Métricas\n\n| Métrica | Valor |\n|---|---:|\n");
        for (name, value) in summary_metrics(report) {
            let _ = writeln!(out, "| {} | {} |", name, value);
        }
        out.push('\n');

        out.push_str("## Resumen de Conteos\n\n");
        for table in &report.count_tables {
            Self::write_table(&mut out, table);
        }

        if !report.transfers.is_empty() {
            out.push_str("## Resumen de Traslados\n\n");
            for entry in &report.transfers.entries {
                let _ = writeln!(out, "- {}: {}", entry.label, entry.count);
            }
            out.push('\n');
        }

        out.push_str("## Gráficas\n\n");
        for table in &report.count_tables {
            self.write_chart(&mut out, table);
        }

        Ok(out.into_bytes())
    }
}
