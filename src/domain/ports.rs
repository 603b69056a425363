use crate::domain::model::{AggregateReport, ColumnRole, ColumnRoles, ReportLabels, Table};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Column choices, filters and output settings supplied by the caller.
pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn incident_column(&self) -> Option<&str>;
    fn transfer_column(&self) -> Option<&str>;
    fn date_column(&self) -> Option<&str>;
    /// Raw `dd/mm/YYYY` bounds; both or neither.
    fn date_bounds(&self) -> Option<(&str, &str)>;
    fn category_column(&self) -> Option<&str>;
    fn category_value(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
    /// Archive file name when the reports should be bundled into a ZIP.
    fn archive_name(&self) -> Option<&str>;
    fn report_title(&self) -> &str;

    fn report_labels(&self) -> ReportLabels {
        ReportLabels::default()
    }

    /// `None` lets the reader guess from the file name and header line.
    fn delimiter(&self) -> Option<u8> {
        None
    }

    fn column_roles(&self) -> ColumnRoles {
        let mut roles = ColumnRoles::new();
        let assigned = [
            (ColumnRole::IncidentType, self.incident_column()),
            (ColumnRole::TransferFlag, self.transfer_column()),
            (ColumnRole::Date, self.date_column()),
            (ColumnRole::Category, self.category_column()),
        ];
        for (role, column) in assigned {
            if let Some(column) = column {
                roles.assign(role, column);
            }
        }
        roles
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Table>;
    async fn transform(&self, table: Table) -> Result<AggregateReport>;
    async fn load(&self, report: AggregateReport) -> Result<String>;
}

/// Metadata shown around the aggregated numbers.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub title: String,
    pub generated_at: NaiveDateTime,
    pub source_name: String,
}

pub trait ReportRenderer: Send + Sync {
    /// File name used when the rendered report is written out.
    fn file_name(&self) -> &str;
    fn render(&self, report: &AggregateReport, context: &ReportContext) -> Result<Vec<u8>>;
}
