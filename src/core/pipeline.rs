use crate::core::aggregator::Aggregator;
use crate::core::reader::TableReader;
use crate::domain::model::{AggregateReport, CategorySplit, ColumnRole, DateRange, Table};
use crate::domain::ports::{ConfigProvider, Pipeline, ReportContext, Storage};
use crate::render::renderer_for;
use crate::utils::error::Result;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Reads one delimited file, aggregates it and writes the configured reports.
pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    storage: S,
    config: C,
    aggregator: Aggregator,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    /// `source` resolves the input path, `storage` receives the rendered reports.
    pub fn new(source: S, storage: S, config: C) -> Self {
        let aggregator = Aggregator::new().with_labels(config.report_labels());
        Self {
            source,
            storage,
            config,
            aggregator,
        }
    }

    /// Pin the date plausibility check to `today` instead of the wall clock.
    pub fn with_reference_date(mut self, today: NaiveDate) -> Self {
        self.aggregator =
            Aggregator::with_reference_date(today).with_labels(self.config.report_labels());
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn source_name(&self) -> String {
        Path::new(self.config.input_path())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.input_path().to_string())
    }

    fn render_all(&self, report: &AggregateReport) -> Result<Vec<(String, Vec<u8>)>> {
        let context = ReportContext {
            title: self.config.report_title().to_string(),
            generated_at: Local::now().naive_local(),
            source_name: self.source_name(),
        };

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for format in self.config.output_formats() {
            let renderer = renderer_for(format)?;
            if !seen.insert(renderer.file_name().to_string()) {
                continue;
            }
            let data = renderer.render(report, &context)?;
            tracing::debug!("Rendered {} ({} bytes)", renderer.file_name(), data.len());
            files.push((renderer.file_name().to_string(), data));
        }
        Ok(files)
    }
}

fn build_archive(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file(name.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Table> {
        let path = self.config.input_path();
        tracing::info!("📂 Reading incidents from: {}", path);

        let data = self.source.read_file(path).await?;
        let reader = self
            .config
            .delimiter()
            .map(TableReader::with_delimiter)
            .unwrap_or_default();
        reader.read(path, &data)
    }

    async fn transform(&self, table: Table) -> Result<AggregateReport> {
        let roles = self.config.column_roles();
        let date_range = self
            .config
            .date_bounds()
            .map(|(start, end)| DateRange::parse(start, end))
            .transpose()?;
        let category_split = roles
            .get(ColumnRole::Category)
            .map(|column| CategorySplit::new(column, self.config.category_value()))
            .transpose()?;

        if let Some(range) = &date_range {
            tracing::info!("🗓️ Date filter: {}", range);
        }
        if let Some(split) = &category_split {
            tracing::info!(
                "🏥 Splitting on '{}' = '{}'",
                split.column(),
                split.match_value()
            );
        }

        let report = self.aggregator.aggregate(
            &table,
            &roles,
            date_range.as_ref(),
            category_split.as_ref(),
        )?;

        if report.date_range.is_some() {
            tracing::info!(
                "📊 Filtered data: {} of {} records",
                report.considered_records,
                report.total_records
            );
        }
        for table in &report.count_tables {
            tracing::info!(
                "✅ {}: {} incidents, {} types",
                table.name,
                table.total(),
                table.entries.len()
            );
        }
        for entry in &report.transfers.entries {
            tracing::info!("🚑 {}: {}", entry.label, entry.count);
        }
        Ok(report)
    }

    async fn load(&self, report: AggregateReport) -> Result<String> {
        let files = self.render_all(&report)?;

        if let Some(archive_name) = self.config.archive_name() {
            let archive = build_archive(&files)?;
            tracing::debug!(
                "Writing {} ({} files, {} bytes)",
                archive_name,
                files.len(),
                archive.len()
            );
            self.storage.write_file(archive_name, &archive).await?;
            return Ok(format!("{}/{}", self.config.output_path(), archive_name));
        }

        for (name, data) in &files {
            self.storage.write_file(name, data).await?;
            tracing::debug!("Saved {}", name);
        }
        Ok(self.config.output_path().to_string())
    }
}
