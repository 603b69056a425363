use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Runs extract → transform → load once.
pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting incident report");

        let table = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} records with {} columns",
            table.len(),
            table.columns().len()
        );
        self.monitor.log_stats("Extract");

        let report = self.pipeline.transform(table).await?;
        tracing::info!("Built {} count tables", report.count_tables.len());
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(report).await?;
        tracing::info!("📁 Reports saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
