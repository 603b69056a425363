pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::domain::ports::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_date_bounds, validate_provider, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Análisis de Incidentes";
pub const DEFAULT_ARCHIVE_NAME: &str = "reporte_incidentes.zip";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "incident-tally")]
#[command(about = "Count incidents and hospital transfers from a CSV export")]
pub struct CliConfig {
    /// Delimited text file with a header row
    pub input: String,

    #[arg(long, help = "Column holding the incident type")]
    pub incident_column: Option<String>,

    #[arg(long, help = "Column holding the hospital-transfer flag")]
    pub transfer_column: Option<String>,

    #[arg(long, help = "Column holding the incident date")]
    pub date_column: Option<String>,

    #[arg(long, help = "Start date, dd/mm/YYYY")]
    pub from: Option<String>,

    #[arg(long, help = "End date, dd/mm/YYYY")]
    pub to: Option<String>,

    #[arg(long, help = "Column used to split medical-service cases")]
    pub category_column: Option<String>,

    #[arg(long, default_value = "SM")]
    pub category_value: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "txt,md")]
    pub formats: Vec<String>,

    #[arg(long, help = "Bundle the reports into a ZIP archive")]
    pub zip: bool,

    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn incident_column(&self) -> Option<&str> {
        self.incident_column.as_deref()
    }

    fn transfer_column(&self) -> Option<&str> {
        self.transfer_column.as_deref()
    }

    fn date_column(&self) -> Option<&str> {
        self.date_column.as_deref()
    }

    fn date_bounds(&self) -> Option<(&str, &str)> {
        match (&self.from, &self.to) {
            (Some(from), Some(to)) => Some((from.as_str(), to.as_str())),
            _ => None,
        }
    }

    fn category_column(&self) -> Option<&str> {
        self.category_column.as_deref()
    }

    fn category_value(&self) -> &str {
        &self.category_value
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.zip.then_some(DEFAULT_ARCHIVE_NAME)
    }

    fn report_title(&self) -> &str {
        &self.title
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_date_bounds(self.from.as_deref(), self.to.as_deref())?;
        validate_provider(self)
    }
}
