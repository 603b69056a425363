pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{
    aggregator::{aggregate, Aggregator},
    etl::ReportEngine,
    normalizer::{is_affirmative, normalize_text, parse_date, parse_date_at},
    pipeline::ReportPipeline,
    reader::TableReader,
};
pub use domain::model::{
    AggregateReport, CategorySplit, ColumnRole, ColumnRoles, CountEntry, CountTable, DateRange,
    Partition, Record, ReportLabels, Table, TransferEntry, TransferSummary, Value,
};
pub use utils::error::{EtlError, Result};
