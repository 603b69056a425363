pub mod aggregator;
pub mod etl;
pub mod normalizer;
pub mod pipeline;
pub mod reader;

pub use crate::domain::model::{AggregateReport, Table};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
