use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("No records left after filtering: {message}")]
    EmptyResultError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Config validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Filter,
    Ingestion,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn configuration(message: impl Into<String>) -> Self {
        EtlError::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        EtlError::EmptyResultError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigurationError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::EmptyResultError { .. } => ErrorCategory::Filter,
            EtlError::CsvError(_) | EtlError::SpreadsheetError(_) | EtlError::IoError(_) => {
                ErrorCategory::Ingestion
            }
            EtlError::ZipError(_) | EtlError::SerializationError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Filter => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Ingestion | ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// 依錯誤種類給出的建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::EmptyResultError { .. } => {
                "Widen the date range or check the date column format (dd/mm/YYYY)"
            }
            EtlError::ConfigurationError { .. } | EtlError::MissingConfigError { .. } => {
                "Check the selected incident/transfer/date/category columns against the file header"
            }
            EtlError::InvalidConfigValueError { .. } | EtlError::ConfigValidationError { .. } => {
                "Fix the highlighted configuration value and try again"
            }
            EtlError::CsvError(_) => "Make sure the input is a delimited text file with a header row",
            EtlError::SpreadsheetError(_) => {
                "Make sure the first sheet has a header row, or export it to CSV"
            }
            EtlError::IoError(_) => "Check that the input file exists and the output path is writable",
            EtlError::ZipError(_) | EtlError::SerializationError(_) => {
                "Retry with a different output path or without compression"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::ConfigurationError { message } => format!("Invalid column setup: {}", message),
            EtlError::EmptyResultError { message } => {
                format!("No data after filtering. Adjust the filter criteria ({})", message)
            }
            EtlError::MissingConfigError { field } => format!("Missing required setting '{}'", field),
            EtlError::InvalidConfigValueError { field, value, reason } => {
                format!("Setting '{}' has an invalid value '{}': {}", field, value, reason)
            }
            EtlError::ConfigValidationError { field, message } => {
                format!("Setting '{}' is invalid: {}", field, message)
            }
            EtlError::CsvError(e) => format!("Could not read the input table: {}", e),
            EtlError::SpreadsheetError(e) => format!("Could not read the workbook: {}", e),
            EtlError::IoError(e) => format!("File access failed: {}", e),
            EtlError::ZipError(e) => format!("Could not build the report archive: {}", e),
            EtlError::SerializationError(e) => format!("Could not serialize the report: {}", e),
        }
    }

    /// Process exit code for the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Filter => 2,
            ErrorCategory::Ingestion | ErrorCategory::Output => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
