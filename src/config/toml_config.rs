use crate::config::{DEFAULT_ARCHIVE_NAME, DEFAULT_TITLE};
use crate::domain::model::{CategorySplit, ColumnRoles, ReportLabels};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_date_bounds, validate_provider, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub report: ReportConfig,
    pub source: SourceConfig,
    pub columns: ColumnRoles,
    #[serde(default)]
    pub filters: FilterConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub labels: ReportLabels,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            labels: ReportLabels::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: String,
    /// Single character; guessed from the file when absent.
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub category_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    #[serde(default = "default_archive_name")]
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" (default) or "json"
    pub log_format: Option<String>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INCIDENT_FILE})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var regex");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_date_bounds(
            self.filters.date_start.as_deref(),
            self.filters.date_end.as_deref(),
        )?;

        if let Some(delimiter) = &self.source.delimiter {
            if delimiter.len() != 1 {
                return Err(EtlError::InvalidConfigValueError {
                    field: "source.delimiter".to_string(),
                    value: delimiter.clone(),
                    reason: "Delimiter must be a single ASCII character".to_string(),
                });
            }
        }

        if let Some(value) = &self.filters.category_value {
            if self.columns.category.is_none() {
                tracing::warn!(
                    "filters.category_value = '{}' is ignored without columns.category",
                    value
                );
            }
        }

        if let Some(monitoring) = &self.monitoring {
            if let Some(format) = monitoring.log_format.as_deref() {
                if !matches!(format, "compact" | "json") {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "monitoring.log_format".to_string(),
                        value: format.to_string(),
                        reason: "Valid log formats: compact, json".to_string(),
                    });
                }
            }
        }

        validate_provider(self)
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            == Some("json")
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn incident_column(&self) -> Option<&str> {
        self.columns.incident_type.as_deref()
    }

    fn transfer_column(&self) -> Option<&str> {
        self.columns.transfer_flag.as_deref()
    }

    fn date_column(&self) -> Option<&str> {
        self.columns.date.as_deref()
    }

    fn date_bounds(&self) -> Option<(&str, &str)> {
        match (&self.filters.date_start, &self.filters.date_end) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }

    fn category_column(&self) -> Option<&str> {
        self.columns.category.as_deref()
    }

    fn category_value(&self) -> &str {
        self.filters
            .category_value
            .as_deref()
            .unwrap_or(CategorySplit::DEFAULT_MATCH_VALUE)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.load
            .compression
            .as_ref()
            .filter(|c| c.enabled)
            .map(|c| c.filename.as_str())
    }

    fn report_title(&self) -> &str {
        &self.report.title
    }

    fn report_labels(&self) -> ReportLabels {
        self.report.labels.clone()
    }

    fn delimiter(&self) -> Option<u8> {
        self.source
            .delimiter
            .as_deref()
            .filter(|d| d.len() == 1)
            .map(|d| d.as_bytes()[0])
    }

    fn column_roles(&self) -> ColumnRoles {
        self.columns.clone()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
