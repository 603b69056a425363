use crate::domain::model::{CategorySplit, ColumnRole, DateRange};
use crate::domain::ports::ConfigProvider;
use crate::render::SUPPORTED_FORMATS;
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

pub const INPUT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[&str],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension.to_ascii_lowercase().as_str()) => {}
            Some(extension) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(EtlError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| EtlError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_formats(field_name: &str, formats: &[String]) -> Result<()> {
    if formats.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    for format in formats {
        if !SUPPORTED_FORMATS.contains(&format.trim().to_ascii_lowercase().as_str()) {
            return Err(EtlError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: format.clone(),
                reason: format!(
                    "Unsupported format. Valid formats: {}",
                    SUPPORTED_FORMATS.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// Both bounds or neither; parsed as `dd/mm/YYYY` with start <= end.
pub fn validate_date_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<DateRange>> {
    match (start, end) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => DateRange::parse(start, end).map(Some),
        (Some(_), None) => Err(EtlError::MissingConfigError {
            field: "date_end".to_string(),
        }),
        (None, Some(_)) => Err(EtlError::MissingConfigError {
            field: "date_start".to_string(),
        }),
    }
}

/// Checks shared by every [`ConfigProvider`] before the pipeline starts.
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_path("input", config.input_path())?;
    validate_file_extensions("input", &[config.input_path()], INPUT_EXTENSIONS)?;
    validate_path("output_path", config.output_path())?;
    validate_non_empty_string("title", config.report_title())?;

    validate_required_field("incident_column", &config.incident_column())?;
    validate_required_field("transfer_column", &config.transfer_column())?;

    if let Some((start, end)) = config.date_bounds() {
        validate_date_bounds(Some(start), Some(end))?;
        validate_required_field("date_column", &config.date_column())?;
    }

    if let Some(column) = config.column_roles().get(ColumnRole::Category) {
        CategorySplit::new(column, config.category_value())?;
    }

    validate_formats("output_formats", config.output_formats())?;
    if let Some(name) = config.archive_name() {
        validate_file_extensions("archive_name", &[name], &["zip"])?;
    }
    Ok(())
}
