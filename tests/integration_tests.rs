#![cfg(feature = "cli")]

use chrono::NaiveDate;
use incident_tally::domain::ports::Pipeline;
use incident_tally::utils::validation::Validate;
use incident_tally::{
    CliConfig, EtlError, LocalStorage, Partition, ReportEngine, ReportPipeline, TomlConfig,
};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const INCIDENTS: &str = "\
Tipo,Traslado,Fecha,Servicio
Caída,Sí,05/03/2024,SM
caida,no,10/03/2024,PC
Quemadura,1,20/03/2024,sm
CAÍDA,,02/04/2024,PC
Golpe,si,15/05/2024,SM
";

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn write_input(dir: &TempDir, contents: &str) -> String {
    let path = dir.path().join("incidentes.csv");
    std::fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn cli_config(input: String, output_path: String) -> CliConfig {
    CliConfig {
        input,
        incident_column: Some("Tipo".to_string()),
        transfer_column: Some("Traslado".to_string()),
        date_column: None,
        from: None,
        to: None,
        category_column: None,
        category_value: "SM".to_string(),
        output_path,
        formats: vec!["txt".to_string(), "md".to_string()],
        zip: false,
        title: "Análisis de Incidentes".to_string(),
        verbose: false,
        monitor: false,
    }
}

fn pipeline_for(config: CliConfig) -> ReportPipeline<LocalStorage, CliConfig> {
    let storage = LocalStorage::new(config.output_path.clone());
    ReportPipeline::new(LocalStorage::new(""), storage, config).with_reference_date(reference_date())
}

#[tokio::test]
async fn test_end_to_end_writes_text_and_markdown() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let config = cli_config(input, output_path.clone());
    assert!(config.validate().is_ok());

    let engine = ReportEngine::new(pipeline_for(config));
    let result = engine.run().await.unwrap();
    assert_eq!(result, output_path);

    let text = std::fs::read_to_string(Path::new(&output_path).join("reporte_incidentes.txt")).unwrap();
    assert!(text.starts_with("Análisis de Incidentes\n"));
    assert!(text.contains("Fuente: incidentes.csv"));
    assert!(text.contains("Total de incidentes: 5"));
    assert!(text.contains("  Caída: 3\n  Quemadura: 1\n  Golpe: 1"));
    assert!(text.contains("  Total de registros: 5\n  Tipos de Incidentes: 3\n  Total de Traslados: 3"));
    assert!(text.ends_with("Total de traslados: 3"));

    let markdown =
        std::fs::read_to_string(Path::new(&output_path).join("reporte_incidentes.md")).unwrap();
    assert!(markdown.starts_with("# Análisis de Incidentes"));
    assert!(markdown.contains("Caída"));
    assert!(markdown.contains("## Gráficas"));

    assert!(!Path::new(&output_path).join("reporte_incidentes.json").exists());
}

#[tokio::test]
async fn test_zip_bundle_contains_every_format() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let mut config = cli_config(input, output_path.clone());
    config.formats = vec!["txt".to_string(), "md".to_string(), "json".to_string()];
    config.zip = true;

    let engine = ReportEngine::new_with_monitoring(pipeline_for(config), false);
    let result = engine.run().await.unwrap();
    assert!(result.ends_with("reporte_incidentes.zip"));

    let zip_data = std::fs::read(Path::new(&output_path).join("reporte_incidentes.zip")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
    assert_eq!(archive.len(), 3);

    let mut json_file = archive.by_name("reporte_incidentes.json").unwrap();
    let mut json_content = String::new();
    json_file.read_to_string(&mut json_content).unwrap();
    let json: serde_json::Value = serde_json::from_str(&json_content).unwrap();

    assert_eq!(json["total_records"], 5);
    assert_eq!(json["count_tables"][0]["entries"][0]["label"], "Caída");
    assert_eq!(json["count_tables"][0]["entries"][0]["count"], 3);
    assert_eq!(json["transfers"]["entries"][0]["count"], 3);
}

#[tokio::test]
async fn test_date_filter_and_category_split() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);

    let mut config = cli_config(input, temp_dir.path().to_str().unwrap().to_string());
    config.date_column = Some("Fecha".to_string());
    config.from = Some("01/03/2024".to_string());
    config.to = Some("31/03/2024".to_string());
    config.category_column = Some("Servicio".to_string());
    assert!(config.validate().is_ok());

    let pipeline = pipeline_for(config);
    let table = pipeline.extract().await.unwrap();
    let report = pipeline.transform(table).await.unwrap();

    assert_eq!(report.total_records, 5);
    assert_eq!(report.considered_records, 3);
    assert_eq!(report.count_tables.len(), 3);

    let overall = report.overall().unwrap();
    assert_eq!(overall.get("Caída"), Some(2));
    assert_eq!(overall.get("Quemadura"), Some(1));
    assert_eq!(overall.get("Golpe"), None);

    let matched = report.table(Partition::Matched).unwrap();
    assert_eq!(matched.total(), 2);
    let unmatched = report.table(Partition::Unmatched).unwrap();
    assert_eq!(unmatched.total(), 1);

    assert_eq!(report.transfers.get(Partition::Overall), Some(2));
    assert_eq!(report.transfers.get(Partition::Matched), Some(2));
    assert_eq!(report.transfers.get(Partition::Unmatched), Some(0));
}

#[tokio::test]
async fn test_empty_date_window_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);
    let output_path = temp_dir.path().join("out").to_str().unwrap().to_string();

    let mut config = cli_config(input, output_path.clone());
    config.date_column = Some("Fecha".to_string());
    config.from = Some("01/01/2023".to_string());
    config.to = Some("31/12/2023".to_string());

    let engine = ReportEngine::new(pipeline_for(config));
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, EtlError::EmptyResultError { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!Path::new(&output_path).exists());
}

#[tokio::test]
async fn test_missing_column_wins_over_empty_table() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, "Tipo,Traslado\n");

    let mut config = cli_config(input, temp_dir.path().to_str().unwrap().to_string());
    config.category_column = Some("Servicio".to_string());

    let pipeline = pipeline_for(config);
    let table = pipeline.extract().await.unwrap();
    let err = pipeline.transform(table).await.unwrap_err();

    assert!(matches!(err, EtlError::ConfigurationError { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_input_file_is_an_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("nope.csv").to_str().unwrap().to_string();

    let config = cli_config(input, temp_dir.path().to_str().unwrap().to_string());
    let err = ReportEngine::new(pipeline_for(config)).run().await.unwrap_err();

    assert!(matches!(err, EtlError::IoError(_)));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_toml_config_driven_report() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("marzo.csv");
    std::fs::write(&input_path, INCIDENTS.replace(',', ";")).unwrap();
    let output_path = temp_dir.path().join("reportes");

    let toml_content = format!(
        r#"
[report]
title = "Informe de marzo"

[report.labels]
overall_incidents = "Incidentes de marzo"

[source]
path = "{input}"
delimiter = ";"

[columns]
incident_type = "Tipo"
transfer_flag = "Traslado"
date = "Fecha"

[filters]
date_start = "01/03/2024"
date_end = "31/03/2024"

[load]
output_path = "{output}"
output_formats = ["txt"]
"#,
        input = input_path.to_str().unwrap(),
        output = output_path.to_str().unwrap(),
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    assert!(config.validate().is_ok());

    let storage = LocalStorage::new(output_path.to_str().unwrap());
    let pipeline = ReportPipeline::new(LocalStorage::new(""), storage, config)
        .with_reference_date(reference_date());
    ReportEngine::new(pipeline).run().await.unwrap();

    let text = std::fs::read_to_string(output_path.join("reporte_incidentes.txt")).unwrap();
    assert!(text.starts_with("Informe de marzo\n"));
    assert!(text.contains("Fuente: marzo.csv"));
    assert!(text.contains("INCIDENTES DE MARZO"));
    assert!(text.contains("Filtro de fechas: 01/03/2024 - 31/03/2024 (3 de 5 registros)"));
    assert!(text.contains("  Caída: 2\n  Quemadura: 1"));
}

#[tokio::test]
async fn test_category_role_from_toml_columns_drives_split() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);

    let toml_content = format!(
        r#"
[source]
path = "{input}"

[columns]
incident_type = "Tipo"
transfer_flag = "Traslado"
category = "Servicio"

[filters]
category_value = "pc"

[load]
output_path = "{output}"
output_formats = ["json"]
"#,
        input = input,
        output = temp_dir.path().to_str().unwrap(),
    );
    let config = TomlConfig::from_toml_str(&toml_content).unwrap();
    assert!(config.validate().is_ok());

    let pipeline = ReportPipeline::new(
        LocalStorage::new(""),
        LocalStorage::new(temp_dir.path().to_str().unwrap()),
        config,
    )
    .with_reference_date(reference_date());
    let table = pipeline.extract().await.unwrap();
    let report = pipeline.transform(table).await.unwrap();

    let split = report.category_split.as_ref().unwrap();
    assert_eq!(split.column(), "Servicio");
    assert_eq!(split.match_value(), "pc");
    assert_eq!(report.table(Partition::Matched).unwrap().get("caida"), Some(2));
    assert_eq!(report.table(Partition::Unmatched).unwrap().total(), 3);
}

#[tokio::test]
async fn test_two_digit_year_bounds_are_a_configuration_error() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_input(&temp_dir, INCIDENTS);

    let mut config = cli_config(input, temp_dir.path().to_str().unwrap().to_string());
    config.date_column = Some("Fecha".to_string());
    config.from = Some("01/03/24".to_string());
    config.to = Some("31/03/24".to_string());

    let err = config.validate().unwrap_err();
    assert!(matches!(err, EtlError::ConfigurationError { .. }));
    assert_eq!(err.exit_code(), 1);
}
