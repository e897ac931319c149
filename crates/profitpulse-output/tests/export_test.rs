//! Staged publishing of artifact directories.

use profitpulse_output::{
    Alert, AlertKind, ArtifactWriter, ExportError, ExportFormat, Exporter, RUN_MARKER, Severity,
    Table,
};
use std::fs;
use tempfile::TempDir;

fn alerts() -> Vec<Alert> {
    vec![Alert {
        firm_id: "AAA".to_string(),
        year: 2022,
        kind: AlertKind::ChanceDrop,
        severity: Severity::Medium,
        message: "Chance dropped sharply: 0.70 -> 0.40.".to_string(),
    }]
}

#[test]
fn test_publish_replaces_previous_run() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join(RUN_MARKER), "{}").unwrap();
    fs::write(target.join("stale.csv"), "old").unwrap();

    let mut writer = ArtifactWriter::begin(&target).unwrap();
    writer.write("alerts.csv", alerts().as_slice(), ExportFormat::Csv).unwrap();
    writer.write_json("summary.json", &serde_json::json!({"rows": 1})).unwrap();

    // Nothing visible before publish
    assert!(!target.join("alerts.csv").exists());
    assert!(target.join("stale.csv").exists());

    let published = writer.publish().unwrap();
    assert_eq!(published, target);
    assert!(!target.join("stale.csv").exists());
    assert!(!dir.path().join(".artifacts.previous").exists());

    let csv = fs::read_to_string(target.join("alerts.csv")).unwrap();
    assert_eq!(
        csv,
        "firm_id,year,kind,severity,message\n\
         AAA,2022,chance_drop,medium,Chance dropped sharply: 0.70 -> 0.40.\n"
    );
    assert!(fs::read_to_string(target.join("summary.json")).unwrap().ends_with("}\n"));
}

#[test]
fn test_abandoned_run_leaves_target_untouched() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("keep.csv"), "kept").unwrap();

    let staging = {
        let mut writer = ArtifactWriter::begin(&target).unwrap();
        writer.write("alerts.csv", alerts().as_slice(), ExportFormat::Csv).unwrap();
        writer.staging_dir().to_path_buf()
    };

    assert!(!staging.exists());
    assert_eq!(fs::read_to_string(target.join("keep.csv")).unwrap(), "kept");
    assert!(!target.join("alerts.csv").exists());
}

#[test]
fn test_identical_writes_are_identical_bytes() {
    let dir = TempDir::new().unwrap();
    let mut outputs = Vec::new();
    for name in ["a", "b"] {
        let target = dir.path().join(name);
        let mut writer = ArtifactWriter::begin(&target).unwrap();
        writer.write("alerts.json", alerts().as_slice(), ExportFormat::PrettyJson).unwrap();
        writer.publish().unwrap();
        outputs.push(fs::read(target.join("alerts.json")).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_publish_refuses_foreign_directory() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("reports");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("thesis.docx"), "draft").unwrap();

    let mut writer = ArtifactWriter::begin(&target).unwrap();
    writer.write_json("summary.json", &serde_json::json!({"rows": 1})).unwrap();
    let err = writer.publish().unwrap_err();

    assert!(matches!(err, ExportError::ForeignTarget(ref p) if p == &target));
    assert_eq!(fs::read_to_string(target.join("thesis.docx")).unwrap(), "draft");
    assert!(!target.join("summary.json").exists());
    assert!(!dir.path().join(".reports.staging").exists());
}

#[test]
fn test_publish_into_empty_directory() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    fs::create_dir_all(&target).unwrap();

    let mut writer = ArtifactWriter::begin(&target).unwrap();
    writer.write_json(RUN_MARKER, &serde_json::json!({})).unwrap();
    writer.publish().unwrap();

    assert!(target.join(RUN_MARKER).is_file());
}

#[test]
fn test_publish_refuses_plain_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    fs::write(&target, "not a directory").unwrap();

    let writer = ArtifactWriter::begin(&target).unwrap();
    assert!(matches!(writer.publish(), Err(ExportError::ForeignTarget(_))));
    assert_eq!(fs::read_to_string(&target).unwrap(), "not a directory");
}

#[test]
fn test_no_alerts_still_writes_header() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");

    let none: Vec<Alert> = Vec::new();
    let table = Table::new(Alert::CSV_COLUMNS, none.as_slice());
    let mut writer = ArtifactWriter::begin(&target).unwrap();
    writer.write("alerts.csv", &table, ExportFormat::Csv).unwrap();
    writer.publish().unwrap();

    let csv = fs::read_to_string(target.join("alerts.csv")).unwrap();
    assert_eq!(csv, "firm_id,year,kind,severity,message\n");
}

#[test]
fn test_alert_columns_match_serialized_header() {
    let rows = alerts();
    let csv = rows.as_slice().export_to_string(ExportFormat::Csv).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(header, Alert::CSV_COLUMNS.join(","));

    let table = Table::new(Alert::CSV_COLUMNS, rows.as_slice());
    assert_eq!(table.export_to_string(ExportFormat::Csv).unwrap(), csv);
}
