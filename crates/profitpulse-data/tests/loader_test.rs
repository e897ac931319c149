//! Integration tests for CSV ingestion.

use profitpulse_data::{DataError, PanelLoader, RawField, SchemaMapping};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_csv_sorted_panel() {
    let file = write_csv(
        "Ticker,YEAR,TA,EQ_P,SH_ISS,EPS_B,REV,NI_P,NI_AT\n\
         BBB,2020,200,100,10,2.0,400,20,\n\
         AAA,2020-12-31,100,50,5,1.0,200,,8\n\
         AAA,2019,100,50,5,1.0,200,10,9\n",
    );

    let panel = PanelLoader::default().load_csv(file.path()).unwrap();

    assert_eq!(panel.len(), 3);
    assert_eq!(panel.firms(), vec!["AAA", "BBB"]);
    assert_eq!(panel.years(), vec![2019, 2020]);

    let rows = panel.records();
    assert_eq!((rows[0].firm_id.as_str(), rows[0].year), ("AAA", 2019));
    assert_eq!(rows[0].net_income(), Some(10.0));
    assert_eq!((rows[1].firm_id.as_str(), rows[1].year), ("AAA", 2020));
    assert_eq!(rows[1].net_income(), Some(8.0));
    assert_eq!(rows[2].net_income(), Some(20.0));
}

#[test]
fn test_load_csv_trims_headers() {
    let file = write_csv(
        " FIRM_ID , YEAR ,TA,EQ_P,SH_ISS,EPS_B,REV,NI_P\n\
         AAA,2019,100,50,5,1.0,200,10\n",
    );

    let panel = PanelLoader::default().load_csv(file.path()).unwrap();
    assert_eq!(panel.len(), 1);
    assert_eq!(panel.records()[0].total_assets, Some(100.0));
}

#[test]
fn test_load_csv_missing_columns() {
    let file = write_csv("FIRM_ID,YEAR,TA\nAAA,2019,1\n");

    let err = PanelLoader::default().load_csv(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, DataError::MissingColumns { .. }));
    assert!(message.contains("EQ_P"));
    assert!(message.contains("NI_P or NI_AT"));
}

#[test]
fn test_load_csv_duplicate_key() {
    let file = write_csv(
        "FIRM_ID,YEAR,TA,EQ_P,SH_ISS,EPS_B,REV,NI_P\n\
         AAA,2019,100,50,5,1.0,200,10\n\
         AAA,2019-06-30,100,50,5,1.0,200,10\n",
    );

    let err = PanelLoader::default().load_csv(file.path()).unwrap_err();
    assert!(matches!(err, DataError::DuplicateKey { year: 2019, .. }));
}

#[test]
fn test_load_csv_custom_alias() {
    let file = write_csv(
        "Company,YEAR,TA,EQ_P,SH_ISS,EPS_B,REV,NI_P\n\
         AAA,2019,100,50,5,1.0,200,10\n",
    );

    let loader = PanelLoader::new(SchemaMapping::default().with_alias(RawField::FirmId, "Company"));
    let panel = loader.load_csv(file.path()).unwrap();
    assert_eq!(panel.firms(), vec!["AAA"]);
}
