//! End-to-end runs on a two-firm panel.

use profitpulse::data::{Panel, RawRecord};
use profitpulse::models::ModelKind;
use profitpulse::{ErrorKind, Pipeline, PipelineConfig, Stage};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// AAA is profitable every year, BBB never is.
fn record(firm: &str, year: i32, net_income: f64, eps: f64) -> RawRecord {
    RawRecord::new(firm, year)
        .with_total_assets(1_000.0)
        .with_equity(400.0)
        .with_shares_issued(5.0)
        .with_eps(eps)
        .with_revenue(800.0)
        .with_net_income(net_income)
}

fn records() -> Vec<RawRecord> {
    vec![
        record("AAA", 2018, 100.0, 2.0),
        record("AAA", 2019, 112.0, 2.3),
        record("AAA", 2020, 105.0, 2.1),
        record("AAA", 2021, 118.0, 2.4),
        record("BBB", 2018, -50.0, -1.0),
        record("BBB", 2019, -61.0, -1.2),
        record("BBB", 2020, -54.0, -1.1),
        record("BBB", 2021, -42.0, -0.8),
    ]
}

fn config(output_dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig {
        output_dir: output_dir.to_path_buf(),
        fit_cutoff_year: 2019,
        train_cutoff_year: 2020,
        test_years: vec![2021],
        min_fit_rows: 4,
        ..PipelineConfig::default()
    };
    config.models.forest.n_trees = 25;
    config.models.boosting.n_stages = 20;
    config
}

#[test]
fn test_two_firm_scenario() {
    let dir = TempDir::new().unwrap();
    let panel = Panel::from_records(records()).unwrap();
    let output = Pipeline::new(config(&dir.path().join("out")))
        .unwrap()
        .run_panel(&panel)
        .unwrap();

    assert_eq!(output.methodology.fit_rows, 4);
    assert_eq!(output.scored.len(), 8);
    assert_eq!(output.forecast.len(), 6);
    assert_eq!(output.split.train.len(), 4);
    assert_eq!(output.split.test.len(), 2);
    assert_eq!(output.split.excluded, 0);

    assert_eq!(output.training.models.len(), 3);
    for model in &output.training.models {
        assert_eq!(model.metrics.n, 2, "{}", model.kind);
        assert_eq!(model.train_rows, 4);
    }
    assert_eq!(output.metrics.split.train_rows, 4);
    assert_eq!(output.metrics.split.test_rows, 2);
    assert_eq!(output.metrics.default_model, "xgboost");

    for row in &output.scored {
        let expected = u8::from(row.firm_id == "AAA");
        assert_eq!(row.label, Some(expected), "{} {}", row.firm_id, row.year);
    }

    // Every scored firm-year is forecast by every model
    assert_eq!(output.predictions.len(), 8 * 3);
    let latest = output.predictions_for("AAA").unwrap();
    assert!(latest.iter().any(|p| {
        p.predictor_year == 2021 && p.target_year == 2022 && p.actual_label.is_none()
    }));

    assert_eq!(output.latest_year(), Some(2021));
    let screener = output.screener(2021).unwrap();
    assert_eq!(screener.len(), 2);
    assert!(screener.windows(2).all(|w| w[0].risk.rank() <= w[1].risk.rank()));

    assert_eq!(output.company("BBB").unwrap().len(), 4);
    assert!(output.company("ZZZ").is_none());
}

#[test]
fn test_run_from_csv_and_export() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "FIRM_ID,YEAR,TA,EQ_P,SH_ISS,EPS_B,REV,NI_P,NI_AT").unwrap();
    for r in records() {
        writeln!(
            file,
            "{},{},1000,400,5,{},800,{},",
            r.firm_id,
            r.year,
            r.eps.unwrap(),
            r.net_income_primary.unwrap()
        )
        .unwrap();
    }
    file.flush().unwrap();

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    let mut cfg = config(&target);
    cfg.input_path = file.path().to_path_buf();

    let mut stages = Vec::new();
    let output = Pipeline::new(cfg).unwrap().run_with(|s| stages.push(s)).unwrap();
    assert_eq!(stages.first(), Some(&Stage::Loading));
    assert_eq!(stages.last(), Some(&Stage::Views));
    assert!(stages.windows(2).all(|w| w[0] < w[1]));

    let published = output.export().unwrap();
    assert_eq!(published, target);
    for name in [
        "company_view.csv",
        "predictions.csv",
        "screener_2021.csv",
        "alerts.csv",
        "model_metrics.json",
        "methodology_snapshot.json",
        "models.json",
    ] {
        assert!(target.join(name).exists(), "missing {name}");
    }

    let company = fs::read_to_string(target.join("company_view.csv")).unwrap();
    assert!(company.starts_with("firm_id,year,profit_score,label,ROA,ROE,ROC,EPS,NPM,"));
    assert_eq!(company.lines().count(), 9);

    let alerts = fs::read_to_string(target.join("alerts.csv")).unwrap();
    assert!(alerts.starts_with("firm_id,year,kind,severity,message\n"));

    let metrics = fs::read_to_string(target.join("model_metrics.json")).unwrap();
    let metrics: serde_json::Value = serde_json::from_str(&metrics).unwrap();
    assert_eq!(metrics["split"]["test_rows"], 2);
    assert_eq!(metrics["config"]["fit_cutoff_year"], 2019);
    assert!(metrics["models"]["random_forest"]["feature_importances"].is_object());
}

#[test]
fn test_identical_runs_identical_artifacts() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("artifacts");
    let panel = Panel::from_records(records()).unwrap();

    let mut runs: Vec<BTreeMap<String, Vec<u8>>> = Vec::new();
    for _ in 0..2 {
        let output = Pipeline::new(config(&target)).unwrap().run_panel(&panel).unwrap();
        output.export().unwrap();
        let files = fs::read_dir(&target)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                (name, fs::read(&path).unwrap())
            })
            .collect();
        runs.push(files);
    }

    assert_eq!(runs[0].len(), 7);
    for (name, bytes) in &runs[0] {
        assert_eq!(Some(bytes), runs[1].get(name), "{name} differs between runs");
    }
}

#[test]
fn test_export_keeps_unrelated_directory() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("documents");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("notes.txt"), "keep me").unwrap();

    let panel = Panel::from_records(records()).unwrap();
    let output = Pipeline::new(config(&target)).unwrap().run_panel(&panel).unwrap();
    let err = output.export().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(fs::read_to_string(target.join("notes.txt")).unwrap(), "keep me");
    assert!(!target.join("model_metrics.json").exists());
}

#[test]
fn test_fit_parameters_ignore_later_years() {
    let dir = TempDir::new().unwrap();
    let baseline = Panel::from_records(records()).unwrap();

    let mut shocked = records();
    for r in shocked.iter_mut().filter(|r| r.year > 2019) {
        r.net_income_primary = r.net_income_primary.map(|v| v * 40.0);
        r.eps = r.eps.map(|v| v * -3.0);
    }
    let shocked = Panel::from_records(shocked).unwrap();

    let pipeline = Pipeline::new(config(&dir.path().join("out"))).unwrap();
    let a = pipeline.run_panel(&baseline).unwrap();
    let b = pipeline.run_panel(&shocked).unwrap();

    assert_eq!(a.methodology, b.methodology);
    assert_eq!(a.measurement.preprocessor().bounds(), b.measurement.preprocessor().bounds());
}

#[test]
fn test_missing_lookups() {
    let dir = TempDir::new().unwrap();
    let panel = Panel::from_records(records()).unwrap();
    let output = Pipeline::new(config(&dir.path().join("out")))
        .unwrap()
        .run_panel(&panel)
        .unwrap();

    assert!(output.screener(2030).is_none());
    assert!(output.predictions_for("ZZZ").is_none());
    assert!(output.alerts_for("ZZZ").is_empty());
    assert_eq!(output.require_screener(2030).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(output.require_company("ZZZ").unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(output.require_predictions("ZZZ").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_too_few_fit_rows() {
    let dir = TempDir::new().unwrap();
    let panel = Panel::from_records(records()).unwrap();
    let mut cfg = config(&dir.path().join("out"));
    cfg.min_fit_rows = 300;

    let err = Pipeline::new(cfg).unwrap().run_panel(&panel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_invalid_config_rejected() {
    let config = PipelineConfig {
        default_model: ModelKind::SvmRbf,
        pca_rank: 9,
        ..PipelineConfig::default()
    };
    assert_eq!(Pipeline::new(config).unwrap_err().kind(), ErrorKind::Config);
}
