//! ProfitPulse CLI binary.
//!
//! Runs the scoring pipeline over a firm-year CSV and publishes the artifacts.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use profitpulse::factors::available_proxies;
use profitpulse::models::ModelKind;
use profitpulse::output::RiskBucket;
use profitpulse::score::LabelRule;
use profitpulse::{Pipeline, PipelineConfig, PipelineOutput};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "profitpulse")]
#[command(about = "ProfitPulse: leakage-safe profitability scoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full pipeline and publish artifacts
    Run {
        #[command(flatten)]
        overrides: Overrides,

        /// Disable the progress spinner
        #[arg(long)]
        no_progress: bool,
    },

    /// List the financial proxies
    Proxies {
        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Settings layered over the configuration file.
#[derive(Debug, Args)]
struct Overrides {
    /// JSON configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Input CSV
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Artifact directory
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Last year of the measurement fit window
    #[arg(long)]
    fit_cutoff: Option<i32>,

    /// Last target year used for training
    #[arg(long)]
    train_cutoff: Option<i32>,

    /// Target years held out for evaluation
    #[arg(long, value_delimiter = ',')]
    test_years: Option<Vec<i32>>,

    /// Minimum fit-window rows
    #[arg(long)]
    min_fit_rows: Option<usize>,

    /// Label rule (zero, median_by_year, median_fit_window)
    #[arg(long, value_parser = parse_label_rule)]
    label_rule: Option<LabelRule>,

    /// Models to train (svm, rf, xgboost)
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<ModelKind>>,

    /// Model behind the screener and alerts
    #[arg(long)]
    default_model: Option<ModelKind>,

    /// Probability threshold for the predicted class
    #[arg(long)]
    threshold: Option<f64>,

    /// Predictor year of the exported screener
    #[arg(long)]
    screener_year: Option<i32>,
}

fn parse_label_rule(s: &str) -> Result<LabelRule, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "zero" => Ok(LabelRule::Zero),
        "median_by_year" => Ok(LabelRule::MedianByYear),
        "median_fit_window" => Ok(LabelRule::MedianFitWindow),
        other => Err(format!("unknown label rule: {other}")),
    }
}

impl Overrides {
    fn resolve(self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(v) = self.input {
            config.input_path = v;
        }
        if let Some(v) = self.output {
            config.output_dir = v;
        }
        if let Some(v) = self.seed {
            config.models.seed = v;
        }
        if let Some(v) = self.fit_cutoff {
            config.fit_cutoff_year = v;
        }
        if let Some(v) = self.train_cutoff {
            config.train_cutoff_year = v;
        }
        if let Some(v) = self.test_years {
            config.test_years = v;
        }
        if let Some(v) = self.min_fit_rows {
            config.min_fit_rows = v;
        }
        if let Some(v) = self.label_rule {
            config.label_rule = v;
        }
        if let Some(v) = self.models {
            config.models.models = v;
        }
        if let Some(v) = self.default_model {
            config.default_model = v;
        }
        if let Some(v) = self.threshold {
            config.models.threshold = v;
        }
        if self.screener_year.is_some() {
            config.screener_year = self.screener_year;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(json_logs: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            overrides,
            no_progress,
        } => {
            let config = overrides.resolve()?;
            run_pipeline(config, no_progress || cli.json_logs)?;
        }
        Commands::Proxies { format } => list_proxies(&format)?,
        Commands::Config { overrides } => {
            let config = overrides.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn run_pipeline(config: PipelineConfig, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(config)?;

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {elapsed} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let output = match pipeline.run_with(|stage| pb.set_message(stage.to_string())) {
        Ok(output) => {
            pb.finish_with_message("Pipeline complete");
            output
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let published = output.export()?;
    print_summary(&output);
    println!("\nArtifacts written to {}", published.display());
    Ok(())
}

fn print_summary(output: &PipelineOutput) {
    let split = &output.metrics.split;
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", "PROFITPULSE RUN SUMMARY");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!(
        "Fit window: <= {} ({} rows)",
        output.methodology.fit_cutoff_year, output.methodology.fit_rows
    );
    println!(
        "Explained variance: {}",
        output
            .methodology
            .explained_variance_ratio
            .iter()
            .map(|v| format!("{:.1}%", v * 100.0))
            .collect::<Vec<_>>()
            .join(" / ")
    );
    println!(
        "Split: train <= {}, test {:?} ({} train / {} test / {} excluded)\n",
        split.train_cutoff, split.test_years, split.train_rows, split.test_rows, split.excluded_rows
    );

    println!(
        "{:<16} {:<18} {:>9} {:>9} {:>9} {:>9}",
        "Model", "Backend", "Accuracy", "F1", "AUC", "Test N"
    );
    println!("{}", "─".repeat(75));
    for model in &output.training.models {
        let m = &model.metrics;
        let auc = m.auc.map_or_else(|| "n/a".to_string(), |a| format!("{a:.3}"));
        println!(
            "{:<16} {:<18} {:>9.3} {:>9.3} {:>9} {:>9}",
            model.kind.id(),
            model.backend.to_string(),
            m.accuracy,
            m.f1,
            auc,
            m.n
        );
    }
    for sub in &output.training.substitutions {
        println!("  note: {} ran on {} ({})", sub.model, sub.used, sub.reason);
    }

    if let Some(year) = output.latest_year()
        && let Some(rows) = output.screener(year)
    {
        let high = rows.iter().filter(|r| r.risk == RiskBucket::High).count();
        println!(
            "\nScreener {year}: {} firms, {high} high risk, {} alerts overall",
            rows.len(),
            output.alerts.len()
        );
    }
}

fn list_proxies(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let proxies = available_proxies();

    if format == "json" {
        let out: Vec<_> = proxies
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "category": format!("{:?}", p.category),
                    "description": p.description,
                    "fields": p
                        .required_fields
                        .iter()
                        .map(|f| f.canonical_name())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{:<6} {:<10} {:<48} Fields", "Name", "Category", "Description");
    println!("{}", "─".repeat(90));
    for p in &proxies {
        let fields: Vec<&str> = p.required_fields.iter().map(|f| f.canonical_name()).collect();
        println!(
            "{:<6} {:<10} {:<48} {}",
            p.name,
            format!("{:?}", p.category),
            p.description,
            fields.join(", ")
        );
    }
    Ok(())
}
