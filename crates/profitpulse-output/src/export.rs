//! Export of run artifacts
//!
//! Tables go out as CSV, documents as pretty JSON. [`ArtifactWriter`]
//! collects every file of a run in a staging directory next to the target
//! and swaps it into place on [`ArtifactWriter::publish`], so readers see
//! either the previous run or the complete new one.

use profitpulse_factors::ProxyKind;
use profitpulse_score::ScoredRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The target exists but does not hold a previous run's artifacts.
    #[error("refusing to replace {}: not an artifact directory (no {})", .0.display(), RUN_MARKER)]
    ForeignTarget(PathBuf),
}

/// File whose presence marks a directory as a published run.
pub const RUN_MARKER: &str = "model_metrics.json";

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

fn csv_string(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl<T: Serialize> Exporter for [T] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                for record in self {
                    wtr.serialize(record)?;
                }
                csv_string(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Rows with a fixed column list, so an empty table still carries its header.
#[derive(Debug, Clone, Copy)]
pub struct Table<'a, T> {
    columns: &'static [&'static str],
    rows: &'a [T],
}

impl<'a, T: Serialize> Table<'a, T> {
    /// Wrap `rows`, whose serialized fields are `columns` in order.
    pub const fn new(columns: &'static [&'static str], rows: &'a [T]) -> Self {
        Self { columns, rows }
    }
}

impl<T: Serialize> Exporter for Table<'_, T> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(vec![]);
                wtr.write_record(self.columns)?;
                for record in self.rows {
                    wtr.serialize(record)?;
                }
                csv_string(wtr)
            }
            _ => self.rows.export_to_string(format),
        }
    }
}

/// Scored firm-years with one column per proxy and per component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyView {
    /// Proxy columns, in order
    pub proxies: Vec<ProxyKind>,
    /// Rows sorted by firm and year
    pub rows: Vec<ScoredRecord>,
}

impl CompanyView {
    /// Build the view, sorting rows by (firm, year).
    pub fn new(mut rows: Vec<ScoredRecord>, proxies: &[ProxyKind]) -> Self {
        rows.sort_by(|a, b| a.firm_id.cmp(&b.firm_id).then(a.year.cmp(&b.year)));
        Self {
            proxies: proxies.to_vec(),
            rows,
        }
    }

    fn n_components(&self) -> usize {
        self.rows.iter().map(|r| r.components.len()).max().unwrap_or(0)
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Exporter for CompanyView {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let k = self.n_components();
                let mut header = vec!["firm_id".to_string(), "year".to_string()];
                header.extend(["profit_score".to_string(), "label".to_string()]);
                header.extend(self.proxies.iter().map(|p| p.name().to_string()));
                header.extend(self.proxies.iter().map(|p| format!("z_{}", p.name())));
                header.extend((1..=k).map(|i| format!("pc{i}")));

                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(&header)?;
                for row in &self.rows {
                    let mut record = vec![
                        row.firm_id.clone(),
                        row.year.to_string(),
                        row.profit_score.to_string(),
                        row.label.map(|l| l.to_string()).unwrap_or_default(),
                    ];
                    record.extend(self.proxies.iter().map(|p| cell(row.proxies.get(*p))));
                    record.extend(self.proxies.iter().map(|p| cell(row.z.get(*p))));
                    record.extend((0..k).map(|i| cell(row.components.get(i).copied())));
                    wtr.write_record(&record)?;
                }
                csv_string(wtr)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

/// Writes a run's artifacts into a staging directory and publishes them.
#[derive(Debug)]
pub struct ArtifactWriter {
    target: PathBuf,
    staging: PathBuf,
    retired: PathBuf,
    files: Vec<String>,
    published: bool,
}

impl ArtifactWriter {
    /// Start a run targeting `target`. Any stale staging directory from an
    /// aborted run is removed.
    pub fn begin(target: impl AsRef<Path>) -> Result<Self, ExportError> {
        let target = target.as_ref().to_path_buf();
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ExportError::InvalidFormat(format!("{} has no file name", target.display()))
            })?;
        let parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        fs::create_dir_all(&parent)?;

        let staging = parent.join(format!(".{name}.staging"));
        let retired = parent.join(format!(".{name}.previous"));
        if staging.exists() {
            warn!(path = %staging.display(), "removing stale staging directory");
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        Ok(Self {
            target,
            staging,
            retired,
            files: Vec::new(),
            published: false,
        })
    }

    /// Staging directory.
    pub fn staging_dir(&self) -> &Path {
        &self.staging
    }

    /// Files written so far, in write order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Write one artifact into the staging directory.
    pub fn write<E: Exporter + ?Sized>(
        &mut self,
        file_name: &str,
        data: &E,
        format: ExportFormat,
    ) -> Result<(), ExportError> {
        data.export_to_file(&self.staging.join(file_name), format)?;
        debug!(file = file_name, "artifact staged");
        self.files.push(file_name.to_string());
        Ok(())
    }

    /// Write a serializable document as pretty JSON.
    pub fn write_json<T: Serialize + ?Sized>(
        &mut self,
        file_name: &str,
        value: &T,
    ) -> Result<(), ExportError> {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        fs::write(self.staging.join(file_name), content)?;
        debug!(file = file_name, "artifact staged");
        self.files.push(file_name.to_string());
        Ok(())
    }

    /// Replace the target directory with the staged one.
    ///
    /// An existing target is replaced only when it is empty or holds a
    /// previous run ([`RUN_MARKER`]). The previous run stays in place until
    /// the staged directory has been renamed over it.
    pub fn publish(mut self) -> Result<PathBuf, ExportError> {
        let previous = if self.target.exists() {
            if !is_replaceable(&self.target)? {
                return Err(ExportError::ForeignTarget(self.target.clone()));
            }
            if self.retired.exists() {
                warn!(path = %self.retired.display(), "removing stale retired run");
                fs::remove_dir_all(&self.retired)?;
            }
            fs::rename(&self.target, &self.retired)?;
            true
        } else {
            false
        };

        if let Err(err) = fs::rename(&self.staging, &self.target) {
            if previous {
                fs::rename(&self.retired, &self.target)?;
            }
            return Err(err.into());
        }
        self.published = true;

        if previous && let Err(err) = fs::remove_dir_all(&self.retired) {
            warn!(%err, path = %self.retired.display(), "failed to remove retired run");
        }
        info!(path = %self.target.display(), files = self.files.len(), "Artifacts published");
        Ok(self.target.clone())
    }
}

fn is_replaceable(target: &Path) -> Result<bool, ExportError> {
    if !target.is_dir() {
        return Ok(false);
    }
    if target.join(RUN_MARKER).is_file() {
        return Ok(true);
    }
    Ok(fs::read_dir(target)?.next().is_none())
}

impl Drop for ArtifactWriter {
    fn drop(&mut self) {
        if !self.published
            && self.staging.exists()
            && let Err(err) = fs::remove_dir_all(&self.staging)
        {
            warn!(%err, path = %self.staging.display(), "failed to clean up staging directory");
        }
    }
}
