//! CSV ingestion into a [`Panel`].

use crate::error::{DataError, Result};
use crate::record::{Panel, RawRecord};
use crate::schema::{RawField, ResolvedSchema, SchemaMapping};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Loads firm-year panels using a column-name mapping.
#[derive(Debug, Clone, Default)]
pub struct PanelLoader {
    mapping: SchemaMapping,
}

impl PanelLoader {
    /// Create a loader with the given mapping.
    pub const fn new(mapping: SchemaMapping) -> Self {
        Self { mapping }
    }

    /// Column mapping used by this loader.
    pub const fn mapping(&self) -> &SchemaMapping {
        &self.mapping
    }

    /// Read a CSV file.
    ///
    /// Every column is read as text and cast afterwards, so a stray
    /// non-numeric cell becomes undefined instead of failing the read.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<Panel> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading firm-year panel");

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        self.from_dataframe(&df)
    }

    /// Convert an in-memory DataFrame.
    pub fn from_dataframe(&self, df: &DataFrame) -> Result<Panel> {
        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let schema = self.mapping.resolve(&headers)?;
        debug!(columns = ?schema.iter().collect::<Vec<_>>(), "resolved input schema");

        let firm_ids = text_column(df, &schema, RawField::FirmId)?;
        let years = text_column(df, &schema, RawField::Year)?;
        let total_assets = numeric_column(df, &schema, RawField::TotalAssets)?;
        let equity = numeric_column(df, &schema, RawField::Equity)?;
        let shares = numeric_column(df, &schema, RawField::SharesIssued)?;
        let eps = numeric_column(df, &schema, RawField::Eps)?;
        let revenue = numeric_column(df, &schema, RawField::Revenue)?;
        let ni_primary = numeric_column(df, &schema, RawField::NetIncomePrimary)?;
        let ni_secondary = numeric_column(df, &schema, RawField::NetIncomeSecondary)?;

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;

        for i in 0..df.height() {
            let firm = firm_ids[i].as_deref().map(str::trim).filter(|s| !s.is_empty());
            let year = years[i].as_deref().and_then(parse_year);

            let (Some(firm), Some(year)) = (firm, year) else {
                dropped += 1;
                continue;
            };

            records.push(RawRecord {
                firm_id: firm.to_string(),
                year,
                total_assets: total_assets[i],
                equity: equity[i],
                shares_issued: shares[i],
                eps: eps[i],
                revenue: revenue[i],
                net_income_primary: ni_primary[i],
                net_income_secondary: ni_secondary[i],
            });
        }

        if dropped > 0 {
            warn!(dropped, "dropped rows with missing firm id or unparseable year");
        }
        if records.is_empty() {
            return Err(DataError::Empty);
        }

        let panel = Panel::from_records(records)?;
        info!(
            rows = panel.len(),
            firms = panel.firms().len(),
            years = panel.years().len(),
            "panel loaded"
        );
        Ok(panel)
    }
}

fn text_column(
    df: &DataFrame,
    schema: &ResolvedSchema,
    field: RawField,
) -> Result<Vec<Option<String>>> {
    let Some(name) = schema.column(field) else {
        return Ok(vec![None; df.height()]);
    };
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn numeric_column(
    df: &DataFrame,
    schema: &ResolvedSchema,
    field: RawField,
) -> Result<Vec<Option<f64>>> {
    let Some(name) = schema.column(field) else {
        return Ok(vec![None; df.height()]);
    };
    let column = df.column(name)?.as_materialized_series();

    // Text columns are trimmed first so " 12.5" still parses.
    let series = if column.dtype() == &DataType::String {
        let trimmed: StringChunked = column
            .str()?
            .into_iter()
            .map(|v| v.map(str::trim))
            .collect();
        trimmed.into_series().cast(&DataType::Float64)?
    } else {
        column.cast(&DataType::Float64)?
    };

    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// Extract a calendar year from an integer, float or date cell.
pub fn parse_year(cell: &str) -> Option<i32> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(year) = cell.parse::<i32>() {
        return Some(year);
    }
    if let Ok(value) = cell.parse::<f64>() {
        return (value.is_finite() && value.fract() == 0.0 && value.abs() < f64::from(i32::MAX))
            .then_some(value as i32);
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
    {
        return Some(date.year());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .map(|dt| dt.year())
}
