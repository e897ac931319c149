//! Column-name resolution.
//!
//! Source files name the same field in several ways (`FIRM_ID`, `Ticker`,
//! `firm_id`, ...). The mapping is resolved once, against the header row, and
//! nothing downstream ever sees an alternate name.

use crate::error::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RawField {
    /// Firm identifier
    FirmId,
    /// Calendar year
    Year,
    /// Total assets
    TotalAssets,
    /// Equity basis
    Equity,
    /// Shares issued
    SharesIssued,
    /// Reported basic EPS
    Eps,
    /// Revenue
    Revenue,
    /// Preferred net income source
    NetIncomePrimary,
    /// Fallback net income source
    NetIncomeSecondary,
}

impl RawField {
    /// Every canonical field, in column order.
    pub const ALL: [Self; 9] = [
        Self::FirmId,
        Self::Year,
        Self::TotalAssets,
        Self::Equity,
        Self::SharesIssued,
        Self::Eps,
        Self::Revenue,
        Self::NetIncomePrimary,
        Self::NetIncomeSecondary,
    ];

    /// Canonical column name.
    pub const fn canonical_name(&self) -> &'static str {
        match self {
            Self::FirmId => "FIRM_ID",
            Self::Year => "YEAR",
            Self::TotalAssets => "TA",
            Self::Equity => "EQ_P",
            Self::SharesIssued => "SH_ISS",
            Self::Eps => "EPS_B",
            Self::Revenue => "REV",
            Self::NetIncomePrimary => "NI_P",
            Self::NetIncomeSecondary => "NI_AT",
        }
    }

    /// Column names accepted by default, canonical name first.
    pub fn default_aliases(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::FirmId => &["FIRM_ID", "Ticker", "firm_id", "TICKER"],
            Self::Year => &["YEAR", "year", "Year"],
            other => return vec![other.canonical_name().to_string()],
        };
        names.iter().map(|s| (*s).to_string()).collect()
    }

    /// Whether the field is required on its own (net income is required as a pair).
    pub const fn is_required(&self) -> bool {
        !matches!(self, Self::NetIncomePrimary | Self::NetIncomeSecondary)
    }
}

/// Accepted column-name variants per canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMapping {
    aliases: BTreeMap<RawField, Vec<String>>,
}

impl Default for SchemaMapping {
    fn default() -> Self {
        let aliases = RawField::ALL
            .iter()
            .map(|f| (*f, f.default_aliases()))
            .collect();
        Self { aliases }
    }
}

impl SchemaMapping {
    /// Accept an additional column name for `field`.
    pub fn with_alias(mut self, field: RawField, name: impl Into<String>) -> Self {
        let name = name.into();
        let entry = self.aliases.entry(field).or_default();
        if !entry.contains(&name) {
            entry.push(name);
        }
        self
    }

    /// Accepted names for a field.
    pub fn aliases(&self, field: RawField) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Match the mapping against a header row.
    ///
    /// Headers are trimmed before comparison. The first alias found in the
    /// header wins. Every missing required column is reported at once.
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> Result<ResolvedSchema> {
        let trimmed: Vec<(&str, &str)> = headers
            .iter()
            .map(|h| (h.as_ref(), h.as_ref().trim()))
            .collect();

        let mut columns = BTreeMap::new();
        let mut missing = Vec::new();

        for field in RawField::ALL {
            let found = self.aliases(field).iter().find_map(|alias| {
                trimmed
                    .iter()
                    .find(|(_, t)| *t == alias.as_str())
                    .map(|(raw, _)| (*raw).to_string())
            });

            match found {
                Some(column) => {
                    columns.insert(field, column);
                }
                None if field.is_required() => {
                    missing.push(field.canonical_name().to_string());
                }
                None => {}
            }
        }

        if !columns.contains_key(&RawField::NetIncomePrimary)
            && !columns.contains_key(&RawField::NetIncomeSecondary)
        {
            missing.push(format!(
                "{} or {}",
                RawField::NetIncomePrimary.canonical_name(),
                RawField::NetIncomeSecondary.canonical_name()
            ));
        }

        if !missing.is_empty() {
            return Err(DataError::MissingColumns { missing });
        }

        Ok(ResolvedSchema { columns })
    }
}

/// Canonical field to actual source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    columns: BTreeMap<RawField, String>,
}

impl ResolvedSchema {
    /// Source column for a field, if the header has one.
    pub fn column(&self, field: RawField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Resolved (field, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (RawField, &str)> + '_ {
        self.columns.iter().map(|(f, c)| (*f, c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: [&str; 9] = [
        "FIRM_ID", "YEAR", "TA", "EQ_P", "SH_ISS", "EPS_B", "REV", "NI_P", "NI_AT",
    ];

    #[test]
    fn test_resolve_canonical_headers() {
        let schema = SchemaMapping::default().resolve(&FULL).unwrap();
        for field in RawField::ALL {
            assert_eq!(schema.column(field), Some(field.canonical_name()));
        }
    }

    #[rstest]
    #[case("Ticker")]
    #[case("firm_id")]
    #[case("  FIRM_ID ")]
    fn test_resolve_firm_aliases(#[case] header: &str) {
        let mut headers: Vec<&str> = FULL.to_vec();
        headers[0] = header;
        let schema = SchemaMapping::default().resolve(&headers).unwrap();
        assert_eq!(schema.column(RawField::FirmId), Some(header));
    }

    #[test]
    fn test_one_net_income_column_is_enough() {
        let headers = ["FIRM_ID", "year", "TA", "EQ_P", "SH_ISS", "EPS_B", "REV", "NI_AT"];
        let schema = SchemaMapping::default().resolve(&headers).unwrap();
        assert_eq!(schema.column(RawField::NetIncomePrimary), None);
        assert_eq!(schema.column(RawField::NetIncomeSecondary), Some("NI_AT"));
    }

    #[test]
    fn test_missing_columns_are_all_named() {
        let headers = ["FIRM_ID", "YEAR", "TA", "EPS_B", "REV"];
        let err = SchemaMapping::default().resolve(&headers).unwrap_err();
        match err {
            DataError::MissingColumns { missing } => {
                assert_eq!(missing, vec!["EQ_P", "SH_ISS", "NI_P or NI_AT"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_custom_alias() {
        let mut headers: Vec<&str> = FULL.to_vec();
        headers[2] = "TotalAssets";
        let mapping = SchemaMapping::default().with_alias(RawField::TotalAssets, "TotalAssets");
        let schema = mapping.resolve(&headers).unwrap();
        assert_eq!(schema.column(RawField::TotalAssets), Some("TotalAssets"));
    }
}
