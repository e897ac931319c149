//! Temporal train/test split keyed on the target year.

use crate::error::{Result, ScoreError};
use crate::label::ForecastRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Train and test partitions of the forecast rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    /// Rows with `target_year <= train_cutoff`
    pub train: Vec<ForecastRow>,
    /// Rows whose target year is a test year
    pub test: Vec<ForecastRow>,
    /// Rows in neither partition (buffer years)
    pub excluded: usize,
}

/// Train cutoff plus an explicit set of test years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalSplit {
    train_cutoff: i32,
    test_years: BTreeSet<i32>,
}

impl TemporalSplit {
    /// Create a split; every test year must come strictly after the cutoff.
    pub fn new(train_cutoff: i32, test_years: impl IntoIterator<Item = i32>) -> Result<Self> {
        let test_years: BTreeSet<i32> = test_years.into_iter().collect();
        if let Some(bad) = test_years.iter().find(|y| **y <= train_cutoff) {
            return Err(ScoreError::InvalidParameter(format!(
                "test year {bad} is not after train cutoff {train_cutoff}"
            )));
        }
        Ok(Self {
            train_cutoff,
            test_years,
        })
    }

    /// Last target year in the training partition.
    pub const fn train_cutoff(&self) -> i32 {
        self.train_cutoff
    }

    /// Test target years.
    pub const fn test_years(&self) -> &BTreeSet<i32> {
        &self.test_years
    }

    /// Partition rows by target year.
    pub fn split(&self, rows: &[ForecastRow]) -> Split {
        let mut out = Split::default();
        for row in rows {
            if row.target_year <= self.train_cutoff {
                out.train.push(row.clone());
            } else if self.test_years.contains(&row.target_year) {
                out.test.push(row.clone());
            } else {
                out.excluded += 1;
            }
        }
        info!(
            train = out.train.len(),
            test = out.test.len(),
            excluded = out.excluded,
            cutoff = self.train_cutoff,
            "temporal split"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profitpulse_factors::ProxySet;

    fn row(firm: &str, target_year: i32) -> ForecastRow {
        ForecastRow {
            firm_id: firm.to_string(),
            predictor_year: target_year - 1,
            target_year,
            gap: 1,
            features: ProxySet::default(),
            z: ProxySet::default(),
            profit_score: 0.0,
            label: 0,
        }
    }

    #[test]
    fn test_split_disjoint() {
        let rows: Vec<_> = (2018..=2024).map(|y| row("A", y)).collect();
        let split = TemporalSplit::new(2020, [2021, 2022]).unwrap().split(&rows);

        assert!(split.train.iter().all(|r| r.target_year <= 2020));
        assert!(split.test.iter().all(|r| [2021, 2022].contains(&r.target_year)));
        assert_eq!(split.train.len(), 3);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.excluded, 2);

        let train_years: BTreeSet<_> = split.train.iter().map(|r| r.target_year).collect();
        assert!(split.test.iter().all(|r| !train_years.contains(&r.target_year)));
    }

    #[test]
    fn test_split_rejects_overlap() {
        assert!(matches!(
            TemporalSplit::new(2021, [2021, 2022]),
            Err(ScoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_buffer_years_allowed() {
        let split = TemporalSplit::new(2019, [2022]).unwrap();
        let out = split.split(&[row("A", 2020), row("A", 2022)]);
        assert!(out.train.is_empty());
        assert_eq!(out.test.len(), 1);
        assert_eq!(out.excluded, 1);
    }
}
