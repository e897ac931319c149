//! Gradient-boosted trees on binary log-loss
//!
//! Native stand-in for the XGBoost model when the `xgboost` feature is off
//! or the native library is unavailable. Each stage fits a regression tree to
//! the negative gradient `y - p` and replaces its leaf values with one Newton
//! step `sum(r) / sum(p (1 - p))`.

use crate::classifier::Classifier;
use crate::config::BoostingConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::forest::normalize;
use crate::tree::{Node, RegressionTree, TreeParams};
use ndarray::{Array1, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

/// A fitted gradient-boosting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    init: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl GradientBoostingModel {
    /// Train on a dataset.
    pub fn fit(data: &Dataset, config: &BoostingConfig, seed: u64) -> Result<Self> {
        data.check_trainable()?;

        let n = data.len();
        let y = data.targets();
        let weights = vec![1.0; n];
        let mean = y.iter().sum::<f64>() / n as f64;
        let init = (mean / (1.0 - mean)).ln();
        let params = TreeParams {
            max_depth: Some(config.max_depth),
            min_samples_leaf: config.min_samples_leaf,
            max_features: None,
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut raw = vec![init; n];
        let mut trees = Vec::with_capacity(config.n_stages);
        let mut importances = vec![0.0; data.n_features()];

        for _ in 0..config.n_stages {
            let p: Vec<f64> = raw.iter().map(|v| sigmoid(*v)).collect();
            let residual: Vec<f64> = y.iter().zip(&p).map(|(yi, pi)| yi - pi).collect();

            let (mut tree, imp) = RegressionTree::fit(
                data.x.view(),
                &residual,
                &weights,
                (0..n).collect(),
                params,
                &mut rng,
            );

            // Newton step per leaf
            let mut leaves: BTreeMap<usize, (f64, f64)> = BTreeMap::new();
            let mut leaf_of = Vec::with_capacity(n);
            for (i, row) in data.x.rows().into_iter().enumerate() {
                let leaf = tree.leaf_index(row);
                let entry = leaves.entry(leaf).or_insert((0.0, 0.0));
                entry.0 += residual[i];
                entry.1 += p[i] * (1.0 - p[i]);
                leaf_of.push(leaf);
            }
            for (&leaf, &(num, den)) in &leaves {
                let gamma = if den.abs() < 1e-150 { 0.0 } else { num / den };
                tree.set_leaf_value(leaf, gamma);
            }

            for (i, leaf) in leaf_of.into_iter().enumerate() {
                if let Some(Node::Leaf { value }) = tree.nodes().get(leaf) {
                    raw[i] += config.learning_rate * value;
                }
            }
            for (acc, v) in importances.iter_mut().zip(imp) {
                *acc += v;
            }
            trees.push(tree);
        }
        normalize(&mut importances);

        debug!(stages = trees.len(), init, "gradient boosting fit");
        Ok(Self {
            init,
            learning_rate: config.learning_rate,
            trees,
            n_features: data.n_features(),
            importances,
        })
    }

    /// Number of fitted stages.
    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for GradientBoostingModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let raw = self.init
                    + self
                        .trees
                        .iter()
                        .map(|t| self.learning_rate * t.predict_row(row))
                        .sum::<f64>();
                sigmoid(raw)
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn data() -> Dataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64 / 4.0;
            x.extend([((i * 3) % 7) as f64, v]);
            y.push(u8::from(v > 5.0));
        }
        Dataset {
            x: Array2::from_shape_vec((40, 2), x).unwrap(),
            y: Array1::from(y),
        }
    }

    #[test]
    fn test_sigmoid_stable() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn test_fits_step() {
        let config = BoostingConfig {
            n_stages: 30,
            ..BoostingConfig::default()
        };
        let model = GradientBoostingModel::fit(&data(), &config, 42).unwrap();
        let proba = model.predict_proba(array![[1.0, 1.0], [1.0, 9.0]].view()).unwrap();

        assert_eq!(model.n_stages(), 30);
        assert!(proba[0] < 0.2);
        assert!(proba[1] > 0.8);

        let imp = model.feature_importances().unwrap();
        assert!(imp[1] > imp[0]);
    }

    #[test]
    fn test_init_is_log_odds() {
        let config = BoostingConfig {
            n_stages: 0,
            ..BoostingConfig::default()
        };
        let model = GradientBoostingModel::fit(&data(), &config, 42).unwrap();
        // 19 of 40 rows have v > 5
        let proba = model.predict_proba(array![[0.0, 0.0]].view()).unwrap();
        assert_relative_eq!(proba[0], 19.0 / 40.0, epsilon = 1e-12);
    }
}
