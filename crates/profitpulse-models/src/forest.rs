//! Random forest classifier
//!
//! Bootstrap-aggregated CART trees with `sqrt(p)` features per split and
//! optional balanced class weights. Trees are grown in parallel, each from
//! its own seeded generator, so a fixed seed reproduces the forest exactly
//! regardless of thread scheduling.

use crate::classifier::Classifier;
use crate::config::ForestConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::tree::{RegressionTree, TreeParams};
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    trees: Vec<RegressionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForestModel {
    /// Train on a dataset.
    pub fn fit(data: &Dataset, config: &ForestConfig, seed: u64) -> Result<Self> {
        data.check_trainable()?;

        let n = data.len();
        let p = data.n_features();
        let target = data.targets();
        let class_weights = data.class_weights(config.balanced);
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf,
            max_features: Some(((p as f64).sqrt().floor() as usize).max(1)),
        };

        let fitted: Vec<(RegressionTree, Vec<f64>)> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));

                // Bootstrap draw, folded into per-row multiplicities
                let mut counts = vec![0.0; n];
                for _ in 0..n {
                    counts[rng.gen_range(0..n)] += 1.0;
                }
                let weights: Vec<f64> = counts
                    .iter()
                    .zip(data.y.iter())
                    .map(|(c, y)| c * class_weights[usize::from(*y)])
                    .collect();
                let indices: Vec<usize> = (0..n).filter(|&i| counts[i] > 0.0).collect();

                RegressionTree::fit(data.x.view(), &target, &weights, indices, params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; p];
        let mut trees = Vec::with_capacity(fitted.len());
        for (tree, imp) in fitted {
            let total: f64 = imp.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(&imp) {
                    *acc += v / total;
                }
            }
            trees.push(tree);
        }
        normalize(&mut importances);

        debug!(trees = trees.len(), max_features = ?params.max_features, "random forest fit");
        Ok(Self {
            trees,
            n_features: p,
            importances,
        })
    }

    /// Number of trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Scale to unit sum; all-zero vectors are left alone.
pub(crate) fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

impl Classifier for RandomForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        let n_trees = self.trees.len().max(1) as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (sum / n_trees).clamp(0.0, 1.0)
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}
