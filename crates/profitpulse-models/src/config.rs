//! Classifier hyperparameters.

use crate::classifier::ModelKind;
use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Kernel width rule for the RBF kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * Var(X))` over the scaled training matrix
    Scale,
    /// Fixed value
    Value(f64),
}

/// Configuration for the RBF support vector classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmConfig {
    /// Soft-margin penalty (default: 10)
    pub c: f64,
    /// Kernel width (default: scale)
    pub gamma: Gamma,
    /// Weight classes inversely to their frequency (default: true)
    pub balanced: bool,
    /// Stopping tolerance on the maximal violation (default: 1e-3)
    pub tolerance: f64,
    /// Iteration cap for the SMO solver (default: 1 000 000)
    pub max_iterations: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 10.0,
            gamma: Gamma::Scale,
            balanced: true,
            tolerance: 1e-3,
            max_iterations: 1_000_000,
        }
    }
}

/// Configuration for the random forest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees (default: 400)
    pub n_trees: usize,
    /// Minimum samples per leaf (default: 2)
    pub min_samples_leaf: usize,
    /// Depth limit; unlimited when `None` (default)
    pub max_depth: Option<usize>,
    /// Weight classes inversely to their frequency (default: true)
    pub balanced: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 400,
            min_samples_leaf: 2,
            max_depth: None,
            balanced: true,
        }
    }
}

/// Configuration for the native gradient-boosting fallback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Boosting stages (default: 100)
    pub n_stages: usize,
    /// Depth of each regression tree (default: 3)
    pub max_depth: usize,
    /// Shrinkage (default: 0.1)
    pub learning_rate: f64,
    /// Minimum samples per leaf (default: 1)
    pub min_samples_leaf: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 1,
        }
    }
}

/// Configuration for the native XGBoost backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XgbConfig {
    /// Boosting rounds (default: 500)
    pub rounds: u32,
    /// Tree depth (default: 4)
    pub max_depth: u32,
    /// Learning rate (default: 0.05)
    pub eta: f64,
    /// Row subsample ratio (default: 0.9)
    pub subsample: f64,
    /// Column subsample ratio per tree (default: 0.9)
    pub colsample_bytree: f64,
    /// L2 regularization (default: 1)
    pub lambda: f64,
}

impl Default for XgbConfig {
    fn default() -> Self {
        Self {
            rounds: 500,
            max_depth: 4,
            eta: 0.05,
            subsample: 0.9,
            colsample_bytree: 0.9,
            lambda: 1.0,
        }
    }
}

/// Configuration for training and prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Models to train, in report order (default: all three)
    pub models: Vec<ModelKind>,
    /// Seed for every random draw (default: 42)
    pub seed: u64,
    /// Probability threshold for the predicted class (default: 0.5)
    pub threshold: f64,
    /// SVM hyperparameters
    pub svm: SvmConfig,
    /// Random forest hyperparameters
    pub forest: ForestConfig,
    /// Gradient-boosting fallback hyperparameters
    pub boosting: BoostingConfig,
    /// Native XGBoost hyperparameters
    pub xgboost: XgbConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::ALL.to_vec(),
            seed: 42,
            threshold: 0.5,
            svm: SvmConfig::default(),
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
            xgboost: XgbConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Reject settings no classifier can train with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ModelError::InvalidParameter(msg.to_string()));
        if self.models.is_empty() {
            return invalid("model list must not be empty");
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return invalid("threshold must be within [0, 1]");
        }
        if !positive(self.svm.c) {
            return invalid("svm.c must be positive");
        }
        if let Gamma::Value(g) = self.svm.gamma
            && !positive(g)
        {
            return invalid("svm.gamma must be positive");
        }
        if self.forest.n_trees == 0 || self.forest.min_samples_leaf == 0 {
            return invalid("forest.n_trees and forest.min_samples_leaf must be positive");
        }
        if self.boosting.n_stages == 0 || !positive(self.boosting.learning_rate) {
            return invalid("boosting.n_stages and boosting.learning_rate must be positive");
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
