//! Native XGBoost backend (`xgboost` feature)

use crate::classifier::Classifier;
use crate::config::XgbConfig;
use crate::dataset::Dataset;
use crate::error::{ModelError, Result};
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use xgboost_rust as xgb;

fn backend_err(err: impl fmt::Display) -> ModelError {
    ModelError::Backend(err.to_string())
}

fn dense(x: ArrayView2<'_, f64>) -> Result<xgb::DMatrix> {
    let flat: Vec<f32> = x.iter().map(|v| *v as f32).collect();
    xgb::DMatrix::from_dense(&flat, x.nrows()).map_err(backend_err)
}

/// A trained booster. The booster handle itself is not serialized; a
/// deserialized model reports a backend error on prediction.
#[derive(Serialize, Deserialize)]
pub struct XgbModel {
    #[serde(skip)]
    booster: Option<xgb::Booster>,
    n_features: usize,
    config: XgbConfig,
}

impl fmt::Debug for XgbModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XgbModel")
            .field("loaded", &self.booster.is_some())
            .field("n_features", &self.n_features)
            .field("config", &self.config)
            .finish()
    }
}

impl XgbModel {
    /// Train a `binary:logistic` booster.
    pub fn fit(data: &Dataset, config: &XgbConfig, seed: u64) -> Result<Self> {
        data.check_trainable()?;

        let mut dtrain = dense(data.x.view())?;
        let labels: Vec<f32> = data.y.iter().map(|v| f32::from(*v)).collect();
        dtrain.set_labels(&labels).map_err(backend_err)?;

        let max_depth = config.max_depth.to_string();
        let eta = config.eta.to_string();
        let subsample = config.subsample.to_string();
        let colsample = config.colsample_bytree.to_string();
        let lambda = config.lambda.to_string();
        let seed = seed.to_string();
        let params = vec![
            ("objective", "binary:logistic"),
            ("eval_metric", "logloss"),
            ("tree_method", "hist"),
            ("max_depth", max_depth.as_str()),
            ("eta", eta.as_str()),
            ("subsample", subsample.as_str()),
            ("colsample_bytree", colsample.as_str()),
            ("lambda", lambda.as_str()),
            ("seed", seed.as_str()),
            ("nthread", "1"),
        ];

        let booster =
            xgb::Booster::train(&dtrain, &params, config.rounds, &[]).map_err(backend_err)?;
        debug!(rounds = config.rounds, "xgboost fit");

        Ok(Self {
            booster: Some(booster),
            n_features: data.n_features(),
            config: *config,
        })
    }
}

impl Classifier for XgbModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        let booster = self
            .booster
            .as_ref()
            .ok_or_else(|| ModelError::Backend("booster not loaded".to_string()))?;
        let preds = booster.predict(&dense(x)?).map_err(backend_err)?;
        Ok(preds.iter().map(|p| f64::from(*p)).collect())
    }
}
