//! Model training and held-out evaluation
//!
//! Every requested classifier is fit on the same training partition and
//! scored once against the same test partition. When the native XGBoost
//! backend cannot be used, the gradient-boosting model stands in for it and
//! the substitution is recorded alongside the metrics.

use crate::boosting::GradientBoostingModel;
use crate::classifier::{Backend, Classifier, FittedModel, ModelKind};
use crate::config::ModelConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::forest::RandomForestModel;
use crate::metrics::{Metrics, evaluate};
use crate::svm::SvmModel;
use profitpulse_factors::ProxyKind;
use profitpulse_score::Split;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A fitted model and the backend substitution it needed, if any.
type Trained = (FittedModel, Option<Substitution>);

/// A requested backend that was replaced by another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// Model affected
    pub model: ModelKind,
    /// Backend that was requested
    pub requested: Backend,
    /// Backend actually used
    pub used: Backend,
    /// Why the requested backend was unavailable
    pub reason: String,
}

/// A fitted classifier with its test-set evaluation.
#[derive(Debug)]
pub struct TrainedModel {
    /// Model identifier
    pub kind: ModelKind,
    /// Backend that produced the fit
    pub backend: Backend,
    /// Fitted model
    pub model: FittedModel,
    /// Test-set metrics
    pub metrics: Metrics,
    /// Training rows
    pub train_rows: usize,
    /// Test rows
    pub test_rows: usize,
    /// Feature importances keyed by proxy name
    pub feature_importances: Option<BTreeMap<String, f64>>,
}

/// All trained models of one run.
#[derive(Debug, Default)]
pub struct TrainingReport {
    /// Models in configured order
    pub models: Vec<TrainedModel>,
    /// Backend substitutions made while training
    pub substitutions: Vec<Substitution>,
}

impl TrainingReport {
    /// Look up a trained model by kind.
    pub fn get(&self, kind: ModelKind) -> Option<&TrainedModel> {
        self.models.iter().find(|m| m.kind == kind)
    }
}

/// Trains the configured classifiers.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: ModelConfig,
}

impl ModelTrainer {
    /// Create a trainer.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the configuration.
    pub const fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Fit one model on a dataset.
    pub fn train(&self, kind: ModelKind, data: &Dataset) -> Result<Trained> {
        let seed = self.config.seed;
        match kind {
            ModelKind::SvmRbf => {
                Ok((FittedModel::Svm(SvmModel::fit(data, &self.config.svm)?), None))
            }
            ModelKind::RandomForest => Ok((
                FittedModel::RandomForest(RandomForestModel::fit(data, &self.config.forest, seed)?),
                None,
            )),
            ModelKind::XGBoost => self.train_boosted(data),
        }
    }

    #[cfg(feature = "xgboost")]
    fn train_boosted(&self, data: &Dataset) -> Result<Trained> {
        use crate::error::ModelError;
        use crate::xgb::XgbModel;

        match XgbModel::fit(data, &self.config.xgboost, self.config.seed) {
            Ok(model) => Ok((FittedModel::Xgboost(model), None)),
            Err(ModelError::Backend(reason)) => self.substitute(data, reason),
            Err(err) => Err(err),
        }
    }

    #[cfg(not(feature = "xgboost"))]
    fn train_boosted(&self, data: &Dataset) -> Result<Trained> {
        self.substitute(data, "built without the `xgboost` feature".to_string())
    }

    fn substitute(&self, data: &Dataset, reason: String) -> Result<Trained> {
        warn!(%reason, "xgboost unavailable, using gradient boosting");
        let model = GradientBoostingModel::fit(data, &self.config.boosting, self.config.seed)?;
        Ok((
            FittedModel::GradientBoosting(model),
            Some(Substitution {
                model: ModelKind::XGBoost,
                requested: Backend::XgboostNative,
                used: Backend::GradientBoosting,
                reason,
            }),
        ))
    }

    /// Fit every configured model on `split.train` and evaluate on `split.test`.
    pub fn train_all(&self, split: &Split, features: &[ProxyKind]) -> Result<TrainingReport> {
        let train = Dataset::from_forecast(&split.train, features)?;
        let test = Dataset::from_forecast(&split.test, features)?;
        train.check_trainable()?;

        info!(
            train = train.len(),
            test = test.len(),
            features = features.len(),
            "Training models"
        );

        let y_test = test.y.to_vec();
        let mut report = TrainingReport::default();
        for &kind in &self.config.models {
            let (model, substitution) = self.train(kind, &train)?;
            let proba = model.predict_proba(test.x.view())?;
            let metrics = evaluate(&y_test, &proba.to_vec(), self.config.threshold)?;

            let feature_importances = model.feature_importances().map(|imp| {
                features
                    .iter()
                    .zip(imp)
                    .map(|(k, v)| (k.name().to_string(), v))
                    .collect()
            });

            info!(
                model = %kind,
                backend = %model.backend(),
                accuracy = metrics.accuracy,
                f1 = metrics.f1,
                auc = ?metrics.auc,
                "Model evaluated"
            );

            report.substitutions.extend(substitution);
            report.models.push(TrainedModel {
                kind,
                backend: model.backend(),
                model,
                metrics,
                train_rows: train.len(),
                test_rows: test.len(),
                feature_importances,
            });
        }
        Ok(report)
    }
}
