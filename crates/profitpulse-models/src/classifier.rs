//! Classifier trait and the closed set of fitted models.

use crate::boosting::GradientBoostingModel;
use crate::error::{ModelError, Result};
use crate::forest::RandomForestModel;
use crate::svm::SvmModel;
#[cfg(feature = "xgboost")]
use crate::xgb::XgbModel;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The classifiers a run can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// RBF support vector machine
    #[serde(rename = "svm_rbf")]
    SvmRbf,
    /// Random forest
    #[serde(rename = "random_forest")]
    RandomForest,
    /// Gradient-boosted trees
    #[serde(rename = "xgboost")]
    XGBoost,
}

impl ModelKind {
    /// All model kinds in report order.
    pub const ALL: [Self; 3] = [Self::SvmRbf, Self::RandomForest, Self::XGBoost];

    /// Stable identifier used in artifacts.
    pub const fn id(&self) -> &'static str {
        match self {
            Self::SvmRbf => "svm_rbf",
            Self::RandomForest => "random_forest",
            Self::XGBoost => "xgboost",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svm" | "svm_rbf" => Ok(Self::SvmRbf),
            "rf" | "random_forest" => Ok(Self::RandomForest),
            "xgb" | "xgboost" => Ok(Self::XGBoost),
            other => Err(ModelError::InvalidParameter(format!("unknown model: {other}"))),
        }
    }
}

/// Implementation that actually produced a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// SMO-trained RBF SVM with Platt scaling
    Svm,
    /// Bagged CART trees
    RandomForest,
    /// Native XGBoost booster
    XgboostNative,
    /// Gradient-boosted regression trees on log-loss
    GradientBoosting,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Svm => "svm",
            Self::RandomForest => "random_forest",
            Self::XgboostNative => "xgboost_native",
            Self::GradientBoosting => "gradient_boosting",
        })
    }
}

/// Binary classifier producing P(label = 1).
pub trait Classifier {
    /// Number of input features.
    fn n_features(&self) -> usize;

    /// Probability of the positive class for each row.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Normalized feature importances, when the model defines them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    /// Reject inputs of the wrong width.
    fn check_width(&self, x: ArrayView2<'_, f64>) -> Result<()> {
        if x.ncols() == self.n_features() {
            Ok(())
        } else {
            Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                actual: x.ncols(),
            })
        }
    }
}

/// A fitted model of any supported family.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FittedModel {
    /// RBF SVM
    Svm(SvmModel),
    /// Random forest
    RandomForest(RandomForestModel),
    /// Native gradient boosting
    GradientBoosting(GradientBoostingModel),
    /// Native XGBoost booster
    #[cfg(feature = "xgboost")]
    Xgboost(XgbModel),
}

impl FittedModel {
    /// Backend of this model.
    pub const fn backend(&self) -> Backend {
        match self {
            Self::Svm(_) => Backend::Svm,
            Self::RandomForest(_) => Backend::RandomForest,
            Self::GradientBoosting(_) => Backend::GradientBoosting,
            #[cfg(feature = "xgboost")]
            Self::Xgboost(_) => Backend::XgboostNative,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::Svm(m) => m,
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            #[cfg(feature = "xgboost")]
            Self::Xgboost(m) => m,
        }
    }
}

impl Classifier for FittedModel {
    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.inner().predict_proba(x)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.inner().feature_importances()
    }
}
