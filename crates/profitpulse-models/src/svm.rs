//! RBF support vector classifier
//!
//! Dual soft-margin SVM solved with SMO using the maximal-violating-pair
//! working set, per-class penalties for balanced weighting, and Platt
//! scaling of the decision values into probabilities. Features are
//! standardized by a scaler fit on the training matrix only.

use crate::classifier::Classifier;
use crate::config::{Gamma, SvmConfig};
use crate::dataset::Dataset;
use crate::error::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use profitpulse_score::StandardScaler;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TAU: f64 = 1e-12;

fn rbf(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>, gamma: f64) -> f64 {
    let d2: f64 = a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum();
    (-gamma * d2).exp()
}

/// Sigmoid fit `P(y = 1 | f) = 1 / (1 + exp(A f + B))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    /// Slope
    pub a: f64,
    /// Intercept
    pub b: f64,
}

impl PlattScaling {
    /// Fit on decision values and 0/1 labels (Newton method with
    /// backtracking on regularized targets).
    pub fn fit(decision: &[f64], labels: &[u8]) -> Self {
        let prior1 = labels.iter().filter(|l| **l == 1).count() as f64;
        let prior0 = labels.len() as f64 - prior1;

        let hi = (prior1 + 1.0) / (prior1 + 2.0);
        let lo = 1.0 / (prior0 + 2.0);
        let t: Vec<f64> = labels.iter().map(|l| if *l == 1 { hi } else { lo }).collect();

        let objective = |a: f64, b: f64| -> f64 {
            decision
                .iter()
                .zip(&t)
                .map(|(f, ti)| {
                    let fab = f * a + b;
                    if fab >= 0.0 {
                        ti * fab + (-fab).exp().ln_1p()
                    } else {
                        (ti - 1.0) * fab + fab.exp().ln_1p()
                    }
                })
                .sum()
        };

        let (max_iter, min_step, sigma) = (100, 1e-10, 1e-12);
        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..max_iter {
            let (mut h11, mut h22, mut h21, mut g1, mut g2) = (sigma, sigma, 0.0, 0.0, 0.0);
            for (f, ti) in decision.iter().zip(&t) {
                let fab = f * a + b;
                let (p, q) = if fab >= 0.0 {
                    let e = (-fab).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = fab.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = ti - p;
                g1 += f * d1;
                g2 += d1;
            }
            if g1.abs() < 1e-5 && g2.abs() < 1e-5 {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= min_step {
                let (na, nb) = (a + step * da, b + step * db);
                let nf = objective(na, nb);
                if nf < fval + 1e-4 * step * gd {
                    (a, b, fval) = (na, nb, nf);
                    break;
                }
                step /= 2.0;
            }
            if step < min_step {
                debug!("platt line search did not converge");
                break;
            }
        }

        Self { a, b }
    }

    /// Probability of class 1 for a decision value.
    pub fn probability(&self, decision: f64) -> f64 {
        let fab = decision * self.a + self.b;
        if fab >= 0.0 {
            let e = (-fab).exp();
            e / (1.0 + e)
        } else {
            1.0 / (1.0 + fab.exp())
        }
    }
}

/// A fitted RBF SVM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
    /// Feature scaler fit on the training matrix
    pub scaler: StandardScaler,
    /// Scaled support vectors
    pub support_vectors: Array2<f64>,
    /// `alpha_i * y_i` per support vector
    pub dual_coef: Vec<f64>,
    /// Decision offset
    pub rho: f64,
    /// RBF kernel width
    pub gamma: f64,
    /// Probability calibration
    pub platt: PlattScaling,
}

struct Solution {
    alpha: Vec<f64>,
    rho: f64,
    iterations: usize,
}

/// SMO on the dual `min 0.5 a'Qa - e'a, 0 <= a_i <= C_i, y'a = 0`.
fn smo(
    x: ArrayView2<'_, f64>,
    y: &[f64],
    cost: &[f64],
    gamma: f64,
    config: &SvmConfig,
) -> Solution {
    let n = y.len();
    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];
    let q_row = |i: usize| -> Vec<f64> {
        (0..n)
            .map(|k| y[i] * y[k] * rbf(x.row(i), x.row(k), gamma))
            .collect()
    };

    let is_upper = |t: usize, a: &[f64]| a[t] >= cost[t];
    let is_lower = |t: usize, a: &[f64]| a[t] <= 0.0;

    let mut iterations = 0;
    while iterations < config.max_iterations {
        // Maximal violating pair
        let mut g_max = f64::NEG_INFINITY;
        let mut g_min = f64::INFINITY;
        let (mut i, mut j) = (usize::MAX, usize::MAX);
        for t in 0..n {
            let up = if y[t] > 0.0 { !is_upper(t, &alpha) } else { !is_lower(t, &alpha) };
            let low = if y[t] > 0.0 { !is_lower(t, &alpha) } else { !is_upper(t, &alpha) };
            let v = -y[t] * grad[t];
            if up && v >= g_max {
                g_max = v;
                i = t;
            }
            if low && v <= g_min {
                g_min = v;
                j = t;
            }
        }
        if i == usize::MAX || j == usize::MAX || g_max - g_min < config.tolerance {
            break;
        }
        iterations += 1;

        let qi = q_row(i);
        let qj = q_row(j);
        let (ci, cj) = (cost[i], cost[j]);
        let (old_i, old_j) = (alpha[i], alpha[j]);

        if y[i] != y[j] {
            let quad = (qi[i] + qj[j] + 2.0 * qi[j]).max(TAU);
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > ci - cj {
                if alpha[i] > ci {
                    alpha[i] = ci;
                    alpha[j] = ci - diff;
                }
            } else if alpha[j] > cj {
                alpha[j] = cj;
                alpha[i] = cj + diff;
            }
        } else {
            let quad = (qi[i] + qj[j] - 2.0 * qi[j]).max(TAU);
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > ci {
                if alpha[i] > ci {
                    alpha[i] = ci;
                    alpha[j] = sum - ci;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > cj {
                if alpha[j] > cj {
                    alpha[j] = cj;
                    alpha[i] = sum - cj;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (dai, daj) = (alpha[i] - old_i, alpha[j] - old_j);
        for k in 0..n {
            grad[k] += qi[k] * dai + qj[k] * daj;
        }
    }

    if iterations >= config.max_iterations {
        warn!(iterations, "SMO reached the iteration cap");
    }

    // Offset: average over free vectors, else midpoint of the feasible range
    let (mut ub, mut lb) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut free, mut sum_free) = (0usize, 0.0);
    for t in 0..n {
        let yg = y[t] * grad[t];
        if is_upper(t, &alpha) {
            if y[t] < 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else if is_lower(t, &alpha) {
            if y[t] > 0.0 {
                ub = ub.min(yg);
            } else {
                lb = lb.max(yg);
            }
        } else {
            free += 1;
            sum_free += yg;
        }
    }
    let rho = if free > 0 {
        sum_free / free as f64
    } else {
        (ub + lb) / 2.0
    };

    Solution {
        alpha,
        rho,
        iterations,
    }
}

impl SvmModel {
    /// Train on a dataset.
    pub fn fit(data: &Dataset, config: &SvmConfig) -> Result<Self> {
        data.check_trainable()?;

        let scaler = StandardScaler::fit(data.x.view())?;
        let xs = scaler.transform(data.x.view())?;

        let gamma = match config.gamma {
            Gamma::Value(g) => g,
            Gamma::Scale => {
                let var = xs.var(0.0);
                if var > 0.0 {
                    1.0 / (xs.ncols() as f64 * var)
                } else {
                    1.0
                }
            }
        };

        let weights = data.class_weights(config.balanced);
        let y: Vec<f64> = data.y.iter().map(|l| if *l == 1 { 1.0 } else { -1.0 }).collect();
        let cost: Vec<f64> = data
            .y
            .iter()
            .map(|l| config.c * weights[usize::from(*l)])
            .collect();

        let solution = smo(xs.view(), &y, &cost, gamma, config);

        let support: Vec<usize> = (0..y.len()).filter(|&t| solution.alpha[t] > 0.0).collect();
        let support_vectors = xs.select(Axis(0), &support);
        let dual_coef: Vec<f64> = support.iter().map(|&t| solution.alpha[t] * y[t]).collect();

        let mut model = Self {
            scaler,
            support_vectors,
            dual_coef,
            rho: solution.rho,
            gamma,
            platt: PlattScaling { a: 0.0, b: 0.0 },
        };

        let decision = model.decision_scaled(xs.view());
        let labels = data.y.to_vec();
        model.platt = PlattScaling::fit(&decision.to_vec(), &labels);

        debug!(
            support = model.dual_coef.len(),
            iterations = solution.iterations,
            gamma,
            rho = model.rho,
            "svm fit"
        );
        Ok(model)
    }

    fn decision_scaled(&self, xs: ArrayView2<'_, f64>) -> Array1<f64> {
        xs.rows()
            .into_iter()
            .map(|row| {
                self.support_vectors
                    .rows()
                    .into_iter()
                    .zip(&self.dual_coef)
                    .map(|(sv, coef)| coef * rbf(sv, row, self.gamma))
                    .sum::<f64>()
                    - self.rho
            })
            .collect()
    }

    /// Signed distance to the margin for raw (unscaled) rows.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(x)?;
        let xs = self.scaler.transform(x)?;
        Ok(self.decision_scaled(xs.view()))
    }
}

impl Classifier for SvmModel {
    fn n_features(&self) -> usize {
        self.scaler.width()
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let decision = self.decision_function(x)?;
        Ok(decision.mapv(|f| self.platt.probability(f)))
    }
}
