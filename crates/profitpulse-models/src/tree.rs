//! Weighted CART regression trees
//!
//! Shared by the random forest (fit on 0/1 targets, where weighted variance
//! reduction is the Gini criterion up to a constant) and the gradient
//! booster (fit on log-loss residuals, leaves rewritten with Newton steps).

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    /// Depth limit; unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
    /// Features examined per split; all when `None`
    pub max_features: Option<usize>,
}

/// Tree node; children are indices into the node vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Terminal node
    Leaf {
        /// Prediction
        value: f64,
    },
    /// Internal node; rows with `x[feature] <= threshold` go left
    Split {
        /// Feature index
        feature: usize,
        /// Split threshold
        threshold: f64,
        /// Left child
        left: usize,
        /// Right child
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

struct Sums {
    weight: f64,
    wy: f64,
    wyy: f64,
}

impl Sums {
    fn of(indices: &[usize], target: &[f64], weights: &[f64]) -> Self {
        let mut s = Self {
            weight: 0.0,
            wy: 0.0,
            wyy: 0.0,
        };
        for &i in indices {
            s.add(target[i], weights[i]);
        }
        s
    }

    fn add(&mut self, y: f64, w: f64) {
        self.weight += w;
        self.wy += w * y;
        self.wyy += w * y * y;
    }

    /// Weighted sum of squared deviations from the weighted mean.
    fn sse(&self) -> f64 {
        if self.weight <= 0.0 {
            0.0
        } else {
            (self.wyy - self.wy * self.wy / self.weight).max(0.0)
        }
    }

    fn mean(&self) -> f64 {
        if self.weight <= 0.0 {
            0.0
        } else {
            self.wy / self.weight
        }
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct Builder<'a> {
    x: ArrayView2<'a, f64>,
    target: &'a [f64],
    weights: &'a [f64],
    params: TreeParams,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl Builder<'_> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let sums = Sums::of(&indices, self.target, self.weights);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { value: sums.mean() });

        let depth_ok = self.params.max_depth.is_none_or(|d| depth < d);
        let min_leaf = self.params.min_samples_leaf.max(1);
        if !depth_ok || indices.len() < 2 * min_leaf || sums.sse() <= 1e-12 {
            return id;
        }

        let Some(best) = self.best_split(&indices, &sums, rng) else {
            return id;
        };

        self.importances[best.feature] += best.decrease;
        let left = self.grow(best.left, depth + 1, rng);
        let right = self.grow(best.right, depth + 1, rng);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&self, indices: &[usize], parent: &Sums, rng: &mut StdRng) -> Option<BestSplit> {
        let p = self.x.ncols();
        let mut features: Vec<usize> = (0..p).collect();
        if let Some(k) = self.params.max_features
            && k < p
        {
            features.shuffle(rng);
            features.truncate(k.max(1));
        }

        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_sse = parent.sse();
        let mut best: Option<(usize, f64, f64)> = None;

        let mut order = indices.to_vec();
        for &f in &features {
            order.sort_by(|&a, &b| self.x[[a, f]].total_cmp(&self.x[[b, f]]));

            let mut left = Sums {
                weight: 0.0,
                wy: 0.0,
                wyy: 0.0,
            };
            for pos in 0..order.len() - 1 {
                let i = order[pos];
                left.add(self.target[i], self.weights[i]);

                let n_left = pos + 1;
                if n_left < min_leaf || order.len() - n_left < min_leaf {
                    continue;
                }
                let (v, next) = (self.x[[i, f]], self.x[[order[pos + 1], f]]);
                if next <= v {
                    continue;
                }

                let right = Sums {
                    weight: parent.weight - left.weight,
                    wy: parent.wy - left.wy,
                    wyy: parent.wyy - left.wyy,
                };
                let decrease = parent_sse - left.sse() - right.sse();
                if decrease > best.map_or(1e-12, |(_, _, d)| d) {
                    best = Some((f, v + (next - v) / 2.0, decrease));
                }
            }
        }

        let (feature, threshold, decrease) = best?;
        let (left, right) = indices
            .iter()
            .copied()
            .partition(|&i| self.x[[i, feature]] <= threshold);
        Some(BestSplit {
            feature,
            threshold,
            decrease,
            left,
            right,
        })
    }
}

impl RegressionTree {
    /// Fit a tree on the rows in `indices`.
    ///
    /// # Arguments
    /// * `x` - Full feature matrix
    /// * `target` - Target per row of `x`
    /// * `weights` - Sample weight per row of `x`
    /// * `indices` - Rows participating in this tree
    /// * `params` - Growth limits
    /// * `rng` - Source for per-split feature sampling
    ///
    /// # Returns
    /// * The tree and its unnormalized impurity decrease per feature
    pub fn fit<'a>(
        x: ArrayView2<'a, f64>,
        target: &'a [f64],
        weights: &'a [f64],
        indices: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> (Self, Vec<f64>) {
        let mut builder = Builder {
            x,
            target,
            weights,
            params,
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        };
        builder.grow(indices, 0, rng);
        let tree = Self {
            nodes: builder.nodes,
            n_features: x.ncols(),
        };
        (tree, builder.importances)
    }

    /// Number of input features.
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    /// Nodes in construction order; the root is node 0.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Index of the leaf reached by `row`.
    pub fn leaf_index(&self, row: ArrayView1<'_, f64>) -> usize {
        let mut id = 0;
        while let Some(Node::Split {
            feature,
            threshold,
            left,
            right,
        }) = self.nodes.get(id)
        {
            id = if row[*feature] <= *threshold {
                *left
            } else {
                *right
            };
        }
        id
    }

    /// Prediction for one row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self.nodes.get(self.leaf_index(row)) {
            Some(Node::Leaf { value }) => *value,
            _ => 0.0,
        }
    }

    /// Overwrite the value of a leaf. Non-leaf indices are ignored.
    pub fn set_leaf_value(&mut self, id: usize, new_value: f64) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(id) {
            *value = new_value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    #[test]
    fn test_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let w = [1.0; 6];
        let mut rng = StdRng::seed_from_u64(0);

        let (tree, imp) =
            RegressionTree::fit(x.view(), &y, &w, (0..6).collect(), params(), &mut rng);

        assert_eq!(tree.nodes().len(), 3);
        assert_abs_diff_eq!(tree.predict_row(array![2.5].view()), 0.0);
        assert_abs_diff_eq!(tree.predict_row(array![9.0].view()), 1.0);
        assert_abs_diff_eq!(imp[0], 1.5, epsilon = 1e-12);
        match &tree.nodes()[0] {
            Node::Split { threshold, .. } => assert_abs_diff_eq!(*threshold, 6.5),
            Node::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn test_weighted_leaf_mean() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = [0.0, 1.0, 1.0];
        let w = [2.0, 1.0, 0.0];
        let mut rng = StdRng::seed_from_u64(0);

        let (tree, _) = RegressionTree::fit(x.view(), &y, &w, vec![0, 1, 2], params(), &mut rng);
        assert_eq!(tree.nodes().len(), 1);
        assert_abs_diff_eq!(tree.predict_row(array![1.0].view()), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_depth_and_leaf_limits() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 1.0, 0.0, 1.0];
        let w = [1.0; 4];
        let mut rng = StdRng::seed_from_u64(0);

        let stump = TreeParams {
            max_depth: Some(1),
            ..params()
        };
        let (tree, _) = RegressionTree::fit(x.view(), &y, &w, (0..4).collect(), stump, &mut rng);
        assert_eq!(tree.nodes().len(), 3);

        let wide = TreeParams {
            min_samples_leaf: 3,
            ..params()
        };
        let (tree, _) = RegressionTree::fit(x.view(), &y, &w, (0..4).collect(), wide, &mut rng);
        assert_eq!(tree.nodes().len(), 1);
    }

    #[test]
    fn test_set_leaf_value() {
        let x = array![[1.0], [5.0]];
        let y = [0.0, 1.0];
        let mut rng = StdRng::seed_from_u64(0);
        let (mut tree, _) =
            RegressionTree::fit(x.view(), &y, &[1.0, 1.0], vec![0, 1], params(), &mut rng);

        let leaf = tree.leaf_index(array![5.0].view());
        tree.set_leaf_value(leaf, 42.0);
        assert_eq!(tree.predict_row(array![5.0].view()), 42.0);
        // Root is a split; writing to it is a no-op.
        tree.set_leaf_value(0, 7.0);
        assert_eq!(tree.predict_row(array![1.0].view()), 0.0);
    }
}
