//! Binary CART classifier with Gini impurity.
//!
//! Nodes live in a flat arena; children are referenced by index. Leaves store
//! the fraction of positive samples that reached them, which is the tree's
//! positive-class probability.

use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features sampled at each split.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        probability: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Fitted decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
    /// Unnormalized total Gini decrease per feature.
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

impl DecisionTree {
    /// Grow a tree over the rows of `x` listed in `samples` (repeats allowed).
    #[must_use]
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            n_features: x.ncols(),
            importances: vec![0.0; x.ncols()],
        };
        tree.grow(x, y, samples, 0, params, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[u8],
        samples: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| y[i] == 1).count();
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            probability: if n == 0 { 0.0 } else { positives as f64 / n as f64 },
            n_samples: n,
        });

        let pure = positives == 0 || positives == n;
        if pure || depth >= params.max_depth || n < params.min_samples_split {
            return node_id;
        }

        let Some(split) = self.best_split(x, y, &samples, params, rng) else {
            return node_id;
        };

        let parent = n as f64 * gini(positives, n);
        self.importances[split.feature] += parent - split.impurity;

        let left = self.grow(x, y, split.left, depth + 1, params, rng);
        let right = self.grow(x, y, split.right, depth + 1, params, rng);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Search a random feature subset. As in CART implementations, the search
    /// continues past `max_features` until at least one valid partition exists.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &[u8],
        samples: &[usize],
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(rng);

        let n = samples.len();
        let total_pos = samples.iter().filter(|&&i| y[i] == 1).count();
        let min_leaf = params.min_samples_leaf.max(1);

        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = samples.to_vec();

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= params.max_features && best.is_some() {
                break;
            }

            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_n = 0;
            let mut left_pos = 0;
            for k in 0..n - 1 {
                left_n += 1;
                if y[sorted[k]] == 1 {
                    left_pos += 1;
                }
                let here = x[[sorted[k], feature]];
                let next = x[[sorted[k + 1], feature]];
                if here >= next {
                    continue;
                }
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let impurity = left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(total_pos - left_pos, right_n);
                if best.map_or(true, |(_, _, b)| impurity < b) {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some((feature, threshold, impurity));
                }
            }
        }

        let (feature, threshold, impurity) = best?;
        let (left, right) = samples
            .iter()
            .partition(|&&i| x[[i, feature]] <= threshold);
        Some(SplitCandidate {
            feature,
            threshold,
            impurity,
            left,
            right,
        })
    }

    /// Positive-class probability for one row.
    #[must_use]
    pub fn predict_proba_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { probability, .. } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn test_separable_data_is_fit_exactly() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [10.0, 0.0], [11.0, 0.0], [12.0, 0.0]];
        let y = [0, 0, 0, 1, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let tree = DecisionTree::fit(&x, &y, (0..6).collect(), &params(5), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert!(tree.predict_proba_row(array![2.5, 0.0].view()) < 0.5);
        assert!(tree.predict_proba_row(array![11.5, 0.0].view()) > 0.5);
        assert!(tree.importances()[0] > 0.0);
        assert!(tree.importances()[1].abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = Array2::from_shape_fn((16, 1), |(i, _)| i as f64);
        let y: Vec<u8> = (0..16).map(|i| (i % 2) as u8).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, (0..16).collect(), &params(2), &mut rng);
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_leaf_probability_is_class_fraction() {
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let y = [1, 0, 1, 1];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, (0..4).collect(), &params(5), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        assert!((tree.predict_proba_row(array![1.0].view()) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = [1, 0, 0, 0, 0];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let p = TreeParams {
            min_samples_leaf: 2,
            ..params(5)
        };
        let tree = DecisionTree::fit(&x, &y, (0..5).collect(), &p, &mut rng);
        for node in &tree.nodes {
            if let Node::Leaf { n_samples, .. } = node {
                assert!(*n_samples >= 2);
            }
        }
    }

    #[test]
    fn test_gini() {
        assert!(gini(0, 10).abs() < f64::EPSILON);
        assert!((gini(5, 10) - 0.5).abs() < f64::EPSILON);
    }
}
