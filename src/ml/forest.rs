//! Random forest of Gini-split decision trees with bootstrap sampling and a
//! random sqrt-sized feature subset per split. The forest probability is the
//! mean of per-tree leaf positive fractions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{check_training_set, BinaryClassifier, FitError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self { n_trees: 200, max_depth: None, min_samples_split: 2, seed: 42 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        prob: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DecisionTree {
    root: TreeNode,
}

impl DecisionTree {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { prob } => return *prob,
                TreeNode::Split { feature, threshold, left, right } => {
                    node = if features[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    params: RandomForestParams,
}

impl RandomForest {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &RandomForestParams) -> Result<Self, FitError> {
        let width = check_training_set(x, y)?;
        if params.n_trees == 0 {
            return Err(FitError::Empty);
        }
        let mut rng = StdRng::seed_from_u64(params.seed);
        let max_features = (width as f64).sqrt().ceil() as usize;
        let max_features = max_features.clamp(1, width);

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample: Vec<usize> =
                    (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect();
                let root = grow(x, y, &sample, 0, max_features, params, &mut rng);
                DecisionTree { root }
            })
            .collect();

        Ok(Self { trees, params: params.clone() })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl BinaryClassifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        total / self.trees.len() as f64
    }
}

fn grow(
    x: &[Vec<f64>],
    y: &[u8],
    indices: &[usize],
    depth: usize,
    max_features: usize,
    params: &RandomForestParams,
    rng: &mut StdRng,
) -> TreeNode {
    let positives = indices.iter().filter(|&&i| y[i] == 1).count();
    let prob = positives as f64 / indices.len() as f64;

    let at_depth_limit = params.max_depth.is_some_and(|limit| depth >= limit);
    if positives == 0
        || positives == indices.len()
        || indices.len() < params.min_samples_split
        || at_depth_limit
    {
        return TreeNode::Leaf { prob };
    }

    let parent_gini = gini(positives, indices.len());
    let Some((feature, threshold)) =
        best_split(x, y, indices, max_features, parent_gini, rng)
    else {
        return TreeNode::Leaf { prob };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| x[i][feature] <= threshold);

    // Degenerate partitions cannot happen with midpoint thresholds, but guard
    // against float edge cases anyway.
    if left_idx.is_empty() || right_idx.is_empty() {
        return TreeNode::Leaf { prob };
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(grow(x, y, &left_idx, depth + 1, max_features, params, rng)),
        right: Box::new(grow(x, y, &right_idx, depth + 1, max_features, params, rng)),
    }
}

/// Scan a random feature subset for the split with the lowest weighted Gini
/// impurity; returns `None` when nothing beats the parent node.
fn best_split(
    x: &[Vec<f64>],
    y: &[u8],
    indices: &[usize],
    max_features: usize,
    parent_gini: f64,
    rng: &mut StdRng,
) -> Option<(usize, f64)> {
    let width = x[0].len();
    let features = rand::seq::index::sample(rng, width, max_features.min(width)).into_vec();

    let n = indices.len();
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in features {
        let mut column: Vec<(f64, u8)> =
            indices.iter().map(|&i| (x[i][feature], y[i])).collect();
        column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_pos = 0usize;
        let mut left_n = 0usize;
        let total_pos = column.iter().filter(|(_, label)| *label == 1).count();

        for i in 0..n - 1 {
            left_n += 1;
            if column[i].1 == 1 {
                left_pos += 1;
            }
            // Only split between distinct values.
            if column[i].0 == column[i + 1].0 {
                continue;
            }
            let right_n = n - left_n;
            let right_pos = total_pos - left_pos;
            let weighted = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(right_pos, right_n))
                / n as f64;
            if weighted < parent_gini - 1e-12
                && best.map_or(true, |(_, _, current)| weighted < current)
            {
                let threshold = (column[i].0 + column[i + 1].0) / 2.0;
                best = Some((feature, threshold, weighted));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}
