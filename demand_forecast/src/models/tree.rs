//! Least-squares regression trees grown leaf-wise
//!
//! Split finding is exact: for every candidate feature the rows of a leaf
//! are sorted by value and every boundary between distinct values is
//! scored with the second-order gain. Thresholds sit halfway between the two
//! neighbouring values and `value <= threshold` goes left. Candidate
//! features are searched in parallel.

use rayon::prelude::*;
use std::cmp::Ordering;

/// Index of a node inside a [`Tree`]
pub type NodeId = u32;

/// Child index of a leaf
pub const NO_CHILD: NodeId = u32::MAX;

/// A split or a leaf
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Feature tested by a split
    pub feature: usize,
    /// `value <= threshold` goes left
    pub threshold: f64,
    /// Direction taken by a missing value
    pub default_left: bool,
    pub left: NodeId,
    pub right: NodeId,
    /// Leaf output, already scaled by the learning rate
    pub value: f64,
    pub is_leaf: bool,
}

impl TreeNode {
    fn leaf(value: f64) -> Self {
        Self {
            feature: 0,
            threshold: 0.0,
            default_left: true,
            left: NO_CHILD,
            right: NO_CHILD,
            value,
            is_leaf: true,
        }
    }
}

/// Regularization and size limits for one tree
#[derive(Debug, Clone, PartialEq)]
pub struct GainParams {
    /// L2 penalty on leaf weights
    pub reg_lambda: f64,
    /// Minimum gain for a split to be kept
    pub min_gain: f64,
    /// Minimum rows in each child
    pub min_samples_leaf: usize,
}

impl Default for GainParams {
    fn default() -> Self {
        Self {
            reg_lambda: 0.0,
            min_gain: 0.0,
            min_samples_leaf: 20,
        }
    }
}

impl GainParams {
    /// `0.5 * [GL^2/(HL+l) + GR^2/(HR+l) - GP^2/(HP+l)]`
    pub fn compute_gain(
        &self,
        grad_left: f64,
        hess_left: f64,
        grad_right: f64,
        hess_right: f64,
    ) -> f64 {
        let score = |g: f64, h: f64| g * g / (h + self.reg_lambda);
        let parent = score(grad_left + grad_right, hess_left + hess_right);
        0.5 * (score(grad_left, hess_left) + score(grad_right, hess_right) - parent)
    }

    /// Newton step `-G / (H + lambda)`
    pub fn compute_leaf_weight(&self, grad_sum: f64, hess_sum: f64) -> f64 {
        let denominator = hess_sum + self.reg_lambda;
        if denominator <= 0.0 {
            return 0.0;
        }
        -grad_sum / denominator
    }
}

/// Limits on the shape of a grown tree
#[derive(Debug, Clone, PartialEq)]
pub struct GrowerParams {
    pub gain: GainParams,
    pub learning_rate: f64,
    pub max_leaves: usize,
    /// `None` leaves depth unbounded
    pub max_depth: Option<usize>,
}

impl Default for GrowerParams {
    fn default() -> Self {
        Self {
            gain: GainParams::default(),
            learning_rate: 0.1,
            max_leaves: 31,
            max_depth: None,
        }
    }
}

/// A trained regression tree, root at index 0
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Get the nodes in creation order
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Get the number of leaves
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    /// Output for one row.
    ///
    /// A feature index past the end of `row`, or a NaN, is treated as
    /// missing and follows `default_left`.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut node = &self.nodes[0];
        while !node.is_leaf {
            let value = row.get(node.feature).copied().unwrap_or(f64::NAN);
            let go_left = if value.is_nan() {
                node.default_left
            } else {
                value <= node.threshold
            };
            let next = if go_left { node.left } else { node.right };
            node = &self.nodes[next as usize];
        }
        node.value
    }
}

/// Best split found for one leaf
#[derive(Debug, Clone, PartialEq)]
struct SplitInfo {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// A leaf that may still be split
#[derive(Debug)]
struct Candidate {
    node: NodeId,
    rows: Vec<usize>,
    depth: usize,
    split: Option<SplitInfo>,
}

/// Grow one tree on `rows` of a row-major feature matrix.
///
/// Only the columns in `features` are considered for splits. Leaves are
/// expanded best-gain first until `max_leaves` is reached or no leaf has a
/// split with positive gain above `min_gain`.
pub fn grow_tree(
    data: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    rows: Vec<usize>,
    features: &[usize],
    params: &GrowerParams,
) -> Tree {
    let leaf_value = |rows: &[usize]| {
        let (g, h) = sums(grad, hess, rows);
        params.learning_rate * params.gain.compute_leaf_weight(g, h)
    };

    let mut nodes = vec![TreeNode::leaf(leaf_value(&rows))];
    let root_split = find_split(data, grad, hess, &rows, features, params, 0);
    let mut open = vec![Candidate {
        node: 0,
        rows,
        depth: 0,
        split: root_split,
    }];
    let mut n_leaves = 1;

    while n_leaves < params.max_leaves {
        let best = open
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.split.as_ref().map(|s| (i, s.gain)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal).then(b.0.cmp(&a.0)));
        let Some((index, _)) = best else {
            break;
        };

        let candidate = open.swap_remove(index);
        let Some(split) = candidate.split else {
            break;
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = candidate
            .rows
            .iter()
            .partition(|&&r| data[r][split.feature] <= split.threshold);

        let left_id = nodes.len() as NodeId;
        let right_id = left_id + 1;
        nodes.push(TreeNode::leaf(leaf_value(&left_rows)));
        nodes.push(TreeNode::leaf(leaf_value(&right_rows)));

        let parent = &mut nodes[candidate.node as usize];
        parent.feature = split.feature;
        parent.threshold = split.threshold;
        parent.default_left = left_rows.len() >= right_rows.len();
        parent.left = left_id;
        parent.right = right_id;
        parent.is_leaf = false;
        n_leaves += 1;

        let depth = candidate.depth + 1;
        for (node, rows) in [(left_id, left_rows), (right_id, right_rows)] {
            let split = find_split(data, grad, hess, &rows, features, params, depth);
            open.push(Candidate {
                node,
                rows,
                depth,
                split,
            });
        }
    }

    Tree { nodes }
}

fn sums(grad: &[f64], hess: &[f64], rows: &[usize]) -> (f64, f64) {
    rows.iter()
        .fold((0.0, 0.0), |(g, h), &r| (g + grad[r], h + hess[r]))
}

fn find_split(
    data: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    features: &[usize],
    params: &GrowerParams,
    depth: usize,
) -> Option<SplitInfo> {
    if params.max_depth.is_some_and(|max| depth >= max) {
        return None;
    }
    if rows.len() < 2 * params.gain.min_samples_leaf.max(1) {
        return None;
    }

    features
        .par_iter()
        .filter_map(|&feature| best_split_for_feature(data, grad, hess, rows, feature, &params.gain))
        .max_by(|a, b| {
            a.gain
                .partial_cmp(&b.gain)
                .unwrap_or(Ordering::Equal)
                .then(b.feature.cmp(&a.feature))
        })
}

fn best_split_for_feature(
    data: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    feature: usize,
    gain: &GainParams,
) -> Option<SplitInfo> {
    let mut sorted: Vec<(f64, f64, f64)> = rows
        .iter()
        .map(|&r| (data[r][feature], grad[r], hess[r]))
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (grad_total, hess_total) = sorted
        .iter()
        .fold((0.0, 0.0), |(g, h), x| (g + x.1, h + x.2));
    let min_rows = gain.min_samples_leaf.max(1);

    let mut best: Option<SplitInfo> = None;
    let (mut grad_left, mut hess_left) = (0.0, 0.0);
    for i in 0..sorted.len() - 1 {
        grad_left += sorted[i].1;
        hess_left += sorted[i].2;

        let count_left = i + 1;
        if count_left < min_rows || sorted.len() - count_left < min_rows {
            continue;
        }
        if sorted[i].0 == sorted[i + 1].0 {
            continue;
        }

        let score = gain.compute_gain(
            grad_left,
            hess_left,
            grad_total - grad_left,
            hess_total - hess_left,
        );
        if score > gain.min_gain && best.as_ref().map_or(true, |b| score > b.gain) {
            best = Some(SplitInfo {
                feature,
                threshold: sorted[i].0 + (sorted[i + 1].0 - sorted[i].0) / 2.0,
                gain: score,
            });
        }
    }
    best
}
