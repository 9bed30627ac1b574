// ============================================================
// Layer 5 — CART Decision Tree
// ============================================================
// A classification tree grown with Gini impurity, the building
// block of the random forest.
//
// Growing a node:
//   1. Stop if the node is pure, too small, or at max depth
//   2. Visit features in random order; score at least
//      `max_features` of them, and keep going past that only
//      until one non-constant feature has been found
//   3. Pick the split with the largest impurity decrease
//      (first one found wins ties)
//   4. Recurse into both children
//
// Two split shapes:
//   Threshold(t) — numeric feature, left when value <= t
//   Levels(mask) — categorical feature, left when bit `level`
//                  of `mask` is set; unseen levels go right
//
// Nodes live in a flat arena (Vec<Node>) and are grown with an
// explicit work stack, so deep trees never touch the call stack.
//
// Reference: Breiman, Friedman, Olshen & Stone (1984) CART

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::{error::PipelineError, label::Label};

/// Categorical features may have at most this many levels
pub const MAX_LEVELS: usize = 16;

/// How a feature column is interpreted when splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Numeric,
    /// Values are level indices 0..levels stored as f64
    Categorical { levels: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SplitRule {
    Threshold(f64),
    Levels(u32),
}

impl SplitRule {
    fn goes_left(self, value: f64) -> bool {
        match self {
            SplitRule::Threshold(t) => value <= t,
            SplitRule::Levels(mask) => {
                let level = value as i64;
                (0..MAX_LEVELS as i64).contains(&level) && mask & (1u32 << level) != 0
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        label: Label,
    },
    Split {
        feature: usize,
        rule:    SplitRule,
        left:    usize,
        right:   usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    /// Features scored per split before settling
    pub max_features:      usize,
    /// Nodes smaller than this become leaves
    pub min_samples_split: usize,
    pub max_depth:         Option<usize>,
}

impl TreeParams {
    /// Forest defaults for `width` features: sqrt(width) per split, grown to purity
    pub fn for_width(width: usize) -> Self {
        Self {
            max_features:      ((width as f64).sqrt().floor() as usize).max(1),
            min_samples_split: 2,
            max_depth:         None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Candidate split found for one feature
struct Candidate {
    feature: usize,
    rule:    SplitRule,
    /// sum(c_left^2)/n_left + sum(c_right^2)/n_right; larger is purer
    score:   f64,
}

impl DecisionTree {
    /// Grow a tree on the rows of `x` listed in `sample` (duplicates allowed).
    pub fn fit(
        x:      &Array2<f64>,
        y:      &[Label],
        kinds:  &[FeatureKind],
        sample: &[usize],
        params: &TreeParams,
        rng:    &mut ChaCha8Rng,
    ) -> Result<Self, PipelineError> {
        let width = x.ncols();
        if sample.is_empty() {
            return Err(PipelineError::Training("empty training sample".into()));
        }
        if width == 0 {
            return Err(PipelineError::Training("no input features".into()));
        }
        if kinds.len() != width {
            return Err(PipelineError::WidthMismatch { expected: width, actual: kinds.len() });
        }
        if y.len() != x.nrows() {
            return Err(PipelineError::WidthMismatch { expected: x.nrows(), actual: y.len() });
        }
        if let Some(levels) = kinds.iter().find_map(|k| match k {
            FeatureKind::Categorical { levels } if *levels > MAX_LEVELS || *levels == 0 => Some(*levels),
            _ => None,
        }) {
            return Err(PipelineError::Training(format!(
                "categorical feature with {levels} levels (supported: 1..={MAX_LEVELS})"
            )));
        }

        let mut nodes = vec![Node::Leaf { label: Label::A }];
        let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(0, sample.to_vec(), 0)];
        let mut order: Vec<usize> = (0..width).collect();

        while let Some((id, members, depth)) = stack.pop() {
            let counts   = class_counts(y, &members);
            let majority = Label::argmax(&counts);
            let pure     = counts.iter().filter(|&&c| c > 0).count() <= 1;

            let stop = pure
                || members.len() < params.min_samples_split
                || params.max_depth.map_or(false, |d| depth >= d);

            let best = if stop {
                None
            } else {
                order.shuffle(rng);
                best_split(x, y, kinds, &members, &order, params.max_features.max(1))
            };

            let Some(best) = best else {
                nodes[id] = Node::Leaf { label: majority };
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = members
                .iter()
                .copied()
                .partition(|&i| best.rule.goes_left(x[[i, best.feature]]));

            if left.is_empty() || right.is_empty() {
                nodes[id] = Node::Leaf { label: majority };
                continue;
            }

            let left_id  = nodes.len();
            let right_id = left_id + 1;
            nodes.push(Node::Leaf { label: majority });
            nodes.push(Node::Leaf { label: majority });
            nodes[id] = Node::Split {
                feature: best.feature,
                rule:    best.rule,
                left:    left_id,
                right:   right_id,
            };

            stack.push((right_id, right, depth + 1));
            stack.push((left_id, left, depth + 1));
        }

        Ok(Self { nodes })
    }

    pub fn predict(&self, features: &[f64]) -> Label {
        let mut id = 0usize;
        loop {
            match &self.nodes[id] {
                Node::Leaf { label } => return *label,
                Node::Split { feature, rule, left, right } => {
                    let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                    id = if rule.goes_left(value) { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        let mut max   = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, d)) = stack.pop() {
            max = max.max(d);
            if let Node::Split { left, right, .. } = &self.nodes[id] {
                stack.push((*left, d + 1));
                stack.push((*right, d + 1));
            }
        }
        max
    }
}

fn class_counts(y: &[Label], members: &[usize]) -> [usize; Label::COUNT] {
    let mut counts = [0usize; Label::COUNT];
    for &i in members {
        counts[y[i].index()] += 1;
    }
    counts
}

fn sum_squares(counts: &[usize; Label::COUNT]) -> f64 {
    counts.iter().map(|&c| (c * c) as f64).sum()
}

fn best_split(
    x:            &Array2<f64>,
    y:            &[Label],
    kinds:        &[FeatureKind],
    members:      &[usize],
    order:        &[usize],
    max_features: usize,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;

    for (examined, &feature) in order.iter().enumerate() {
        if examined >= max_features && best.is_some() {
            break;
        }
        let found = match kinds[feature] {
            FeatureKind::Numeric => numeric_split(x, y, members, feature),
            FeatureKind::Categorical { levels } => categorical_split(x, y, members, feature, levels),
        };
        if let Some(c) = found {
            if best.as_ref().map_or(true, |b| c.score > b.score) {
                best = Some(c);
            }
        }
    }
    best
}

fn numeric_split(x: &Array2<f64>, y: &[Label], members: &[usize], feature: usize) -> Option<Candidate> {
    let mut pairs: Vec<(f64, usize)> = members
        .iter()
        .map(|&i| (x[[i, feature]], y[i].index()))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    if n < 2 || pairs[0].0 == pairs[n - 1].0 {
        return None;
    }

    let mut right = [0usize; Label::COUNT];
    for &(_, c) in &pairs {
        right[c] += 1;
    }
    let mut left = [0usize; Label::COUNT];

    let mut best: Option<(f64, f64)> = None;
    for i in 0..n - 1 {
        let c = pairs[i].1;
        left[c]  += 1;
        right[c] -= 1;

        if pairs[i].0 == pairs[i + 1].0 {
            continue;
        }
        let n_left  = (i + 1) as f64;
        let n_right = (n - i - 1) as f64;
        let score   = sum_squares(&left) / n_left + sum_squares(&right) / n_right;

        if best.map_or(true, |(s, _)| score > s) {
            let threshold = midpoint(pairs[i].0, pairs[i + 1].0);
            best = Some((score, threshold));
        }
    }

    best.map(|(score, t)| Candidate { feature, rule: SplitRule::Threshold(t), score })
}

/// Threshold strictly below `upper`, so `value <= t` always separates the pair.
/// Halving first keeps huge ranges finite; adjacent doubles fall back to `lower`.
fn midpoint(lower: f64, upper: f64) -> f64 {
    let mid = lower / 2.0 + upper / 2.0;
    if mid.is_finite() && mid >= lower && mid < upper {
        mid
    } else {
        lower
    }
}

fn categorical_split(
    x:       &Array2<f64>,
    y:       &[Label],
    members: &[usize],
    feature: usize,
    levels:  usize,
) -> Option<Candidate> {
    let mut per_level = vec![[0usize; Label::COUNT]; levels];
    for &i in members {
        let level = x[[i, feature]] as usize;
        if level < levels {
            per_level[level][y[i].index()] += 1;
        }
    }

    let present = per_level.iter().filter(|c| c.iter().any(|&v| v > 0)).count();
    if present < 2 {
        return None;
    }

    let mut best: Option<Candidate> = None;

    // Every bipartition once: the last level always starts on the right.
    for mask in 1u32..(1u32 << (levels - 1)) {
        let mut left  = [0usize; Label::COUNT];
        let mut right = [0usize; Label::COUNT];
        for (level, counts) in per_level.iter().enumerate() {
            let side = if mask & (1 << level) != 0 { &mut left } else { &mut right };
            for (s, c) in side.iter_mut().zip(counts) {
                *s += c;
            }
        }

        let n_left: usize  = left.iter().sum();
        let n_right: usize = right.iter().sum();
        if n_left == 0 || n_right == 0 {
            continue;
        }

        let score = sum_squares(&left) / n_left as f64 + sum_squares(&right) / n_right as f64;
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Candidate { feature, rule: SplitRule::Levels(mask), score });
        }
    }
    best
}
