// ============================================================
// Layer 5 — Random Forest
// ============================================================
// Bagged CART trees with per-split feature subsampling.
//
// Training (per tree, independent of every other tree):
//   seed_t   = t-th draw of ChaCha8Rng(forest seed)
//   sample_t = n rows drawn with replacement
//   tree_t   = DecisionTree::fit(sample_t, sqrt(p) features per split)
//
// Prediction: majority vote over trees, ties to the lowest
// label index.
//
// With the `parallel` feature the trees are grown on the rayon
// pool. Each tree owns its RNG, so the forest is identical
// either way.
//
// Reference: Breiman (2001) Random Forests

use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::domain::{error::PipelineError, label::Label, traits::Classifier};
use crate::ml::tree::{DecisionTree, FeatureKind, TreeParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    /// Ensemble size
    pub n_trees:           usize,
    /// Features considered per split; None = floor(sqrt(width))
    pub max_features:      Option<usize>,
    pub min_samples_split: usize,
    pub max_depth:         Option<usize>,
    pub seed:              u64,
}

impl ForestParams {
    pub fn new(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees,
            max_features:      None,
            min_samples_split: 2,
            max_depth:         None,
            seed,
        }
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    fn tree_params(&self, width: usize) -> TreeParams {
        let mut params = TreeParams::for_width(width);
        if let Some(m) = self.max_features {
            params.max_features = m.clamp(1, width.max(1));
        }
        params.min_samples_split = self.min_samples_split;
        params.max_depth         = self.max_depth;
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    width: usize,
}

impl RandomForest {
    /// Train on every row of `x`.
    pub fn fit(
        x:      &Array2<f64>,
        y:      &[Label],
        kinds:  &[FeatureKind],
        params: &ForestParams,
    ) -> Result<Self, PipelineError> {
        if params.n_trees == 0 {
            return Err(PipelineError::Training("ensemble size must be at least 1".into()));
        }
        if x.nrows() == 0 {
            return Err(PipelineError::Training("no training rows".into()));
        }

        let width       = x.ncols();
        let tree_params = params.tree_params(width);

        let mut seeder = ChaCha8Rng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_trees).map(|_| seeder.gen()).collect();

        let trees = grow_trees(&seeds, |seed| grow_one(x, y, kinds, &tree_params, seed))?;

        tracing::trace!(
            "Grew forest of {} trees over {} rows: {} nodes, {} leaves, max depth {}",
            trees.len(),
            x.nrows(),
            trees.iter().map(DecisionTree::node_count).sum::<usize>(),
            trees.iter().map(DecisionTree::leaf_count).sum::<usize>(),
            trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
        );
        Ok(Self { trees, width })
    }

    /// Train on a numeric Dataset.
    pub fn fit_dataset(dataset: &Dataset, params: &ForestParams) -> Result<Self, PipelineError> {
        let kinds = vec![FeatureKind::Numeric; dataset.width()];
        Self::fit(&dataset.matrix(), &dataset.labels(), &kinds, params)
    }

    /// Per-class vote counts for one feature vector
    pub fn votes(&self, features: &[f64]) -> [usize; Label::COUNT] {
        let mut votes = [0usize; Label::COUNT];
        for tree in &self.trees {
            votes[tree.predict(features).index()] += 1;
        }
        votes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[f64]) -> Label {
        Label::argmax(&self.votes(features))
    }
}

fn grow_one(
    x:      &Array2<f64>,
    y:      &[Label],
    kinds:  &[FeatureKind],
    params: &TreeParams,
    seed:   u64,
) -> Result<DecisionTree, PipelineError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n       = x.nrows();
    let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
    DecisionTree::fit(x, y, kinds, &sample, params, &mut rng)
}

#[cfg(feature = "parallel")]
fn grow_trees<F>(seeds: &[u64], grow: F) -> Result<Vec<DecisionTree>, PipelineError>
where
    F: Fn(u64) -> Result<DecisionTree, PipelineError> + Send + Sync,
{
    seeds.par_iter().map(|&s| grow(s)).collect()
}

#[cfg(not(feature = "parallel"))]
fn grow_trees<F>(seeds: &[u64], grow: F) -> Result<Vec<DecisionTree>, PipelineError>
where
    F: Fn(u64) -> Result<DecisionTree, PipelineError>,
{
    seeds.iter().map(|&s| grow(s)).collect()
}

/// Mix a base seed with slot coordinates (fold, candidate size, ...).
/// SplitMix64 finaliser over each part, so nearby inputs diverge.
pub fn derive_seed(base: u64, parts: &[u64]) -> u64 {
    let mut z = base;
    for &p in parts {
        z ^= p.wrapping_add(0x9E37_79B9_7F4A_7C15).wrapping_add(z << 6).wrapping_add(z >> 2);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^= z >> 31;
    }
    z
}
