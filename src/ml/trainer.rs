// ============================================================
// Layer 5 — Fold Trainer
// ============================================================
// Produces one BaseClassifier (FoldModel) per stratified fold.
//
// For fold i:
//   tr = members of fold i            (training signal)
//   ts = members of every other fold  (selection signal)
//
//   for size in candidate_sizes (50, 75, 100, 150, 200):
//       forest = RandomForest(size trees) trained on tr
//       score  = accuracy of forest on ts
//   keep the best score; ties go to the earlier size
//
// ts is shared between folds, so the check accuracy is an
// optimistic in-training number, not an out-of-sample estimate.
//
// Every (fold, size) slot seeds its forest with
// derive_seed(seed, [fold, size]), so results do not depend on
// the order slots run in. With the `parallel` feature folds
// train concurrently; each writes only its own FoldModel.

use ndarray::{Array2, Axis};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{dataset::Dataset, splitter::stratified_folds};
use crate::domain::{error::PipelineError, label::Label, traits::Classifier};
use crate::ml::{
    forest::{derive_seed, ForestParams, RandomForest},
    scoring::{accuracy, predict_matrix},
    tree::FeatureKind,
};

/// Ensemble sizes tried for every fold, in tie-break order
pub const DEFAULT_CANDIDATE_SIZES: [usize; 5] = [50, 75, 100, 150, 200];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldConfig {
    /// k — number of stratified folds
    pub folds:           usize,
    pub candidate_sizes: Vec<usize>,
    /// Features per split; None = floor(sqrt(width))
    pub max_features:    Option<usize>,
    /// Seeds both the fold assignment and every candidate forest
    pub seed:            u64,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            folds:           5,
            candidate_sizes: DEFAULT_CANDIDATE_SIZES.to_vec(),
            max_features:    None,
            seed:            4_242,
        }
    }
}

/// Check-set accuracy of one candidate ensemble size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub ensemble_size:  usize,
    pub check_accuracy: f64,
}

/// The forest retained for one fold.
#[derive(Debug, Clone)]
pub struct FoldModel {
    /// 0-based fold index
    pub fold:           usize,
    /// Indices into the training set that this fold trained on
    pub members:        Vec<usize>,
    pub ensemble_size:  usize,
    pub check_accuracy: f64,
    /// Every candidate tried, in candidate order
    pub candidates:     Vec<CandidateScore>,
    pub forest:         RandomForest,
}

impl Classifier for FoldModel {
    fn predict(&self, features: &[f64]) -> Label {
        self.forest.predict(features)
    }
}

/// Train one FoldModel per fold of `training`.
pub fn train_folds(training: &Dataset, cfg: &FoldConfig) -> Result<Vec<FoldModel>, PipelineError> {
    if training.is_empty() {
        return Err(PipelineError::EmptyDataset("training set"));
    }
    if cfg.candidate_sizes.is_empty() {
        return Err(PipelineError::Training("no candidate ensemble sizes configured".into()));
    }

    let labels = training.labels();
    let folds  = stratified_folds(&labels, cfg.folds, cfg.seed)?;
    let x      = training.matrix();
    let kinds  = vec![FeatureKind::Numeric; training.width()];

    tracing::info!(
        "Training {} folds over {} records, candidate sizes {:?}",
        folds.len(),
        training.len(),
        cfg.candidate_sizes
    );

    let job = FoldJob { x: &x, labels: &labels, kinds: &kinds, folds: &folds, cfg };
    run_folds(folds.len(), |i| job.train(i))
}

struct FoldJob<'a> {
    x:      &'a Array2<f64>,
    labels: &'a [Label],
    kinds:  &'a [FeatureKind],
    folds:  &'a [Vec<usize>],
    cfg:    &'a FoldConfig,
}

impl FoldJob<'_> {
    fn train(&self, fold: usize) -> Result<FoldModel, PipelineError> {
        let tr = &self.folds[fold];
        let mut ts: Vec<usize> = self
            .folds
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != fold)
            .flat_map(|(_, members)| members.iter().copied())
            .collect();
        ts.sort_unstable();

        let x_tr = self.x.select(Axis(0), tr);
        let y_tr: Vec<Label> = tr.iter().map(|&i| self.labels[i]).collect();
        let x_ts = self.x.select(Axis(0), &ts);
        let y_ts: Vec<Label> = ts.iter().map(|&i| self.labels[i]).collect();

        let mut candidates = Vec::with_capacity(self.cfg.candidate_sizes.len());
        let mut forests    = Vec::with_capacity(self.cfg.candidate_sizes.len());

        for &size in &self.cfg.candidate_sizes {
            let params = ForestParams::new(size, derive_seed(self.cfg.seed, &[fold as u64, size as u64]))
                .with_max_features(self.cfg.max_features);

            let forest         = RandomForest::fit(&x_tr, &y_tr, self.kinds, &params)?;
            let check_accuracy = accuracy(&predict_matrix(&forest, &x_ts), &y_ts);

            tracing::debug!(
                "Fold {} candidate {} trees: check accuracy {:.4}",
                fold + 1,
                size,
                check_accuracy
            );

            candidates.push(CandidateScore { ensemble_size: size, check_accuracy });
            forests.push(forest);
        }

        let scores: Vec<f64> = candidates.iter().map(|c| c.check_accuracy).collect();
        let best = select_candidate(&scores)
            .ok_or_else(|| PipelineError::Training(format!("fold {} produced no candidate", fold + 1)))?;

        let forest = forests.swap_remove(best);
        let chosen = &candidates[best];

        tracing::info!(
            "Fold {}/{}: selected {} trees (check accuracy {:.4}, {} train / {} check rows)",
            fold + 1,
            self.folds.len(),
            chosen.ensemble_size,
            chosen.check_accuracy,
            tr.len(),
            ts.len()
        );

        Ok(FoldModel {
            fold,
            members:        tr.clone(),
            ensemble_size:  chosen.ensemble_size,
            check_accuracy: chosen.check_accuracy,
            candidates:     candidates.clone(),
            forest,
        })
    }
}

/// Index of the highest score; the first one wins ties.
pub fn select_candidate(scores: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.map_or(true, |b| s > scores[b]) {
            best = Some(i);
        }
    }
    best
}

#[cfg(feature = "parallel")]
fn run_folds<F>(count: usize, train: F) -> Result<Vec<FoldModel>, PipelineError>
where
    F: Fn(usize) -> Result<FoldModel, PipelineError> + Send + Sync,
{
    (0..count).into_par_iter().map(train).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_folds<F>(count: usize, train: F) -> Result<Vec<FoldModel>, PipelineError>
where
    F: Fn(usize) -> Result<FoldModel, PipelineError>,
{
    (0..count).map(train).collect()
}
