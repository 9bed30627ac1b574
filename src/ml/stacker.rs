// ============================================================
// Layer 5 — Stacker
// ============================================================
// Second-stage model over the k fold models.
//
//   Validation record ──► [fold_1 … fold_k] ──► (l_1, …, l_k)
//                                                   │
//        true label ────────────────────────────────┤
//                                                   ▼
//                        RandomForest(100 trees, categorical inputs)
//
// Each input column is one base model's predicted label, stored
// as its level index and split as a categorical feature.
//
// The stacker's accuracy on Validation is measured on its own
// training data and is reported as in-sample only.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::dataset::Dataset;
use crate::domain::{error::PipelineError, label::Label, record::Record, traits::Classifier};
use crate::ml::{
    forest::{ForestParams, RandomForest},
    scoring::{accuracy, predict_matrix, predict_records},
    tree::FeatureKind,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackerConfig {
    pub n_trees: usize,
    pub seed:    u64,
}

impl Default for StackerConfig {
    fn default() -> Self {
        Self { n_trees: 100, seed: 4_243 }
    }
}

/// Forest over k categorical base predictions.
#[derive(Debug, Clone)]
pub struct StackedClassifier {
    forest: RandomForest,
}

impl StackedClassifier {
    /// Number of base predictions expected per record
    pub fn inputs(&self) -> usize {
        self.forest.width()
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }

    /// Final labels for a [records, k] matrix of encoded base predictions.
    pub fn predict_matrix(&self, encoded: &Array2<f64>) -> Result<Vec<Label>, PipelineError> {
        if encoded.ncols() != self.inputs() {
            return Err(PipelineError::WidthMismatch {
                expected: self.inputs(),
                actual:   encoded.ncols(),
            });
        }
        Ok(predict_matrix(&self.forest, encoded))
    }
}

/// Base models plus stacker, usable as a single Classifier.
pub struct StackedPipeline<'a, C> {
    bases:   &'a [C],
    stacker: &'a StackedClassifier,
}

impl<'a, C: Classifier> StackedPipeline<'a, C> {
    /// Fails unless there is exactly one base model per stacker input.
    pub fn new(bases: &'a [C], stacker: &'a StackedClassifier) -> Result<Self, PipelineError> {
        if bases.len() != stacker.inputs() {
            return Err(PipelineError::WidthMismatch {
                expected: stacker.inputs(),
                actual:   bases.len(),
            });
        }
        Ok(Self { bases, stacker })
    }
}

impl<C: Classifier> Classifier for StackedPipeline<'_, C> {
    fn predict(&self, features: &[f64]) -> Label {
        let encoded: Vec<f64> = self
            .bases
            .iter()
            .map(|b| b.predict(features).index() as f64)
            .collect();
        self.stacker.forest.predict(&encoded)
    }
}

/// Result of fitting the stacker on Validation.
#[derive(Debug, Clone)]
pub struct StackOutcome {
    pub classifier:         StackedClassifier,
    /// Each base model's accuracy on Validation, in base order
    pub base_accuracies:    Vec<f64>,
    /// Stacker accuracy on its own training data (optimistic)
    pub in_sample_accuracy: f64,
}

/// Encode every base model's predictions on `records` as a [n, k] matrix
/// of label indices. Also returns the raw per-base predictions.
pub fn base_prediction_matrix<C: Classifier + Sync>(
    bases:   &[C],
    records: &[Record],
) -> (Array2<f64>, Vec<Vec<Label>>) {
    let per_base: Vec<Vec<Label>> = bases.iter().map(|b| predict_records(b, records)).collect();

    let mut encoded = Array2::<f64>::zeros((records.len(), bases.len()));
    for (k, predictions) in per_base.iter().enumerate() {
        for (row, label) in predictions.iter().enumerate() {
            encoded[[row, k]] = label.index() as f64;
        }
    }
    (encoded, per_base)
}

/// Train the stacker on the base models' predictions over `validation`.
pub fn fit_stacker<C: Classifier + Sync>(
    bases:      &[C],
    validation: &Dataset,
    cfg:        &StackerConfig,
) -> Result<StackOutcome, PipelineError> {
    if bases.is_empty() {
        return Err(PipelineError::Training("stacker needs at least one base model".into()));
    }
    if validation.is_empty() {
        return Err(PipelineError::EmptyDataset("validation set"));
    }

    let truth               = validation.labels();
    let (encoded, per_base) = base_prediction_matrix(bases, &validation.records);

    let base_accuracies: Vec<f64> = per_base.iter().map(|p| accuracy(p, &truth)).collect();

    let kinds  = vec![FeatureKind::Categorical { levels: Label::COUNT }; bases.len()];
    let params = ForestParams::new(cfg.n_trees, cfg.seed);
    let forest = RandomForest::fit(&encoded, &truth, &kinds, &params)?;

    let classifier         = StackedClassifier { forest };
    let in_sample_accuracy = accuracy(&classifier.predict_matrix(&encoded)?, &truth);

    tracing::info!(
        "Stacker trained on {} validation records: in-sample accuracy {:.4} (best base {:.4})",
        validation.len(),
        in_sample_accuracy,
        base_accuracies.iter().copied().fold(0.0, f64::max)
    );

    Ok(StackOutcome { classifier, base_accuracies, in_sample_accuracy })
}
