// ============================================================
// Layer 5 — Scoring Helpers
// ============================================================
// Batch prediction and accuracy shared by the fold trainer,
// stacker and evaluator.

use ndarray::Array2;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::domain::{label::Label, record::Record, traits::Classifier};

/// Predict the label of every record, in order.
#[cfg(feature = "parallel")]
pub fn predict_records<C: Classifier + Sync>(clf: &C, records: &[Record]) -> Vec<Label> {
    records.par_iter().map(|r| clf.predict(&r.features)).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn predict_records<C: Classifier + Sync>(clf: &C, records: &[Record]) -> Vec<Label> {
    records.iter().map(|r| clf.predict(&r.features)).collect()
}

/// Predict every row of a feature matrix, in order.
pub fn predict_matrix<C: Classifier>(clf: &C, x: &Array2<f64>) -> Vec<Label> {
    x.outer_iter()
        .map(|row| match row.as_slice() {
            Some(features) => clf.predict(features),
            None => clf.predict(&row.to_vec()),
        })
        .collect()
}

/// Fraction of positions where `predicted` matches `actual`.
/// Zero for empty input.
pub fn accuracy(predicted: &[Label], actual: &[Label]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let hits = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    hits as f64 / n as f64
}
