// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits:
//
//   TableSource — anything that yields a raw table of cells
//                 (a local CSV file, an in-memory string)
//   Classifier  — anything that maps a feature vector to a Label
//                 (a random forest, a fold model, a test double)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::data::loader::RawTable;
use crate::domain::label::Label;

// ─── TableSource ──────────────────────────────────────────────────────────────
/// Any component that can load a raw CSV-style table.
///
/// Implementations:
///   - CsvLoader → reads a comma-separated file from disk
pub trait TableSource {
    /// Load the whole table. Missing-value markers are already `None`.
    fn load(&self) -> Result<RawTable>;
}

// ─── Classifier ───────────────────────────────────────────────────────────────
/// A trained mapping from a feature vector to a predicted label.
///
/// Implementations:
///   - RandomForest → bagged CART trees
///   - FoldModel    → the forest selected for one fold
pub trait Classifier {
    fn predict(&self, features: &[f64]) -> Label;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn predict(&self, features: &[f64]) -> Label {
        (**self).predict(features)
    }
}
