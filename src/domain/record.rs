// ============================================================
// Layer 3 — Record Domain Types
// ============================================================
// A Record is one fully numeric sensor observation with its
// exercise-quality label. By the time a Record exists, every
// missing-value column has been removed, so `features` never
// contains NaN and the label is always present.
//
// `row` is the 0-based position in the source file. It is the
// identity used to prove that subsets never overlap.

use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Position of the row in the source CSV
    pub row: usize,

    /// Sensor measurements, ordered like the dataset's feature names
    pub features: Vec<f64>,

    /// The graded class of this repetition
    pub label: Label,
}

impl Record {
    pub fn new(row: usize, features: Vec<f64>, label: Label) -> Self {
        Self { row, features, label }
    }

    pub fn width(&self) -> usize {
        self.features.len()
    }
}

/// An unlabelled observation from the quiz pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    /// Identifier printed next to the prediction
    pub problem_id: String,

    /// Same feature order as the training records
    pub features: Vec<f64>,
}

impl QuizRecord {
    pub fn new(problem_id: impl Into<String>, features: Vec<f64>) -> Self {
        Self {
            problem_id: problem_id.into(),
            features,
        }
    }
}
