// ============================================================
// Layer 4 — Dataset
// ============================================================
// Labelled records sharing one ordered feature layout. Every
// split and fold is a Dataset built by index selection, so a
// record's `row` identifies it across all subsets.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::domain::{label::Label, record::Record};

/// An ordered collection of labelled records sharing one feature layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub records:       Vec<Record>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, records: Vec<Record>) -> Self {
        Self { feature_names, records }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn width(&self) -> usize { self.feature_names.len() }

    pub fn labels(&self) -> Vec<Label> {
        self.records.iter().map(|r| r.label).collect()
    }

    /// Records per class, indexed by `Label::index()`
    pub fn label_counts(&self) -> [usize; Label::COUNT] {
        let mut counts = [0usize; Label::COUNT];
        for r in &self.records {
            counts[r.label.index()] += 1;
        }
        counts
    }

    /// Share of each class; all zeros for an empty dataset
    pub fn label_proportions(&self) -> [f64; Label::COUNT] {
        let total  = self.len().max(1) as f64;
        let counts = self.label_counts();
        let mut out = [0.0; Label::COUNT];
        for (o, c) in out.iter_mut().zip(counts) {
            *o = c as f64 / total;
        }
        out
    }

    /// New dataset holding clones of the records at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            feature_names: self.feature_names.clone(),
            records:       indices.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }

    /// Row-major feature matrix, shape [len, width]
    pub fn matrix(&self) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((self.len(), self.width()));
        for (mut row, record) in x.rows_mut().into_iter().zip(&self.records) {
            for (cell, &v) in row.iter_mut().zip(&record.features) {
                *cell = v;
            }
        }
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Dataset {
        Dataset::new(
            vec!["f0".into(), "f1".into()],
            vec![
                Record::new(0, vec![1.0, 2.0], Label::A),
                Record::new(1, vec![3.0, 4.0], Label::B),
                Record::new(2, vec![5.0, 6.0], Label::A),
            ],
        )
    }

    #[test]
    fn test_counts_and_proportions() {
        let ds = tiny();
        assert_eq!(ds.label_counts(), [2, 1, 0, 0, 0]);
        let p = ds.label_proportions();
        assert!((p[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(p[4], 0.0);
    }

    #[test]
    fn test_subset_keeps_order() {
        let sub = tiny().subset(&[2, 0]);
        assert_eq!(sub.records.iter().map(|r| r.row).collect::<Vec<_>>(), vec![2, 0]);
        assert_eq!(sub.feature_names.len(), 2);
    }

    #[test]
    fn test_matrix_layout() {
        let x = tiny().matrix();
        assert_eq!(x.dim(), (3, 2));
        assert_eq!(x[[1, 0]], 3.0);
        assert_eq!(x[[2, 1]], 6.0);
    }
}
