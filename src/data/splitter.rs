// ============================================================
// Layer 4 — Stratified Splitter
// ============================================================
// Two operations, both seeded and both stratified by label:
//
//   stratified_partition — two-way split of a Dataset
//   stratified_folds     — k-way fold assignment
//
// Partition rule, per class in label order:
//   shuffle the class members, then put ceil(n_class * p) of
//   them in `selected` and the rest in `remainder`.
//
// The pipeline applies it twice:
//   pool (19,622)  --p=0.80-->  pool' (15,699) + Evaluation (3,923)
//   pool' (15,699) --p=0.75-->  Training (11,776) + Validation (3,923)
//
// Fold rule: per class, shuffle and deal members round-robin
// into k folds. The dealing position carries over from one
// class to the next, so fold sizes never differ by more than one.
//
// Uses ChaCha8Rng so a seed gives the same split on every platform.
//
// Reference: rand / rand_chacha crate documentation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::dataset::Dataset;
use crate::domain::{error::PipelineError, label::Label};

/// The two sides of a stratified partition.
#[derive(Debug, Clone)]
pub struct Partition {
    /// ceil(n_class * p) records of every class
    pub selected:  Dataset,
    /// Everything else
    pub remainder: Dataset,
}

/// Indices of `labels`, grouped by class in label order
fn group_by_label(labels: &[Label]) -> [Vec<usize>; Label::COUNT] {
    let mut groups: [Vec<usize>; Label::COUNT] = Default::default();
    for (i, label) in labels.iter().enumerate() {
        groups[label.index()].push(i);
    }
    groups
}

/// Stratified two-way split with a caller-supplied seed.
///
/// Both sides keep the input order of their records.
pub fn stratified_partition(
    dataset:  &Dataset,
    fraction: f64,
    seed:     u64,
) -> Result<Partition, PipelineError> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(PipelineError::InvalidFraction(fraction));
    }

    let mut rng    = ChaCha8Rng::seed_from_u64(seed);
    let mut groups = group_by_label(&dataset.labels());

    let mut selected  = Vec::with_capacity(dataset.len());
    let mut remainder = Vec::new();

    for group in groups.iter_mut() {
        group.shuffle(&mut rng);

        // The epsilon keeps exact products like 4464.0000000000002 from
        // rounding up an extra record.
        let take = ((group.len() as f64 * fraction - 1e-9).ceil().max(0.0) as usize).min(group.len());

        selected.extend_from_slice(&group[..take]);
        remainder.extend_from_slice(&group[take..]);
    }

    selected.sort_unstable();
    remainder.sort_unstable();

    tracing::debug!(
        "Stratified partition p={}: {} selected, {} remainder",
        fraction,
        selected.len(),
        remainder.len()
    );

    Ok(Partition {
        selected:  dataset.subset(&selected),
        remainder: dataset.subset(&remainder),
    })
}

/// Assign every index of `labels` to one of `k` stratified folds.
///
/// Returns k sorted index lists that partition `0..labels.len()`.
/// Fails when any class present has fewer than `k` members.
pub fn stratified_folds(
    labels: &[Label],
    k:      usize,
    seed:   u64,
) -> Result<Vec<Vec<usize>>, PipelineError> {
    if k < 2 {
        return Err(PipelineError::InvalidFoldCount(k));
    }
    if labels.is_empty() {
        return Err(PipelineError::EmptyDataset("training set"));
    }

    let mut groups = group_by_label(labels);

    for (label, group) in Label::ALL.iter().zip(groups.iter()) {
        if !group.is_empty() && group.len() < k {
            return Err(PipelineError::DegenerateClass {
                label: label.to_string(),
                count: group.len(),
                folds: k,
            });
        }
    }

    let mut rng    = ChaCha8Rng::seed_from_u64(seed);
    let mut folds  = vec![Vec::with_capacity(labels.len() / k + 1); k];
    let mut dealer = 0usize;

    for group in groups.iter_mut() {
        group.shuffle(&mut rng);
        for &idx in group.iter() {
            folds[dealer % k].push(idx);
            dealer += 1;
        }
    }

    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    Ok(folds)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;
    use std::collections::HashSet;

    /// Dataset with the given number of records per class, no features
    fn with_counts(counts: [usize; Label::COUNT]) -> Dataset {
        let mut records = Vec::new();
        let mut row     = 0;
        // Interleave classes so that input order is not sorted by label
        let max = counts.iter().copied().max().unwrap_or(0);
        for i in 0..max {
            for (c, &n) in counts.iter().enumerate() {
                if i < n {
                    records.push(Record::new(row, vec![row as f64], Label::ALL[c]));
                    row += 1;
                }
            }
        }
        Dataset::new(vec!["row".into()], records)
    }

    fn rows(ds: &Dataset) -> HashSet<usize> {
        ds.records.iter().map(|r| r.row).collect()
    }

    #[test]
    fn test_partition_is_disjoint_and_complete() {
        let ds = with_counts([50, 40, 30, 20, 10]);
        let p  = stratified_partition(&ds, 0.8, 7).unwrap();

        assert_eq!(p.selected.len() + p.remainder.len(), ds.len());
        assert!(rows(&p.selected).is_disjoint(&rows(&p.remainder)));

        let union: HashSet<usize> = rows(&p.selected).union(&rows(&p.remainder)).copied().collect();
        assert_eq!(union, rows(&ds));
    }

    #[test]
    fn test_partition_preserves_label_proportions() {
        let ds    = with_counts([300, 200, 150, 100, 250]);
        let p     = stratified_partition(&ds, 0.75, 11).unwrap();
        let whole = ds.label_proportions();

        for side in [&p.selected, &p.remainder] {
            for (a, b) in side.label_proportions().iter().zip(whole.iter()) {
                assert!((a - b).abs() < 0.01, "proportion {a} vs {b}");
            }
        }
    }

    #[test]
    fn test_ceil_rule_reproduces_dataset_sizes() {
        let pool = with_counts([5580, 3797, 3422, 3216, 3607]);
        assert_eq!(pool.len(), 19_622);

        let first  = stratified_partition(&pool, 0.8, 1).unwrap();
        let second = stratified_partition(&first.selected, 0.75, 2).unwrap();

        assert_eq!(first.remainder.len(), 3_923);
        assert_eq!(second.selected.len(), 11_776);
        assert_eq!(second.remainder.len(), 3_923);
    }

    #[test]
    fn test_partition_is_seed_deterministic() {
        let ds = with_counts([30, 30, 30, 30, 30]);
        let a  = stratified_partition(&ds, 0.5, 99).unwrap();
        let b  = stratified_partition(&ds, 0.5, 99).unwrap();
        assert_eq!(a.selected, b.selected);
        assert_eq!(a.remainder, b.remainder);
    }

    #[test]
    fn test_invalid_fraction() {
        let ds = with_counts([5, 5, 5, 5, 5]);
        assert!(matches!(stratified_partition(&ds, 0.0, 1), Err(PipelineError::InvalidFraction(_))));
        assert!(matches!(stratified_partition(&ds, 1.5, 1), Err(PipelineError::InvalidFraction(_))));
        assert!(matches!(stratified_partition(&ds, f64::NAN, 1), Err(PipelineError::InvalidFraction(_))));
    }

    #[test]
    fn test_full_fraction_keeps_everything() {
        let ds = with_counts([3, 3, 0, 0, 1]);
        let p  = stratified_partition(&ds, 1.0, 3).unwrap();
        assert_eq!(p.selected.len(), 7);
        assert!(p.remainder.is_empty());
    }

    #[test]
    fn test_folds_partition_all_indices() {
        let ds    = with_counts([23, 17, 12, 9, 14]);
        let folds = stratified_folds(&ds.labels(), 5, 42).unwrap();

        assert_eq!(folds.len(), 5);
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..ds.len()).collect::<Vec<_>>());

        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        let spread = sizes.iter().max().unwrap() - sizes.iter().min().unwrap();
        assert!(spread <= 1, "fold sizes {sizes:?}");
    }

    #[test]
    fn test_every_class_appears_in_every_fold() {
        let ds     = with_counts([10, 10, 5, 7, 6]);
        let labels = ds.labels();
        let folds  = stratified_folds(&labels, 5, 3).unwrap();

        for fold in &folds {
            let present: HashSet<Label> = fold.iter().map(|&i| labels[i]).collect();
            assert_eq!(present.len(), Label::COUNT);
        }
    }

    #[test]
    fn test_folds_are_seed_deterministic() {
        let labels = with_counts([20, 20, 20, 20, 20]).labels();
        assert_eq!(
            stratified_folds(&labels, 4, 5).unwrap(),
            stratified_folds(&labels, 4, 5).unwrap()
        );
    }

    #[test]
    fn test_small_class_is_degenerate() {
        let labels = with_counts([10, 10, 2, 10, 10]).labels();
        let err    = stratified_folds(&labels, 5, 1).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateClass { count: 2, folds: 5, .. }));
    }

    #[test]
    fn test_absent_class_is_allowed() {
        let labels = with_counts([10, 10, 0, 10, 10]).labels();
        assert!(stratified_folds(&labels, 5, 1).is_ok());
    }

    #[test]
    fn test_invalid_fold_count() {
        let labels = with_counts([10, 10, 10, 10, 10]).labels();
        assert!(matches!(stratified_folds(&labels, 1, 1), Err(PipelineError::InvalidFoldCount(1))));
    }
}
