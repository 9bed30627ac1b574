// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores the finished pipeline on the Evaluation subset, which
// took no part in fold training, candidate selection or stacking.
// Its accuracy is the only out-of-sample number in the report.
//
// Outputs:
//   - standalone accuracy of every fold model
//   - stacked predictions and their aggregate accuracy
//   - confusion matrix, indexed [predicted][actual]
//   - per-class sensitivity / specificity, Cohen's kappa
//   - (actual, predicted) pairs for the scatter panel
//
// Reference: Cohen (1960) kappa coefficient

use serde::Serialize;

use crate::data::dataset::Dataset;
use crate::domain::{error::PipelineError, label::Label, record::QuizRecord, traits::Classifier};
use crate::ml::{
    scoring::accuracy,
    stacker::{base_prediction_matrix, StackedClassifier, StackedPipeline},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    /// counts[predicted][actual]
    counts: [[usize; Label::COUNT]; Label::COUNT],
}

/// One-vs-rest statistics for a single class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassStats {
    pub label:             Label,
    pub support:           usize,
    pub sensitivity:       f64,
    pub specificity:       f64,
    pub balanced_accuracy: f64,
}

impl ConfusionMatrix {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Label, Label)>,
    {
        let mut m = Self::default();
        for (actual, predicted) in pairs {
            m.counts[predicted.index()][actual.index()] += 1;
        }
        m
    }

    pub fn get(&self, predicted: Label, actual: Label) -> usize {
        self.counts[predicted.index()][actual.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..Label::COUNT).map(|i| self.counts[i][i]).sum()
    }

    /// Records predicted as `predicted`
    pub fn row_total(&self, predicted: Label) -> usize {
        self.counts[predicted.index()].iter().sum()
    }

    /// Records whose true class is `actual`
    pub fn column_total(&self, actual: Label) -> usize {
        self.counts.iter().map(|row| row[actual.index()]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }

    /// Cohen's kappa. 1.0 when both observed and chance agreement are perfect.
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let observed = self.accuracy();
        let expected: f64 = Label::ALL
            .iter()
            .map(|&l| self.row_total(l) as f64 * self.column_total(l) as f64)
            .sum::<f64>()
            / (total * total);

        if (1.0 - expected).abs() < f64::EPSILON {
            return if (observed - 1.0).abs() < f64::EPSILON { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }

    pub fn class_stats(&self, label: Label) -> ClassStats {
        let tp        = self.get(label, label) as f64;
        let support   = self.column_total(label);
        let predicted = self.row_total(label) as f64;
        let total     = self.total() as f64;

        let fn_ = support as f64 - tp;
        let fp  = predicted - tp;
        let tn  = total - tp - fn_ - fp;

        let sensitivity = ratio(tp, tp + fn_);
        let specificity = ratio(tn, tn + fp);

        ClassStats {
            label,
            support,
            sensitivity,
            specificity,
            balanced_accuracy: (sensitivity + specificity) / 2.0,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// Everything measured on the Evaluation subset.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Standalone accuracy of each base model, in base order
    pub base_accuracies:  Vec<f64>,
    pub stacked_accuracy: f64,
    pub confusion:        ConfusionMatrix,
    /// (actual, predicted) per Evaluation record, in record order
    pub pairs:            Vec<(Label, Label)>,
}

impl Evaluation {
    pub fn class_stats(&self) -> Vec<ClassStats> {
        Label::ALL.iter().map(|&l| self.confusion.class_stats(l)).collect()
    }
}

pub fn evaluate<C: Classifier + Sync>(
    bases:      &[C],
    stacker:    &StackedClassifier,
    evaluation: &Dataset,
) -> Result<Evaluation, PipelineError> {
    if evaluation.is_empty() {
        return Err(PipelineError::EmptyDataset("evaluation set"));
    }

    let truth               = evaluation.labels();
    let (encoded, per_base) = base_prediction_matrix(bases, &evaluation.records);

    let base_accuracies: Vec<f64> = per_base.iter().map(|p| accuracy(p, &truth)).collect();
    let predicted               = stacker.predict_matrix(&encoded)?;
    let stacked_accuracy        = accuracy(&predicted, &truth);

    let pairs: Vec<(Label, Label)> = truth.iter().copied().zip(predicted).collect();
    let confusion = ConfusionMatrix::from_pairs(pairs.iter().copied());

    tracing::info!(
        "Evaluation on {} records: stacked accuracy {:.4}, kappa {:.4}",
        evaluation.len(),
        stacked_accuracy,
        confusion.kappa()
    );

    Ok(Evaluation { base_accuracies, stacked_accuracy, confusion, pairs })
}

/// A quiz-pool prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizPrediction {
    pub problem_id: String,
    pub label:      Label,
}

/// Run the full pipeline over the quiz pool.
pub fn predict_quiz<C: Classifier>(
    bases:   &[C],
    stacker: &StackedClassifier,
    quiz:    &[QuizRecord],
) -> Result<Vec<QuizPrediction>, PipelineError> {
    let pipeline = StackedPipeline::new(bases, stacker)?;
    Ok(quiz
        .iter()
        .map(|q| QuizPrediction {
            problem_id: q.problem_id.clone(),
            label:      pipeline.predict(&q.features),
        })
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::stacker::{fit_stacker, tests::{oracle_dataset, oracles}, StackerConfig};

    #[test]
    fn test_confusion_totals_match_class_counts() {
        let pairs = vec![
            (Label::A, Label::A),
            (Label::A, Label::B),
            (Label::B, Label::B),
            (Label::C, Label::C),
            (Label::E, Label::D),
        ];
        let m = ConfusionMatrix::from_pairs(pairs.iter().copied());

        assert_eq!(m.total(), 5);
        assert_eq!(m.column_total(Label::A), 2);
        assert_eq!(m.row_total(Label::B), 2);
        assert_eq!(m.get(Label::D, Label::E), 1);
        assert_eq!(m.correct(), 3);
        assert!((m.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_kappa_and_class_stats() {
        // 2x A correct, 2x B correct, 1 A predicted as B
        let pairs = [
            (Label::A, Label::A),
            (Label::A, Label::A),
            (Label::A, Label::B),
            (Label::B, Label::B),
            (Label::B, Label::B),
        ];
        let m = ConfusionMatrix::from_pairs(pairs);

        // po = 0.8, pe = (2*3 + 3*2) / 25 = 0.48
        assert!((m.kappa() - (0.8 - 0.48) / 0.52).abs() < 1e-12);

        let a = m.class_stats(Label::A);
        assert_eq!(a.support, 3);
        assert!((a.sensitivity - 2.0 / 3.0).abs() < 1e-12);
        assert!((a.specificity - 1.0).abs() < 1e-12);

        let b = m.class_stats(Label::B);
        assert!((b.sensitivity - 1.0).abs() < 1e-12);
        assert!((b.specificity - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_single_class_kappa() {
        let m = ConfusionMatrix::from_pairs([(Label::C, Label::C), (Label::C, Label::C)]);
        assert_eq!(m.kappa(), 1.0);
    }

    #[test]
    fn test_evaluation_is_consistent_with_its_matrix() {
        let bases      = oracles();
        let validation = oracle_dataset(12);
        let evaluation = oracle_dataset(4);
        let stack      = fit_stacker(&bases, &validation, &StackerConfig { n_trees: 25, seed: 2 }).unwrap();

        let result = evaluate(&bases, &stack.classifier, &evaluation).unwrap();

        assert_eq!(result.base_accuracies.len(), 3);
        assert_eq!(result.pairs.len(), evaluation.len());

        let counts = evaluation.label_counts();
        for label in Label::ALL {
            assert_eq!(result.confusion.column_total(label), counts[label.index()]);
        }
        let predicted_counts: usize = Label::ALL.iter().map(|&l| result.confusion.row_total(l)).sum();
        assert_eq!(predicted_counts, evaluation.len());

        let direct = result.pairs.iter().filter(|(a, p)| a == p).count() as f64 / evaluation.len() as f64;
        assert!((result.confusion.accuracy() - direct).abs() < 1e-12);
        assert!((result.stacked_accuracy - direct).abs() < 1e-12);
    }

    #[test]
    fn test_quiz_predictions_follow_pipeline() {
        let bases      = oracles();
        let validation = oracle_dataset(12);
        let stack      = fit_stacker(&bases, &validation, &StackerConfig { n_trees: 25, seed: 2 }).unwrap();

        let quiz = vec![
            QuizRecord::new("1", vec![2.0, 0.0]),
            QuizRecord::new("2", vec![4.0, 1.0]),
        ];
        let predictions = predict_quiz(&bases, &stack.classifier, &quiz).unwrap();

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].problem_id, "1");
        assert_eq!(predictions[0].label, Label::C);
        assert_eq!(predictions[1].label, Label::E);
    }

    #[test]
    fn test_quiz_rejects_mismatched_bases() {
        let bases = oracles();
        let stack = fit_stacker(&bases, &oracle_dataset(4), &StackerConfig { n_trees: 5, seed: 2 }).unwrap();
        let quiz  = vec![QuizRecord::new("1", vec![0.0, 0.0])];

        assert!(matches!(
            predict_quiz(&bases[1..], &stack.classifier, &quiz),
            Err(PipelineError::WidthMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn test_empty_evaluation_is_rejected() {
        let bases      = oracles();
        let validation = oracle_dataset(3);
        let stack      = fit_stacker(&bases, &validation, &StackerConfig { n_trees: 5, seed: 2 }).unwrap();
        let empty      = Dataset::new(vec!["truth".into(), "variant".into()], Vec::new());
        assert!(evaluate(&bases, &stack.classifier, &empty).is_err());
    }
}
