// ============================================================
// Layer 6 — Report Renderer
// ============================================================
// Turns a RunOutcome into the Markdown report and the console
// summary table.
//
// Report sections, in order:
//   1. Data            — split sizes and feature count
//   2. Fold models     — chosen ensemble size and accuracies
//   3. Accuracy        — per base and stacked, on Evaluation
//   4. Confusion matrix and per-class statistics
//   5. Scatter panel   — predicted vs. actual, jittered
//   6. Quiz predictions
//
// Tables use comfy-table's ASCII_MARKDOWN preset so the output
// renders as GitHub Markdown. Only the Evaluation numbers are
// out-of-sample; the others are labelled as in-training.
//
// Reference: comfy-table crate documentation (presets)

use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS,
    presets::{ASCII_MARKDOWN, UTF8_FULL},
    Cell, CellAlignment, Color, Table,
};
use std::fmt::{self, Write};

use crate::application::report_use_case::{ReportConfig, RunOutcome};
use crate::domain::label::Label;
use crate::infra::scatter::ScatterPanel;

fn markdown_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN).set_header(header.to_vec());
    table
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn render_markdown(cfg: &ReportConfig, outcome: &RunOutcome) -> Result<String, fmt::Error> {
    let mut out  = String::new();
    let eval     = &outcome.evaluation;
    let sizes    = &outcome.sizes;
    let n_models = outcome.folds.len();

    writeln!(out, "# Weight Lifting Exercise: stacked random forest\n")?;

    // ── 1. Data ───────────────────────────────────────────────────────────────
    writeln!(out, "## Data\n")?;
    let mut data = markdown_table(&["Subset", "Records"]);
    data.add_row(vec!["Labelled pool".to_string(), sizes.pool.to_string()]);
    data.add_row(vec!["Training".to_string(), sizes.training.to_string()]);
    data.add_row(vec!["Validation".to_string(), sizes.validation.to_string()]);
    data.add_row(vec!["Evaluation".to_string(), sizes.evaluation.to_string()]);
    writeln!(out, "{data}\n")?;
    writeln!(
        out,
        "{} complete numeric features were kept. Seed {}, {} folds.\n",
        outcome.feature_names.len(),
        cfg.seed,
        cfg.folds
    )?;

    // ── 2. Fold models ────────────────────────────────────────────────────────
    writeln!(out, "## Fold models\n")?;
    let mut folds = markdown_table(&[
        "Fold",
        "Records",
        "Ensemble size",
        "Check accuracy",
        "Validation accuracy",
    ]);
    for (model, validation) in outcome.folds.iter().zip(&outcome.stack.base_accuracies) {
        folds.add_row(vec![
            (model.fold + 1).to_string(),
            model.members.len().to_string(),
            model.ensemble_size.to_string(),
            pct(model.check_accuracy),
            pct(*validation),
        ]);
    }
    writeln!(out, "{folds}\n")?;
    writeln!(
        out,
        "Check and validation accuracies are in-training numbers: the \
         check sets overlap between folds and Validation trained the stacker.\n"
    )?;

    // ── 3. Accuracy ───────────────────────────────────────────────────────────
    writeln!(out, "## Accuracy on the Evaluation subset\n")?;
    let mut acc = markdown_table(&["Model", "Trees", "Accuracy"]);
    for (model, accuracy) in outcome.folds.iter().zip(&eval.base_accuracies) {
        acc.add_row(vec![
            format!("Fold {}", model.fold + 1),
            model.ensemble_size.to_string(),
            pct(*accuracy),
        ]);
    }
    acc.add_row(vec![
        format!("Stacked ({n_models} inputs)"),
        outcome.stack.classifier.n_trees().to_string(),
        pct(eval.stacked_accuracy),
    ]);
    writeln!(out, "{acc}\n")?;
    writeln!(
        out,
        "Stacker accuracy on Validation (in-sample, optimistic): {}\n",
        pct(outcome.stack.in_sample_accuracy)
    )?;

    // ── 4. Confusion matrix ───────────────────────────────────────────────────
    writeln!(out, "## Confusion matrix\n")?;
    let mut header = vec!["Predicted \\ Actual".to_string()];
    header.extend(Label::ALL.iter().map(|l| l.to_string()));
    header.push("Total".to_string());

    let mut confusion = Table::new();
    confusion.load_preset(ASCII_MARKDOWN).set_header(header);
    for predicted in Label::ALL {
        let mut row = vec![predicted.to_string()];
        row.extend(Label::ALL.iter().map(|&a| eval.confusion.get(predicted, a).to_string()));
        row.push(eval.confusion.row_total(predicted).to_string());
        confusion.add_row(row);
    }
    let mut totals = vec!["Total".to_string()];
    totals.extend(Label::ALL.iter().map(|&a| eval.confusion.column_total(a).to_string()));
    totals.push(eval.confusion.total().to_string());
    confusion.add_row(totals);
    writeln!(out, "{confusion}\n")?;

    let mut stats = markdown_table(&[
        "Class",
        "Support",
        "Sensitivity",
        "Specificity",
        "Balanced accuracy",
    ]);
    for s in eval.class_stats() {
        stats.add_row(vec![
            s.label.to_string(),
            s.support.to_string(),
            pct(s.sensitivity),
            pct(s.specificity),
            pct(s.balanced_accuracy),
        ]);
    }
    writeln!(out, "{stats}\n")?;
    writeln!(out, "Cohen's kappa: {:.4}\n", eval.confusion.kappa())?;

    // ── 5. Scatter panel ──────────────────────────────────────────────────────
    writeln!(out, "## Predicted vs. actual\n")?;
    let panel = ScatterPanel::new(12, 3, cfg.scatter_seed());
    writeln!(out, "```text\n{}```\n", panel.render(&eval.pairs))?;

    // ── 6. Quiz predictions ───────────────────────────────────────────────────
    writeln!(out, "## Quiz predictions\n")?;
    if outcome.quiz.is_empty() {
        writeln!(out, "No quiz pool was available for this run.")?;
    } else {
        let mut quiz = markdown_table(&["Problem", "Prediction"]);
        for p in &outcome.quiz {
            quiz.add_row(vec![p.problem_id.clone(), p.label.to_string()]);
        }
        writeln!(out, "{quiz}")?;
    }

    Ok(out)
}

/// Boxed console table with the headline numbers of a run.
pub fn console_summary(outcome: &RunOutcome) -> Table {
    let eval = &outcome.evaluation;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Measure").fg(Color::Cyan),
            Cell::new("Value").fg(Color::Green),
        ]);

    let sizes: Vec<String> = outcome.folds.iter().map(|f| f.ensemble_size.to_string()).collect();
    let rows = [
        ("Training / Validation / Evaluation", format!(
            "{} / {} / {}",
            outcome.sizes.training, outcome.sizes.validation, outcome.sizes.evaluation
        )),
        ("Features", outcome.feature_names.len().to_string()),
        ("Fold ensemble sizes", sizes.join(", ")),
        ("Stacked accuracy (Evaluation)", pct(eval.stacked_accuracy)),
        ("Kappa", format!("{:.4}", eval.confusion.kappa())),
        ("Quiz predictions", outcome.quiz.len().to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value).set_alignment(CellAlignment::Right)]);
    }
    table
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::report_use_case::run_pipeline;
    use crate::data::{
        fixtures::{quiz_csv, sensor_csv},
        loader::{default_missing_markers, RawTable},
    };

    fn outcome(with_quiz: bool) -> (ReportConfig, RunOutcome) {
        let cfg = ReportConfig {
            folds:           2,
            candidate_sizes: vec![5, 7],
            stacker_trees:   9,
            ..ReportConfig::default()
        };
        let markers  = default_missing_markers();
        let training = RawTable::from_reader(sensor_csv(20, 4, 3).as_bytes(), &markers).unwrap();
        let quiz     = RawTable::from_reader(quiz_csv(4, 4, 4).as_bytes(), &markers).unwrap();

        let outcome = run_pipeline(&cfg, &training, with_quiz.then_some(&quiz)).unwrap();
        (cfg, outcome)
    }

    #[test]
    fn test_markdown_has_every_section() {
        let (cfg, outcome) = outcome(true);
        let md = render_markdown(&cfg, &outcome).unwrap();

        for heading in [
            "## Data",
            "## Fold models",
            "## Accuracy on the Evaluation subset",
            "## Confusion matrix",
            "## Predicted vs. actual",
            "## Quiz predictions",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains("```text\nPredicted\n"));
        assert!(md.contains("Cohen's kappa"));
        assert!(md.contains("Stacked (2 inputs)"));
        assert!(md.contains("| Predicted \\ Actual |"));
    }

    #[test]
    fn test_confusion_total_matches_evaluation_size() {
        let (cfg, outcome) = outcome(false);
        let md = render_markdown(&cfg, &outcome).unwrap();

        let total_row = md
            .lines()
            .find(|l| l.starts_with("| Total"))
            .unwrap();
        let last_cell = total_row
            .trim()
            .trim_end_matches('|')
            .rsplit('|')
            .next()
            .unwrap()
            .trim();
        assert_eq!(last_cell, outcome.sizes.evaluation.to_string());
        assert!(md.contains("No quiz pool was available"));
    }

    #[test]
    fn test_console_summary_lists_headline_numbers() {
        let (_, outcome) = outcome(true);
        let text = console_summary(&outcome).to_string();
        assert!(text.contains("Stacked accuracy (Evaluation)"));
        assert!(text.contains("Kappa"));
    }
}
