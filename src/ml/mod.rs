// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// All classifier code lives here. Other layers only see the
// Classifier trait and the result structs.
//
// What's in this layer:
//
//   tree.rs      — CART decision tree (Gini impurity), numeric
//                  threshold splits and categorical subset splits
//
//   forest.rs    — Random forest: bootstrap samples, sqrt(p)
//                  features per split, majority vote
//
//   scoring.rs   — batch prediction and accuracy helpers
//
//   trainer.rs   — Fold Trainer: k stratified folds, candidate
//                  ensemble sizes, best candidate per fold
//
//   stacker.rs   — second-stage forest over the k fold
//                  predictions, trained on Validation
//
//   evaluator.rs — out-of-sample accuracy, confusion matrix,
//                  kappa, quiz-pool predictions
//
// Reference: Breiman (2001) Random Forests
//            Wolpert (1992) Stacked Generalization

/// CART decision tree
pub mod tree;

/// Bagged ensemble of trees
pub mod forest;

/// Shared prediction / accuracy helpers
pub mod scoring;

/// Per-fold candidate search
pub mod trainer;

/// Second-stage classifier over fold predictions
pub mod stacker;

/// Evaluation-subset metrics and quiz predictions
pub mod evaluator;
