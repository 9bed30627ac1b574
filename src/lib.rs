// ============================================================
// wle-stack
// ============================================================
// Stacked random-forest classifier for the Weight Lifting
// Exercises sensor dataset, organised in layers:
//
//   Layer 1  cli          — argument parsing, console output
//   Layer 2  application  — the report workflow
//   Layer 3  domain       — labels, records, errors, traits
//   Layer 4  data         — CSV loading, feature selection, splits
//   Layer 5  ml           — trees, forests, folds, stacking, metrics
//   Layer 6  infra        — download cache, report + artifacts

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
