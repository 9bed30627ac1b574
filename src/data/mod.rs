// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw CSV text and the in-memory
// subsets the models train on.
//
//   pml-training.csv / pml-testing.csv
//       │
//       ▼
//   CsvLoader         → RawTable (missing markers → None)
//       │
//       ▼
//   FeatureSelector   → Dataset of complete numeric Records
//       │
//       ▼
//   stratified_partition (x2) → Training / Validation / Evaluation
//       │
//       ▼
//   stratified_folds  → k fold index lists over Training
//
// Reference: Rust Book §8 (Collections), §13 (Iterators)

/// Reads CSV files into raw string tables
pub mod loader;

/// Drops incomplete and identifier columns, parses numbers and labels
pub mod selector;

/// The labelled Dataset type shared by every stage
pub mod dataset;

/// Seeded stratified partitions and folds
pub mod splitter;

#[cfg(test)]
pub mod fixtures;
