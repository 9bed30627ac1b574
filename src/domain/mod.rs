// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe the analysis:
//
//   Label        — the five exercise-quality classes A..E
//   Record       — one labelled sensor observation
//   QuizRecord   — one unlabelled observation from the quiz pool
//   PipelineError — the error taxonomy shared by every layer
//
// Rules for this layer:
//   - NO file I/O or network calls
//   - NO model code
//   - Only structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §6 (Enums), §10 (Traits)

/// The class alphabet {A, B, C, D, E}
pub mod label;

/// Labelled and unlabelled sensor records
pub mod record;

/// Error taxonomy (data, training, degenerate split)
pub mod error;

/// Core abstractions (traits) that other layers implement
pub mod traits;
