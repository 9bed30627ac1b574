// ============================================================
// Layer 3 — Label Domain Type
// ============================================================
// The dataset grades every repetition of the dumbbell curl
// into one of five classes:
//
//   A — performed exactly to specification
//   B — elbows thrown to the front
//   C — dumbbell lifted only halfway
//   D — dumbbell lowered only halfway
//   E — hips thrown to the front
//
// The alphabet is closed, so it is an enum with a dense
// index 0..5 used for vote counting and confusion matrices.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    A,
    B,
    C,
    D,
    E,
}

impl Label {
    /// Number of classes in the alphabet
    pub const COUNT: usize = 5;

    /// Every label in index order
    pub const ALL: [Label; Label::COUNT] = [Label::A, Label::B, Label::C, Label::D, Label::E];

    /// Dense index in 0..COUNT
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
            Label::E => "E",
        }
    }

    /// Majority vote over a per-class count array.
    /// Ties resolve to the lowest label index.
    pub fn argmax(counts: &[usize; Label::COUNT]) -> Label {
        let mut best = 0usize;
        for (i, &c) in counts.iter().enumerate().skip(1) {
            if c > counts[best] {
                best = i;
            }
        }
        Label::ALL[best]
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Label {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(Label::A),
            "B" => Ok(Label::B),
            "C" => Ok(Label::C),
            "D" => Ok(Label::D),
            "E" => Ok(Label::E),
            other => Err(PipelineError::UnknownLabel(other.to_string())),
        }
    }
}
