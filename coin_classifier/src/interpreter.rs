use crate::inference::ClassScores;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Heads,
    Tails,
    Unknown,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Heads => "Heads",
            Label::Tails => "Tails",
            Label::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Label,
    /// Percentage with two decimals, or `"0"` for the unknown sentinel.
    pub confidence: String,
}

impl ClassificationResult {
    pub fn unknown() -> Self {
        Self {
            label: Label::Unknown,
            confidence: "0".to_string(),
        }
    }
}

/// Maps raw scores to a label and a confidence percentage.
///
/// Heads only wins on a strictly greater score; ties go to tails.
pub fn interpret(scores: ClassScores) -> ClassificationResult {
    let label = if scores.heads > scores.tails {
        Label::Heads
    } else {
        Label::Tails
    };
    let best = scores.heads.max(scores.tails);

    ClassificationResult {
        label,
        confidence: format_percentage(f64::from(best) * 100.0),
    }
}

// Half-up to two decimals.
fn format_percentage(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{:.2}", rounded)
}
