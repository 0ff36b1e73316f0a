use coin_classifier::Label;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please enter your initials.")]
    MissingInitials,
}

/// A classification tagged by the person who flipped the coin.
///
/// Submissions are only logged; nothing is stored or transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub initials: String,
    pub outcome: Label,
    pub confidence: String,
}

impl Submission {
    pub fn new(initials: &str, outcome: Label, confidence: String) -> Result<Self, SubmissionError> {
        let initials = initials.trim();
        if initials.is_empty() {
            return Err(SubmissionError::MissingInitials);
        }
        Ok(Self {
            initials: initials.to_string(),
            outcome,
            confidence,
        })
    }

    pub fn send(self) {
        tracing::info!(
            initials = %self.initials,
            outcome = %self.outcome,
            confidence = %self.confidence,
            "Sending result"
        );
    }
}
