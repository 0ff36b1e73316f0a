use crate::{
    interpreter::{interpret, ClassificationResult},
    model::{Model, ModelHandle, ModelNotReadyError},
    normalizer::NormalizedTensor,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error(transparent)]
    NotReady(#[from] ModelNotReadyError),
    #[error("Forward pass failed: {0}")]
    Runtime(String),
    #[error("Unexpected model output: {0}")]
    MalformedOutput(String),
    #[error("Inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Raw classifier output. Index 0 of the model output is heads, index 1 tails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScores {
    pub heads: f32,
    pub tails: f32,
}

impl ClassScores {
    pub fn new(heads: f32, tails: f32) -> Self {
        Self { heads, tails }
    }

    fn from_output(output: &[f32]) -> Result<Self, InferenceError> {
        let [heads, tails] = output else {
            return Err(InferenceError::MalformedOutput(format!(
                "expected 2 scores, got {}",
                output.len()
            )));
        };
        if !heads.is_finite() || !tails.is_finite() {
            return Err(InferenceError::Runtime(format!(
                "non-finite scores heads={} tails={}",
                heads, tails
            )));
        }
        Ok(Self::new(*heads, *tails))
    }
}

#[derive(Debug)]
pub struct InferenceEngine<M: Model> {
    handle: ModelHandle<M>,
}

impl<M: Model> Clone for InferenceEngine<M> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<M: Model> InferenceEngine<M> {
    pub fn new(handle: ModelHandle<M>) -> Self {
        Self { handle }
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ready()
    }

    /// Runs the forward pass on `tensor` and extracts the two class scores.
    ///
    /// The tensor is consumed and dropped as soon as the forward pass returns.
    pub async fn scores(&self, tensor: NormalizedTensor) -> Result<ClassScores, InferenceError> {
        let model = self.handle.get()?;

        let output = tokio::task::spawn_blocking(move || {
            let output = model.forward(tensor.as_array());
            drop(tensor);
            output
        })
        .await??;

        ClassScores::from_output(&output)
    }

    /// Classifies `tensor`, degrading to [`ClassificationResult::unknown`] on
    /// any failure other than a missing model.
    ///
    /// Load-time problems surface as [`ModelNotReadyError`]; shape and numeric
    /// failures during the forward pass are logged and replaced by the
    /// sentinel so a bad frame never interrupts the caller.
    pub async fn classify(
        &self,
        tensor: NormalizedTensor,
    ) -> Result<ClassificationResult, ModelNotReadyError> {
        match self.scores(tensor).await {
            Ok(scores) => {
                tracing::debug!(
                    "Scores heads={:.4} tails={:.4}",
                    scores.heads,
                    scores.tails
                );
                Ok(interpret(scores))
            }
            Err(InferenceError::NotReady(e)) => Err(e),
            Err(e) => {
                tracing::error!("Error during prediction: {}", e);
                Ok(ClassificationResult::unknown())
            }
        }
    }
}
