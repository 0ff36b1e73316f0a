use crate::inference::InferenceError;
use ndarray::{Array, Ix4};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Model is not loaded yet")]
pub struct ModelNotReadyError;

/// A loaded classifier able to run a single forward pass.
pub trait Model: Send + Sync + 'static {
    /// Runs the forward pass and returns the flattened output scores.
    fn forward(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, InferenceError>;
}

/// Shared slot for the loaded model.
///
/// Starts empty; the loader fills it once the artifact is open. Readers clone
/// the inner `Arc` so a reload never blocks a running forward pass.
pub struct ModelHandle<M: Model> {
    slot: Arc<RwLock<Option<Arc<M>>>>,
}

impl<M: Model> ModelHandle<M> {
    pub fn empty() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn get(&self) -> Result<Arc<M>, ModelNotReadyError> {
        self.slot.read().clone().ok_or(ModelNotReadyError)
    }

    pub(crate) fn install(&self, model: M) {
        *self.slot.write() = Some(Arc::new(model));
    }
}

impl<M: Model> Clone for ModelHandle<M> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<M: Model> Default for ModelHandle<M> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<M: Model> std::fmt::Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("ready", &self.is_ready())
            .finish()
    }
}
