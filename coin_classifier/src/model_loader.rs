use crate::model::{Model, ModelHandle};
use std::{path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to open model: {0}")]
    Runtime(String),
    #[error("Model declares no outputs")]
    MissingOutput,
    #[error("Model loading task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Something that can be opened into a runnable model.
pub trait ModelArtifact: Send + Sync + 'static {
    type Model: Model;

    fn open(&self) -> Result<Self::Model, ModelLoadError>;
}

/// Opens a model artifact and publishes it through a [`ModelHandle`].
pub struct ModelLoader<A: ModelArtifact> {
    artifact: Arc<A>,
    handle: ModelHandle<A::Model>,
}

impl<A: ModelArtifact> ModelLoader<A> {
    pub fn new(artifact: A) -> Self {
        Self {
            artifact: Arc::new(artifact),
            handle: ModelHandle::empty(),
        }
    }

    pub fn handle(&self) -> ModelHandle<A::Model> {
        self.handle.clone()
    }

    /// Opens the artifact once and installs it.
    ///
    /// Calling this again re-opens the artifact and replaces the installed
    /// model. On failure the handle keeps whatever it held before.
    pub async fn load(&self) -> Result<(), ModelLoadError> {
        let artifact = self.artifact.clone();
        let opened = tokio::task::spawn_blocking(move || artifact.open())
            .await
            .map_err(ModelLoadError::from)
            .and_then(|result| result);

        match opened {
            Ok(model) => {
                self.handle.install(model);
                tracing::info!("Model loaded successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error loading model: {}", e);
                Err(e)
            }
        }
    }
}
