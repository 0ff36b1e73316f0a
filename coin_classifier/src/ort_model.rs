use crate::{
    config::ModelConfig,
    inference::InferenceError,
    model::Model,
    model_loader::{ModelArtifact, ModelLoadError},
};
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{path::PathBuf, sync::Mutex};

fn runtime_error(e: impl std::fmt::Display) -> ModelLoadError {
    ModelLoadError::Runtime(e.to_string())
}

/// ONNX export of the heads/tails classifier on disk.
#[derive(Debug, Clone)]
pub struct OnnxArtifact {
    path: PathBuf,
}

impl OnnxArtifact {
    pub fn new(model_config: &ModelConfig) -> Self {
        Self {
            path: model_config.get_path(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ModelArtifact for OnnxArtifact {
    type Model = OnnxModel;

    fn open(&self) -> Result<OnnxModel, ModelLoadError> {
        if !self.path.exists() {
            return Err(ModelLoadError::NotFound(self.path.clone()));
        }

        let session = Session::builder()
            .map_err(runtime_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime_error)?
            .commit_from_file(&self.path)
            .map_err(runtime_error)?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(ModelLoadError::MissingOutput)?;

        tracing::info!("Opened ONNX session from {:?}", self.path);

        Ok(OnnxModel {
            session: Mutex::new(session),
            output_name,
        })
    }
}

pub struct OnnxModel {
    session: Mutex<Session>,
    output_name: String,
}

impl Model for OnnxModel {
    fn forward(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, InferenceError> {
        let mut session = self
            .session
            .lock()
            .map_err(|e| InferenceError::Runtime(format!("session mutex poisoned: {}", e)))?;

        let owned_buffer;
        let input_view = if input.view().is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().to_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| InferenceError::Runtime(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Runtime(format!("inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            InferenceError::MalformedOutput(format!("output {} missing", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::MalformedOutput(format!("{}", e)))?;

        tracing::debug!("Forward pass produced shape {:?}", shape);

        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_missing_file() {
        let artifact = OnnxArtifact::from_path("does/not/exist/model.onnx");
        let result = artifact.open();
        assert!(matches!(result, Err(ModelLoadError::NotFound(_))));
    }

    #[test]
    fn test_open_malformed_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"definitely not a protobuf graph")?;

        let artifact = OnnxArtifact::from_path(file.path());
        let result = artifact.open();

        assert!(matches!(result, Err(ModelLoadError::Runtime(_))));
        Ok(())
    }

    #[test]
    fn test_artifact_path_from_config() {
        let artifact = OnnxArtifact::new(&ModelConfig::default());
        assert_eq!(artifact.path, PathBuf::from("heads_tails_model/model.onnx"));
    }
}
