mod inference;
mod interpreter;
mod model;
mod model_loader;
mod normalizer;
mod ort_model;
mod pixel_buffer;

pub mod config;

pub use inference::{ClassScores, InferenceEngine, InferenceError};
pub use interpreter::{interpret, ClassificationResult, Label};
pub use model::{Model, ModelHandle, ModelNotReadyError};
pub use model_loader::{ModelArtifact, ModelLoadError, ModelLoader};
pub use normalizer::{normalize, NormalizedTensor, INPUT_SIZE};
pub use ort_model::{OnnxArtifact, OnnxModel};
pub use pixel_buffer::{PixelBuffer, PixelBufferError};
