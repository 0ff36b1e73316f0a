use crate::{
    camera::{CameraDevice, CameraError, MediaSources},
    snapshot::{self, SnapshotError},
};
use coin_classifier::{
    normalize, ClassificationResult, InferenceEngine, Model, ModelNotReadyError, NormalizedTensor,
    PixelBuffer,
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    ModelNotReady(#[from] ModelNotReadyError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("Pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Outcome of one capture: the classification plus a preview of what was classified.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(flatten)]
    pub result: ClassificationResult,
    pub snapshot: String,
}

/// Acquire, normalize, infer and interpret, strictly in that order.
///
/// Concurrent calls are not serialized; they only share the read-only model.
pub struct CapturePipeline<D: CameraDevice, M: Model> {
    media: MediaSources<D>,
    engine: InferenceEngine<M>,
}

impl<D: CameraDevice, M: Model> CapturePipeline<D, M> {
    pub fn new(media: MediaSources<D>, engine: InferenceEngine<M>) -> Self {
        Self { media, engine }
    }

    pub fn media(&self) -> &MediaSources<D> {
        &self.media
    }

    pub fn model_ready(&self) -> bool {
        self.engine.is_ready()
    }

    pub async fn capture_and_classify(&self) -> Result<Analysis, PipelineError> {
        let frame = self.media.capture_frame().await?;
        self.analyze(frame).await
    }

    pub async fn classify_upload(&self, bytes: Vec<u8>) -> Result<Analysis, PipelineError> {
        let buffer = MediaSources::<D>::decode_file(bytes).await?;
        self.analyze(buffer).await
    }

    #[instrument(skip_all, fields(width = buffer.width(), height = buffer.height()))]
    async fn analyze(&self, buffer: PixelBuffer) -> Result<Analysis, PipelineError> {
        let (snapshot, tensor) = tokio::task::spawn_blocking(
            move || -> Result<(String, NormalizedTensor), SnapshotError> {
                let snapshot = snapshot::data_url(&buffer)?;
                Ok((snapshot, normalize(&buffer)))
            },
        )
        .await??;
        let result = self.engine.classify(tensor).await?;

        tracing::info!(
            label = %result.label,
            confidence = %result.confidence,
            "Classified capture"
        );
        Ok(Analysis { result, snapshot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{DeviceError, FacingMode, VideoConstraints, VideoStream};
    use coin_classifier::{InferenceError, Label, ModelArtifact, ModelLoadError, ModelLoader};
    use ndarray::{Array, Ix4};

    struct StillStream;

    impl VideoStream for StillStream {
        fn read_frame(&mut self) -> Result<PixelBuffer, DeviceError> {
            Ok(PixelBuffer::from_rgb(320, 240, vec![180; 320 * 240 * 3])?)
        }

        fn stop(&mut self) {}
    }

    struct StillCamera;

    impl CameraDevice for StillCamera {
        type Stream = StillStream;

        fn open(&self, _constraints: VideoConstraints) -> Result<StillStream, DeviceError> {
            Ok(StillStream)
        }
    }

    #[derive(Clone)]
    enum MockModel {
        Scores([f32; 2]),
        Fails,
    }

    impl Model for MockModel {
        fn forward(&self, _input: &Array<f32, Ix4>) -> Result<Vec<f32>, InferenceError> {
            match self {
                MockModel::Scores(scores) => Ok(scores.to_vec()),
                MockModel::Fails => Err(InferenceError::Runtime("numeric overflow".to_string())),
            }
        }
    }

    impl ModelArtifact for MockModel {
        type Model = MockModel;

        fn open(&self) -> Result<MockModel, ModelLoadError> {
            Ok(self.clone())
        }
    }

    async fn pipeline(model: MockModel) -> CapturePipeline<StillCamera, MockModel> {
        let loader = ModelLoader::new(model);
        loader.load().await.unwrap();
        CapturePipeline::new(
            MediaSources::new(StillCamera),
            InferenceEngine::new(loader.handle()),
        )
    }

    fn png_upload() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(90, 60, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_capture_heads() -> Result<(), PipelineError> {
        let pipeline = pipeline(MockModel::Scores([0.9, 0.1])).await;
        pipeline.media().start_camera(FacingMode::Environment).await?;

        let analysis = pipeline.capture_and_classify().await?;

        assert_eq!(analysis.result.label, Label::Heads);
        assert_eq!(analysis.result.confidence, "90.00");
        assert!(analysis.snapshot.starts_with("data:image/png;base64,"));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_tie_goes_to_tails() -> Result<(), PipelineError> {
        let pipeline = pipeline(MockModel::Scores([0.5, 0.5])).await;

        let analysis = pipeline.classify_upload(png_upload()).await?;

        assert_eq!(analysis.result.label, Label::Tails);
        assert_eq!(analysis.result.confidence, "50.00");
        Ok(())
    }

    #[tokio::test]
    async fn test_inference_failure_is_absorbed() -> Result<(), PipelineError> {
        let pipeline = pipeline(MockModel::Fails).await;

        let analysis = pipeline.classify_upload(png_upload()).await?;

        assert_eq!(analysis.result, ClassificationResult::unknown());
        Ok(())
    }

    #[tokio::test]
    async fn test_unloaded_model_is_reported() {
        let pipeline = CapturePipeline::new(
            MediaSources::new(StillCamera),
            InferenceEngine::<MockModel>::new(Default::default()),
        );

        assert!(!pipeline.model_ready());
        assert!(matches!(
            pipeline.classify_upload(png_upload()).await,
            Err(PipelineError::ModelNotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_without_camera() {
        let pipeline = pipeline(MockModel::Scores([0.9, 0.1])).await;

        assert!(matches!(
            pipeline.capture_and_classify().await,
            Err(PipelineError::Camera(CameraError::NoActiveStream))
        ));
    }

    #[tokio::test]
    async fn test_analysis_serializes_flat() -> Result<(), Box<dyn std::error::Error>> {
        let pipeline = pipeline(MockModel::Scores([0.2, 0.8])).await;
        let analysis = pipeline.classify_upload(png_upload()).await?;

        let json = serde_json::to_value(&analysis)?;

        assert_eq!(json["label"], "Tails");
        assert_eq!(json["confidence"], "80.00");
        assert!(json["snapshot"].is_string());
        Ok(())
    }
}
