use coin_classifier::{PixelBuffer, PixelBufferError};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, sync::Arc};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => f.write_str("user"),
            FacingMode::Environment => f.write_str("environment"),
        }
    }
}

/// How strictly a device must honour the requested facing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoConstraints {
    Exact(FacingMode),
    Ideal(FacingMode),
}

impl VideoConstraints {
    pub fn facing_mode(&self) -> FacingMode {
        match self {
            VideoConstraints::Exact(mode) | VideoConstraints::Ideal(mode) => *mode,
        }
    }
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("No capture device matches {0:?}")]
    NoMatchingDevice(VideoConstraints),
    #[error("Failed to open camera: {0}")]
    OpenFailed(String),
    #[error("Failed to read frame: {0}")]
    ReadFailed(String),
    #[error("Camera returned an unusable frame: {0}")]
    BadFrame(#[from] PixelBufferError),
}

#[derive(Error, Debug)]
#[error("Unable to access the {facing_mode} camera: {source}")]
pub struct CameraAccessError {
    pub facing_mode: FacingMode,
    #[source]
    pub source: DeviceError,
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error(transparent)]
    Access(#[from] CameraAccessError),
    #[error("No camera session is active")]
    NoActiveStream,
    #[error("Failed to capture frame: {0}")]
    Frame(#[from] DeviceError),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Decoded image is unusable: {0}")]
    EmptyImage(#[from] PixelBufferError),
    #[error("Failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Camera task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Platform capture capability.
pub trait CameraDevice: Send + Sync + 'static {
    type Stream: VideoStream;

    fn open(&self, constraints: VideoConstraints) -> Result<Self::Stream, DeviceError>;
}

/// A live hardware stream. The device stays open until `stop` is called.
pub trait VideoStream: Send + 'static {
    fn read_frame(&mut self) -> Result<PixelBuffer, DeviceError>;
    fn stop(&mut self);
}

/// Stops the wrapped stream when dropped, so an abandoned open or a dropped
/// manager never leaves the device running.
struct ActiveStream<S: VideoStream> {
    stream: S,
    stopped: bool,
}

impl<S: VideoStream> ActiveStream<S> {
    fn new(stream: S) -> Self {
        Self {
            stream,
            stopped: false,
        }
    }

    fn read_frame(&mut self) -> Result<PixelBuffer, DeviceError> {
        self.stream.read_frame()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stream.stop();
            self.stopped = true;
        }
    }
}

impl<S: VideoStream> Drop for ActiveStream<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns the single camera session and the file decode path.
pub struct MediaSources<D: CameraDevice> {
    device: Arc<D>,
    session: Mutex<Option<ActiveStream<D::Stream>>>,
}

impl<D: CameraDevice> MediaSources<D> {
    pub fn new(device: D) -> Self {
        Self {
            device: Arc::new(device),
            session: Mutex::new(None),
        }
    }

    /// Stops the current stream, then opens a new one for `facing_mode`.
    ///
    /// Tries an exact facing-mode match first and an ideal match once after
    /// that. There is no fallback to any other facing mode.
    pub async fn start_camera(&self, facing_mode: FacingMode) -> Result<(), CameraError> {
        let mut session = self.session.lock().await;
        if let Some(mut previous) = session.take() {
            previous.stop();
            tracing::debug!("Stopped previous camera stream");
        }

        let stream = match self.open(VideoConstraints::Exact(facing_mode)).await? {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(
                    "Exact facingMode '{}' failed ({}), trying 'ideal' mode.",
                    facing_mode,
                    e
                );
                match self.open(VideoConstraints::Ideal(facing_mode)).await? {
                    Ok(stream) => stream,
                    Err(source) => {
                        tracing::error!("Unable to access camera: {}", source);
                        return Err(CameraAccessError {
                            facing_mode,
                            source,
                        }
                        .into());
                    }
                }
            }
        };

        tracing::info!("Camera started facing {}", facing_mode);
        *session = Some(stream);
        Ok(())
    }

    async fn open(
        &self,
        constraints: VideoConstraints,
    ) -> Result<Result<ActiveStream<D::Stream>, DeviceError>, tokio::task::JoinError> {
        let device = self.device.clone();
        tokio::task::spawn_blocking(move || device.open(constraints).map(ActiveStream::new)).await
    }

    pub async fn stop_camera(&self) {
        if let Some(mut stream) = self.session.lock().await.take() {
            stream.stop();
            tracing::info!("Camera stopped");
        }
    }

    pub async fn is_streaming(&self) -> bool {
        self.session.lock().await.is_some()
    }

    /// Grabs the frame currently shown by the active stream at native resolution.
    pub async fn capture_frame(&self) -> Result<PixelBuffer, CameraError> {
        let mut session = self.session.lock().await;
        let stream = session.as_mut().ok_or(CameraError::NoActiveStream)?;
        Ok(stream.read_frame()?)
    }

    /// Decodes an uploaded image at its natural size.
    pub async fn decode_file(bytes: Vec<u8>) -> Result<PixelBuffer, CameraError> {
        tokio::task::spawn_blocking(move || -> Result<PixelBuffer, CameraError> {
            let image = image::ImageReader::new(std::io::Cursor::new(bytes))
                .with_guessed_format()?
                .decode()?;
            Ok(PixelBuffer::from_image(image)?)
        })
        .await?
    }

    pub async fn open_file(path: impl AsRef<Path>) -> Result<PixelBuffer, CameraError> {
        let bytes = tokio::fs::read(path).await?;
        Self::decode_file(bytes).await
    }
}

/// Device used when no capture backend is compiled in. Every request fails,
/// leaving uploads as the only image source.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCamera;

pub enum NoStream {}

impl VideoStream for NoStream {
    fn read_frame(&mut self) -> Result<PixelBuffer, DeviceError> {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }
}

impl CameraDevice for UnavailableCamera {
    type Stream = NoStream;

    fn open(&self, constraints: VideoConstraints) -> Result<NoStream, DeviceError> {
        Err(DeviceError::NoMatchingDevice(constraints))
    }
}
