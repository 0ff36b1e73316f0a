#![cfg(feature = "camera-opencv")]

use crate::{
    camera::{CameraDevice, DeviceError, VideoConstraints, VideoStream},
    config::CameraConfig,
};
use coin_classifier::PixelBuffer;
use opencv::{core::Mat, imgproc, prelude::*, videoio};

/// OpenCV capture backend. Facing modes resolve to device indices from config.
#[derive(Debug, Clone)]
pub struct OpenCvCamera {
    config: CameraConfig,
}

impl OpenCvCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Device indices to try, in order, for one open request.
    fn candidate_indices(&self, constraints: VideoConstraints) -> Result<Vec<i32>, DeviceError> {
        match constraints {
            VideoConstraints::Exact(mode) => self
                .config
                .index_for(mode)
                .map(|index| vec![index])
                .ok_or(DeviceError::NoMatchingDevice(constraints)),
            VideoConstraints::Ideal(mode) => {
                let mut indices = Vec::with_capacity(2);
                indices.extend(self.config.index_for(mode));
                if !indices.contains(&self.config.fallback_index) {
                    indices.push(self.config.fallback_index);
                }
                Ok(indices)
            }
        }
    }
}

fn open_index(index: i32) -> Result<videoio::VideoCapture, DeviceError> {
    let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
        .map_err(|e| DeviceError::OpenFailed(e.to_string()))?;
    let opened = capture
        .is_opened()
        .map_err(|e| DeviceError::OpenFailed(e.to_string()))?;
    if !opened {
        return Err(DeviceError::OpenFailed(format!(
            "device {} is not available",
            index
        )));
    }
    Ok(capture)
}

impl CameraDevice for OpenCvCamera {
    type Stream = OpenCvStream;

    fn open(&self, constraints: VideoConstraints) -> Result<OpenCvStream, DeviceError> {
        let mut last_error = DeviceError::NoMatchingDevice(constraints);
        for index in self.candidate_indices(constraints)? {
            match open_index(index) {
                Ok(capture) => {
                    tracing::debug!("Opened capture device {} for {:?}", index, constraints);
                    return Ok(OpenCvStream { capture, index });
                }
                Err(e) => {
                    tracing::debug!("Capture device {} unavailable: {}", index, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

pub struct OpenCvStream {
    capture: videoio::VideoCapture,
    index: i32,
}

impl VideoStream for OpenCvStream {
    fn read_frame(&mut self) -> Result<PixelBuffer, DeviceError> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .map_err(|e| DeviceError::ReadFailed(e.to_string()))?;
        let empty = frame.empty();
        if !grabbed || empty {
            return Err(DeviceError::ReadFailed(format!(
                "device {} returned no frame",
                self.index
            )));
        }

        let mut rgb = Mat::default();
        imgproc::cvt_color_def(&frame, &mut rgb, imgproc::COLOR_BGR2RGB)
            .map_err(|e| DeviceError::ReadFailed(e.to_string()))?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let samples = rgb
            .data_bytes()
            .map_err(|e| DeviceError::ReadFailed(e.to_string()))?
            .to_vec();

        Ok(PixelBuffer::from_rgb(width, height, samples)?)
    }

    fn stop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("Failed to release capture device {}: {}", self.index, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FacingMode;

    fn camera(environment_index: Option<i32>, fallback_index: i32) -> OpenCvCamera {
        OpenCvCamera::new(&CameraConfig {
            facing_mode: FacingMode::Environment,
            environment_index,
            user_index: None,
            fallback_index,
        })
    }

    #[test]
    fn test_exact_requires_configured_device() {
        let camera = camera(Some(0), 3);

        assert_eq!(
            camera
                .candidate_indices(VideoConstraints::Exact(FacingMode::Environment))
                .unwrap(),
            vec![0]
        );
        assert!(matches!(
            camera.candidate_indices(VideoConstraints::Exact(FacingMode::User)),
            Err(DeviceError::NoMatchingDevice(_))
        ));
    }

    #[test]
    fn test_ideal_moves_on_to_fallback_device() {
        let camera = camera(Some(0), 1);

        assert_eq!(
            camera
                .candidate_indices(VideoConstraints::Ideal(FacingMode::Environment))
                .unwrap(),
            vec![0, 1]
        );
        assert_eq!(
            camera
                .candidate_indices(VideoConstraints::Ideal(FacingMode::User))
                .unwrap(),
            vec![1]
        );
    }

    #[test]
    fn test_ideal_does_not_repeat_same_device() {
        let camera = camera(Some(2), 2);

        assert_eq!(
            camera
                .candidate_indices(VideoConstraints::Ideal(FacingMode::Environment))
                .unwrap(),
            vec![2]
        );
    }
}
