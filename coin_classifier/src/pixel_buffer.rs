use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PixelBufferError {
    #[error("Pixel buffer must not be empty, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("Sample buffer of {len} bytes does not fit a {width}x{height} frame")]
    SizeMismatch { width: u32, height: u32, len: usize },
}

/// A decoded RGB(A) frame at its native resolution.
///
/// Buffers are never empty: every constructor rejects a zero width or height,
/// so downstream resizing can rely on a real source rectangle.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: DynamicImage,
}

impl PixelBuffer {
    pub fn from_image(image: DynamicImage) -> Result<Self, PixelBufferError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PixelBufferError::Empty { width, height });
        }
        Ok(Self { image })
    }

    /// Wraps packed 8-bit RGB samples, row-major.
    pub fn from_rgb(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, PixelBufferError> {
        let len = samples.len();
        let image = RgbImage::from_raw(width, height, samples)
            .ok_or(PixelBufferError::SizeMismatch { width, height, len })?;
        Self::from_image(DynamicImage::ImageRgb8(image))
    }

    /// Wraps packed 8-bit RGBA samples, row-major.
    pub fn from_rgba(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, PixelBufferError> {
        let len = samples.len();
        let image = RgbaImage::from_raw(width, height, samples)
            .ok_or(PixelBufferError::SizeMismatch { width, height, len })?;
        Self::from_image(DynamicImage::ImageRgba8(image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}
