use base64::{engine::general_purpose::STANDARD, Engine as _};
use coin_classifier::PixelBuffer;
use image::ImageFormat;
use std::io::Cursor;
use thiserror::Error;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// Renders `buffer` as a PNG data URL for previews.
pub fn data_url(buffer: &PixelBuffer) -> Result<String, SnapshotError> {
    let mut png = Vec::new();
    buffer
        .image()
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + png.len() * 4 / 3 + 4);
    url.push_str(PNG_DATA_URL_PREFIX);
    STANDARD.encode_string(&png, &mut url);
    Ok(url)
}
