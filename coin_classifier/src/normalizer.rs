use crate::pixel_buffer::PixelBuffer;
use ndarray::{Array, Ix4};

/// Side length of the square input the classifier was trained on.
pub const INPUT_SIZE: u32 = 224;

/// Model input in NHWC layout: `[1, INPUT_SIZE, INPUT_SIZE, 3]`, values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct NormalizedTensor {
    array: Array<f32, Ix4>,
}

impl NormalizedTensor {
    pub fn shape(&self) -> &[usize] {
        self.array.shape()
    }

    pub fn as_array(&self) -> &Array<f32, Ix4> {
        &self.array
    }
}

/// Resizes `buffer` to `INPUT_SIZE` x `INPUT_SIZE` with bilinear sampling,
/// ignoring the source aspect ratio, and scales samples from `[0, 255]` to `[0, 1]`.
///
/// Sampling uses corner-aligned-off, no half-pixel-offset coordinates:
/// output pixel `d` reads source position `d * in / out`, blending the two
/// neighbours `floor` and `min(floor + 1, in - 1)` on each axis.
///
/// Alpha is dropped. The source buffer is left untouched.
pub fn normalize(buffer: &PixelBuffer) -> NormalizedTensor {
    let rgb = buffer.image().to_rgb8();
    let (in_width, in_height) = rgb.dimensions();

    let side = INPUT_SIZE as usize;
    let columns = sample_axis(in_width, INPUT_SIZE);
    let rows = sample_axis(in_height, INPUT_SIZE);

    let mut array = Array::zeros((1, side, side, 3));
    for (y, &(y0, y1, dy)) in rows.iter().enumerate() {
        for (x, &(x0, x1, dx)) in columns.iter().enumerate() {
            let top_left = rgb.get_pixel(x0, y0).0;
            let top_right = rgb.get_pixel(x1, y0).0;
            let bottom_left = rgb.get_pixel(x0, y1).0;
            let bottom_right = rgb.get_pixel(x1, y1).0;
            for channel in 0..3 {
                let top = lerp(top_left[channel], top_right[channel], dx);
                let bottom = lerp(bottom_left[channel], bottom_right[channel], dx);
                array[[0, y, x, channel]] = (top + (bottom - top) * dy) / 255.;
            }
        }
    }

    NormalizedTensor { array }
}

// (low index, high index, fraction) for every output coordinate along one axis.
fn sample_axis(input: u32, output: u32) -> Vec<(u32, u32, f32)> {
    let scale = input as f32 / output as f32;
    (0..output)
        .map(|d| {
            let src = d as f32 * scale;
            let low = (src.floor() as u32).min(input - 1);
            let high = (low + 1).min(input - 1);
            (low, high, src - low as f32)
        })
        .collect()
}

fn lerp(a: u8, b: u8, t: f32) -> f32 {
    let a = a as f32;
    a + (b as f32 - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, Rgb, Rgba};

    fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> PixelBuffer {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(width, height, Rgb(color));
        PixelBuffer::from_image(DynamicImage::ImageRgb8(img)).unwrap()
    }

    #[test]
    fn test_normalize_shape_for_any_resolution() {
        for (width, height) in [(1, 1), (100, 100), (640, 480), (37, 1000), (1920, 1080)] {
            let tensor = normalize(&solid_rgb(width, height, [12, 200, 99]));
            assert_eq!(tensor.shape(), &[1, 224, 224, 3], "{}x{}", width, height);
            assert!(tensor
                .as_array()
                .iter()
                .all(|value| (0.0..=1.0).contains(value)));
        }
    }

    #[test]
    fn test_normalize_scales_to_unit_range() {
        let tensor = normalize(&solid_rgb(300, 100, [255, 0, 51]));
        let array = tensor.as_array();

        assert!((array[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(array[[0, 111, 57, 1]].abs() < 1e-6);
        assert!((array[[0, 223, 223, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_samples_stripes_without_averaging() {
        let img = ImageBuffer::from_fn(448, 448, |x, _| {
            if x % 2 == 0 {
                Rgb([0u8, 0, 0])
            } else {
                Rgb([255u8, 255, 255])
            }
        });
        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgb8(img)).unwrap();

        let tensor = normalize(&buffer);
        let array = tensor.as_array();

        // Output column 100 reads source column 200 exactly.
        assert_eq!(array[[0, 100, 100, 0]], 0.0);
        assert!(array.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn test_normalize_interpolates_between_neighbours() {
        let img = ImageBuffer::from_fn(112, 112, |x, _| Rgb([(x * 2) as u8, 0, 0]));
        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgb8(img)).unwrap();

        let tensor = normalize(&buffer);
        let array = tensor.as_array();

        // Column 3 sits halfway between source columns 1 and 2.
        assert!((array[[0, 0, 3, 0]] - 3.0 / 255.).abs() < 1e-6);
        assert!((array[[0, 50, 4, 0]] - 4.0 / 255.).abs() < 1e-6);
        // The last column clamps to the final source column.
        assert!((array[[0, 0, 223, 0]] - 222.0 / 255.).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_downscale_picks_sampled_rows() {
        let img = ImageBuffer::from_fn(10, 448, |_, y| Rgb([0, (y % 256) as u8, 0]));
        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgb8(img)).unwrap();

        let tensor = normalize(&buffer);

        // Output row 60 reads source row 120.
        assert!((tensor.as_array()[[0, 60, 0, 1]] - 120.0 / 255.).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_drops_alpha() {
        let img = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_pixel(50, 80, Rgba([0, 255, 0, 10]));
        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgba8(img)).unwrap();

        let tensor = normalize(&buffer);

        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        assert!((tensor.as_array()[[0, 10, 10, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_leaves_input_untouched() {
        let mut img = ImageBuffer::<Rgb<u8>, Vec<u8>>::new(64, 48);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([x as u8, y as u8, (x + y) as u8]);
        }
        let buffer = PixelBuffer::from_image(DynamicImage::ImageRgb8(img.clone())).unwrap();

        let _ = normalize(&buffer);

        assert_eq!(buffer.width(), 64);
        assert_eq!(buffer.height(), 48);
        assert_eq!(buffer.image().to_rgb8().into_raw(), img.into_raw());
    }
}
