//! # Image Thresholding Module
//!
//! This module provides binary thresholding functionality for OCR
//! preprocessing. Screenshots are converted to grayscale and binarized with
//! either a fixed luminance cutoff or adaptive mean thresholding.

use image::DynamicImage;
use tracing;

use super::filtering::median_filter;
use super::types::{BinarizedImageResult, PreprocessingError, ThresholdMode};

/// Window radius for adaptive mean thresholding (15x15 neighborhood)
const ADAPTIVE_WINDOW_RADIUS: u32 = 7;

/// Offset subtracted from the local mean before comparison; biases the
/// cutoff so anti-aliased glyph edges stay part of the glyph
const ADAPTIVE_MEAN_OFFSET: i16 = 10;

/// Binarize an image according to the configured threshold mode.
///
/// `Fixed(cutoff)` converts to grayscale and maps every pixel below the
/// cutoff to black and the rest to white. `Adaptive` first runs a 3x3
/// median filter to knock out salt-and-pepper noise, then compares each
/// pixel against the mean of its neighborhood.
///
/// The result is a black-on-white binary image ready for OCR.
pub fn binarize(
    image: &DynamicImage,
    mode: ThresholdMode,
) -> Result<BinarizedImageResult, PreprocessingError> {
    let start_time = std::time::Instant::now();

    let result = match mode {
        ThresholdMode::Fixed(cutoff) => apply_fixed_threshold(image, cutoff),
        ThresholdMode::Adaptive => apply_adaptive_threshold(image),
    }?;

    let processing_time = start_time.elapsed();

    tracing::debug!(
        target: "ocr_preprocessing",
        "Binarization completed in {}ms: mode={:?}, threshold={}, dimensions={}x{}",
        processing_time.as_millis(),
        mode,
        result.threshold,
        result.image.width(),
        result.image.height()
    );

    Ok(BinarizedImageResult {
        processing_time_ms: processing_time.as_millis() as u32,
        ..result
    })
}

/// Fixed-cutoff binarization: grayscale, then point threshold.
fn apply_fixed_threshold(
    image: &DynamicImage,
    cutoff: u8,
) -> Result<BinarizedImageResult, PreprocessingError> {
    let gray = image.to_luma8();
    let mut binary = image::GrayImage::new(gray.width(), gray.height());

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] < cutoff { 0u8 } else { 255u8 };
        binary.put_pixel(x, y, image::Luma([value]));
    }

    Ok(BinarizedImageResult {
        image: DynamicImage::ImageLuma8(binary),
        threshold: cutoff,
        processing_time_ms: 0,
    })
}

/// Adaptive mean binarization with a median-filter denoise pass.
fn apply_adaptive_threshold(
    image: &DynamicImage,
) -> Result<BinarizedImageResult, PreprocessingError> {
    let gray = image.to_luma8();
    let denoised = median_filter(&gray);

    let width = denoised.width();
    let height = denoised.height();
    let mut binary = image::GrayImage::new(width, height);

    // Integral image so each local mean is O(1)
    let integral = build_integral_image(&denoised);

    let mut global_sum = 0u64;
    for pixel in denoised.pixels() {
        global_sum += u64::from(pixel[0]);
    }
    let global_mean = (global_sum / u64::from(width) / u64::from(height.max(1))) as u8;

    for y in 0..height {
        for x in 0..width {
            let x0 = x.saturating_sub(ADAPTIVE_WINDOW_RADIUS);
            let y0 = y.saturating_sub(ADAPTIVE_WINDOW_RADIUS);
            let x1 = (x + ADAPTIVE_WINDOW_RADIUS).min(width - 1);
            let y1 = (y + ADAPTIVE_WINDOW_RADIUS).min(height - 1);

            let area = u64::from(x1 - x0 + 1) * u64::from(y1 - y0 + 1);
            let sum = region_sum(&integral, width, x0, y0, x1, y1);
            let local_mean = (sum / area) as i16;

            let pixel = i16::from(denoised.get_pixel(x, y)[0]);
            let value = if pixel < local_mean - ADAPTIVE_MEAN_OFFSET {
                0u8
            } else {
                255u8
            };
            binary.put_pixel(x, y, image::Luma([value]));
        }
    }

    Ok(BinarizedImageResult {
        image: DynamicImage::ImageLuma8(binary),
        threshold: global_mean,
        processing_time_ms: 0,
    })
}

/// Summed-area table with one extra row/column of zeros
fn build_integral_image(gray: &image::GrayImage) -> Vec<u64> {
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    let stride = width + 1;
    let mut integral = vec![0u64; stride * (height + 1)];

    for y in 0..height {
        let mut row_sum = 0u64;
        for x in 0..width {
            row_sum += u64::from(gray.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * stride + (x + 1)] = integral[y * stride + (x + 1)] + row_sum;
        }
    }

    integral
}

/// Sum of the inclusive pixel rectangle [x0..=x1] x [y0..=y1]
fn region_sum(integral: &[u64], width: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> u64 {
    let stride = width as usize + 1;
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);
    integral[(y1 + 1) * stride + (x1 + 1)] + integral[y0 * stride + x0]
        - integral[y0 * stride + (x1 + 1)]
        - integral[(y1 + 1) * stride + x0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn two_band_image() -> DynamicImage {
        // Left half dark, right half light
        let mut img = image::GrayImage::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                let value = if x < 5 { 25u8 } else { 225u8 };
                img.put_pixel(x, y, image::Luma([value]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_fixed_threshold_is_binary() {
        let img = two_band_image();
        let result =
            binarize(&img, ThresholdMode::Fixed(128)).expect("fixed binarization should succeed");

        assert_eq!(result.threshold, 128);
        for pixel in result.image.to_luma8().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_fixed_threshold_separates_bands() {
        let img = two_band_image();
        let result =
            binarize(&img, ThresholdMode::Fixed(128)).expect("fixed binarization should succeed");

        let binary = result.image.to_luma8();
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 0)[0], 255);
    }

    #[test]
    fn test_adaptive_threshold_is_binary() {
        let img = two_band_image();
        let result =
            binarize(&img, ThresholdMode::Adaptive).expect("adaptive binarization should succeed");

        for pixel in result.image.to_luma8().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_adaptive_threshold_uniform_image() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            8,
            8,
            image::Luma([128]),
        ));
        let result = binarize(&img, ThresholdMode::Adaptive)
            .expect("adaptive binarization should succeed on uniform input");

        // A uniform image has no pixels below (local mean - offset), so
        // everything stays white
        for pixel in result.image.to_luma8().pixels() {
            assert_eq!(pixel[0], 255);
        }
    }

    #[test]
    fn test_integral_image_region_sum() {
        let mut img = image::GrayImage::new(4, 4);
        for (i, pixel) in img.pixels_mut().enumerate() {
            pixel[0] = (i + 1) as u8;
        }

        let integral = build_integral_image(&img);
        // Whole image: 1 + 2 + ... + 16 = 136
        assert_eq!(region_sum(&integral, 4, 0, 0, 3, 3), 136);
        // Top-left 2x2 block: 1 + 2 + 5 + 6 = 14
        assert_eq!(region_sum(&integral, 4, 0, 0, 1, 1), 14);
    }
}
