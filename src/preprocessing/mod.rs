//! # Image Preprocessing Module
//!
//! This module transforms raw screenshots into a form that maximizes OCR
//! accuracy: crop to the region of interest, convert to grayscale, and
//! binarize. The module is organized into focused sub-modules:
//! - `cropping`: fractional region-of-interest extraction
//! - `thresholding`: fixed-cutoff and adaptive binarization
//! - `filtering`: median-filter noise reduction
//! - `types`: shared types and error definitions

pub mod cropping;
pub mod filtering;
pub mod thresholding;
pub mod types;

// Re-export commonly used types and functions for convenience
pub use cropping::crop_roi;
pub use filtering::median_filter;
pub use thresholding::binarize;
pub use types::{
    BinarizedImageResult, CroppedImageResult, PreprocessingError, RoiFractions, ThresholdMode,
};

use image::DynamicImage;

/// Run the full preprocessing chain on an already-loaded image:
/// ROI crop, grayscale, binarization.
pub fn preprocess_image(
    image: &DynamicImage,
    roi: &RoiFractions,
    threshold: ThresholdMode,
) -> Result<DynamicImage, PreprocessingError> {
    let cropped = crop_roi(image, roi)?;
    let binarized = binarize(&cropped.image, threshold)?;
    Ok(binarized.image)
}

/// Load an image from disk and run the full preprocessing chain on it.
///
/// The input file is only read; the transform happens in memory.
pub fn preprocess_file(
    image_path: &str,
    roi: &RoiFractions,
    threshold: ThresholdMode,
) -> Result<DynamicImage, PreprocessingError> {
    let img = image::open(image_path).map_err(|e| PreprocessingError::ImageLoad {
        message: format!("Failed to load image '{}': {}", image_path, e),
    })?;
    preprocess_image(&img, roi, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    #[test]
    fn test_preprocess_image_produces_binary_roi() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([200, 200, 200]));
        for x in 10..30 {
            for y in 15..25 {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }

        let processed = preprocess_image(
            &DynamicImage::ImageRgb8(img),
            &RoiFractions::default(),
            ThresholdMode::Fixed(128),
        )
        .expect("preprocessing should succeed");

        // Default ROI of a 100x100 image is 80x40
        assert_eq!(processed.width(), 80);
        assert_eq!(processed.height(), 40);
        for pixel in processed.to_luma8().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_preprocess_file_missing_file() {
        let result = preprocess_file(
            "definitely-not-here.png",
            &RoiFractions::default(),
            ThresholdMode::default(),
        );
        assert!(matches!(
            result,
            Err(PreprocessingError::ImageLoad { .. })
        ));
    }
}
