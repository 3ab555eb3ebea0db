//! # Image Cropping Module
//!
//! This module crops screenshots to the region of interest before OCR.
//! Subscription screenshots carry the channel header and the "Subscribed"
//! badge in a predictable band of the frame; cropping away the rest removes
//! most of the noise the OCR engines would otherwise trip on.

use tracing;

use super::types::{CroppedImageResult, PreprocessingError, RoiFractions};
use image::DynamicImage;

/// Crops an image to the fractional region of interest.
///
/// Fractions are clamped to the image bounds and the resulting region is
/// guaranteed to be at least one pixel in each dimension, so a degenerate
/// ROI never produces an empty image.
///
/// # Arguments
///
/// * `image` - The source image
/// * `roi` - Fractional coordinates relative to width/height
///
/// # Errors
///
/// Returns `PreprocessingError::InvalidParameters` if the fractions do not
/// describe a valid region.
pub fn crop_roi(
    image: &DynamicImage,
    roi: &RoiFractions,
) -> Result<CroppedImageResult, PreprocessingError> {
    roi.validate()
        .map_err(|message| PreprocessingError::InvalidParameters { message })?;

    let width = image.width();
    let height = image.height();

    let left = (width as f32 * roi.left) as u32;
    let top = (height as f32 * roi.top) as u32;
    let right = ((width as f32 * roi.right) as u32).min(width);
    let bottom = ((height as f32 * roi.bottom) as u32).min(height);

    // Clamp to at least one pixel in each dimension
    let left = left.min(width.saturating_sub(1));
    let top = top.min(height.saturating_sub(1));
    let crop_width = (right.saturating_sub(left)).max(1);
    let crop_height = (bottom.saturating_sub(top)).max(1);

    let cropped = image.crop_imm(left, top, crop_width, crop_height);

    tracing::debug!(
        "Cropped ROI from {}x{} image: fractions {:?}, region {}x{} at ({}, {})",
        width,
        height,
        roi,
        crop_width,
        crop_height,
        left,
        top
    );

    Ok(CroppedImageResult {
        image: cropped,
        region: (left, top, crop_width, crop_height),
    })
}
