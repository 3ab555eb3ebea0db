//! Shared types for the image preprocessing pipeline.

use image::DynamicImage;

/// Errors that can occur during image preprocessing operations
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// Failed to load the source image
    ImageLoad { message: String },
    /// Invalid parameters supplied to a preprocessing stage
    InvalidParameters { message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::ImageLoad { message } => {
                write!(f, "Image load failed: {}", message)
            }
            PreprocessingError::InvalidParameters { message } => {
                write!(f, "Invalid preprocessing parameters: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Region of interest expressed as fractions of the image dimensions.
///
/// The default targets the upper-left band of the frame where the channel
/// header and the "Subscribed" badge sit in the supported screenshot layouts.
/// The exact fractions were tuned against observed screenshots, not derived,
/// so they are configuration rather than constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiFractions {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Default for RoiFractions {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.1,
            right: 0.8,
            bottom: 0.5,
        }
    }
}

impl RoiFractions {
    /// A region covering the whole image (crop disabled)
    pub fn full_frame() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: 1.0,
            bottom: 1.0,
        }
    }

    /// Parse "left,top,right,bottom" fractions, e.g. "0.0,0.1,0.8,0.5"
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<f32> = s
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<_, _>>()
            .ok()?;
        if parts.len() != 4 {
            return None;
        }
        let roi = Self {
            left: parts[0],
            top: parts[1],
            right: parts[2],
            bottom: parts[3],
        };
        roi.validate().ok()?;
        Some(roi)
    }

    /// Check the fractions describe a non-empty region within [0, 1]
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("left", self.left),
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("roi {} ({}) must be within [0, 1]", name, value));
            }
        }
        if self.left >= self.right {
            return Err(format!(
                "roi left ({}) must be less than right ({})",
                self.left, self.right
            ));
        }
        if self.top >= self.bottom {
            return Err(format!(
                "roi top ({}) must be less than bottom ({})",
                self.top, self.bottom
            ));
        }
        Ok(())
    }
}

/// Binarization strategy applied after grayscale conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMode {
    /// Fixed luminance cutoff: pixels below become black, others white
    Fixed(u8),
    /// Adaptive mean thresholding with a median-filter denoise pass
    Adaptive,
}

impl Default for ThresholdMode {
    fn default() -> Self {
        // 180 matched the badge contrast best across the observed layouts
        ThresholdMode::Fixed(180)
    }
}

/// Result of cropping an image to its region of interest
#[derive(Debug)]
pub struct CroppedImageResult {
    pub image: DynamicImage,
    /// Pixel rectangle that was extracted (x, y, width, height)
    pub region: (u32, u32, u32, u32),
}

/// Result of binarizing an image
#[derive(Debug)]
pub struct BinarizedImageResult {
    pub image: DynamicImage,
    /// Cutoff that was applied; for adaptive mode this is the global mean
    pub threshold: u8,
    pub processing_time_ms: u32,
}
