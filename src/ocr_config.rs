//! # OCR Configuration Module
//!
//! This module defines configuration structures for the verification OCR
//! pipeline: language fallback chains, recovery settings, format limits,
//! preprocessing parameters, and the hosted backend account settings.

use crate::preprocessing::types::{RoiFractions, ThresholdMode};

// Constants for OCR configuration
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB limit for image files

/// Default per-call OCR timeout. A hanging engine is abandoned after this
/// long and the pipeline moves to the next language/backend.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 12;

/// Languages the verification pipeline attempts, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrLanguage {
    English,
    Arabic,
    Russian,
}

impl OcrLanguage {
    /// Tesseract traineddata code for this language
    pub fn tesseract_code(&self) -> &'static str {
        match self {
            OcrLanguage::English => "eng",
            OcrLanguage::Arabic => "ara",
            OcrLanguage::Russian => "rus",
        }
    }

    /// Language code expected by the hosted OCR API
    pub fn hosted_code(&self) -> &'static str {
        // OCR.space uses the same three-letter codes as Tesseract for these
        self.tesseract_code()
    }
}

/// Join a language chain into a Tesseract multi-language string ("eng+ara+rus")
pub fn tesseract_language_string(chain: &[OcrLanguage]) -> String {
    chain
        .iter()
        .map(|l| l.tesseract_code())
        .collect::<Vec<_>>()
        .join("+")
}

/// Recovery configuration for error handling
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single OCR backend invocation in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 1000, // 1 second
            max_retry_delay_ms: 10000, // 10 seconds
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

impl RecoveryConfig {
    /// Validate recovery configuration parameters
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.max_retries == 0 {
            return Err(crate::errors::AppError::Config(
                "max_retries must be greater than 0".to_string(),
            ));
        }
        if self.base_retry_delay_ms == 0 {
            return Err(crate::errors::AppError::Config(
                "base_retry_delay_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_retry_delay_ms < self.base_retry_delay_ms {
            return Err(crate::errors::AppError::Config(format!(
                "max_retry_delay_ms ({}) must be >= base_retry_delay_ms ({})",
                self.max_retry_delay_ms, self.base_retry_delay_ms
            )));
        }
        if self.operation_timeout_secs == 0 {
            return Err(crate::errors::AppError::Config(
                "operation_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(crate::errors::AppError::Config(
                "circuit_breaker_threshold must be greater than 0".to_string(),
            ));
        }
        if self.circuit_breaker_reset_secs == 0 {
            return Err(crate::errors::AppError::Config(
                "circuit_breaker_reset_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format-specific file size limits for different image formats
#[derive(Debug, Clone)]
pub struct FormatSizeLimits {
    /// PNG format limit (higher due to better compression)
    pub png_max: u64,
    /// JPEG format limit (moderate due to lossy compression)
    pub jpeg_max: u64,
    /// BMP format limit (lower due to uncompressed nature)
    pub bmp_max: u64,
    /// TIFF format limit (can be large, multi-page support)
    pub tiff_max: u64,
    /// Minimum file size threshold for quick rejection
    pub min_quick_reject: u64,
}

impl Default for FormatSizeLimits {
    fn default() -> Self {
        Self {
            png_max: 15 * 1024 * 1024,          // 15MB for PNG
            jpeg_max: 10 * 1024 * 1024,         // 10MB for JPEG
            bmp_max: 5 * 1024 * 1024,           // 5MB for BMP
            tiff_max: 20 * 1024 * 1024,         // 20MB for TIFF
            min_quick_reject: 50 * 1024 * 1024, // 50MB quick reject
        }
    }
}

impl FormatSizeLimits {
    /// Validate format size limits
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        for (name, value) in [
            ("png_max", self.png_max),
            ("jpeg_max", self.jpeg_max),
            ("bmp_max", self.bmp_max),
            ("tiff_max", self.tiff_max),
            ("min_quick_reject", self.min_quick_reject),
        ] {
            if value == 0 {
                return Err(crate::errors::AppError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        // Ensure format limits are reasonable compared to each other
        if self.bmp_max > self.png_max {
            return Err(crate::errors::AppError::Config(format!(
                "bmp_max ({}) should not exceed png_max ({})",
                self.bmp_max, self.png_max
            )));
        }
        if self.jpeg_max > self.png_max {
            return Err(crate::errors::AppError::Config(format!(
                "jpeg_max ({}) should not exceed png_max ({})",
                self.jpeg_max, self.png_max
            )));
        }

        Ok(())
    }
}

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Orientation and script detection (OSD) only
    OsdOnly = 0,
    /// Automatic page segmentation with OSD
    AutoOsd = 1,
    /// Automatic page segmentation, no OSD
    AutoNoOsd = 2,
    /// Fully automatic page segmentation
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of vertically aligned text
    SingleBlockVert = 5,
    /// Assume a single uniform block of text (subscription screenshots are
    /// one badge row plus the channel header, so this is the default)
    #[default]
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
    /// Treat the image as a single word
    SingleWord = 8,
    /// Find as much text as possible in no particular order
    SparseText = 11,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::OsdOnly => "0",
            PageSegMode::AutoOsd => "1",
            PageSegMode::AutoNoOsd => "2",
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlockVert => "5",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::SparseText => "11",
        }
    }
}

/// Account and retry settings for the hosted OCR HTTP backend
#[derive(Debug, Clone)]
pub struct HostedOcrConfig {
    /// Endpoint of the parse API
    pub endpoint: String,
    /// API key sent as the `apikey` form field
    pub api_key: String,
    /// OCR engine selector sent as the `OCREngine` form field
    pub engine: u8,
    /// Maximum attempts per request (429 responses consume attempts)
    pub max_retries: u32,
    /// Base delay between failed-transport retries in seconds
    pub retry_delay_secs: u64,
    /// In-process hourly request budget; exhausted budget short-circuits
    pub hourly_limit: u32,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for HostedOcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.ocr.space/parse/image".to_string(),
            api_key: String::new(),
            engine: 1,
            max_retries: 3,
            retry_delay_secs: 5,
            hourly_limit: 300,
            request_timeout_secs: 10,
        }
    }
}

impl HostedOcrConfig {
    /// Validate hosted backend settings
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.endpoint.is_empty() {
            return Err(crate::errors::AppError::Config(
                "hosted OCR endpoint must not be empty".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(crate::errors::AppError::Config(
                "hosted OCR max_retries must be greater than 0".to_string(),
            ));
        }
        if self.hourly_limit == 0 {
            return Err(crate::errors::AppError::Config(
                "hosted OCR hourly_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration structure for the OCR verification pipeline
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Languages attempted in order; outputs are concatenated
    pub language_chain: Vec<OcrLanguage>,
    /// Default page segmentation mode for Tesseract
    pub psm_mode: PageSegMode,
    /// Buffer size for format detection in bytes
    pub buffer_size: usize,
    /// Minimum bytes required for format detection
    pub min_format_bytes: usize,
    /// Maximum allowed file size in bytes (general limit)
    pub max_file_size: u64,
    /// Format-specific size limits
    pub format_limits: FormatSizeLimits,
    /// Recovery and error handling configuration
    pub recovery: RecoveryConfig,
    /// Region of interest cropped before OCR
    pub roi: RoiFractions,
    /// Binarization strategy applied after grayscale conversion
    pub threshold: ThresholdMode,
    /// Hosted backend settings; `None` disables the hosted backend
    pub hosted: Option<HostedOcrConfig>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language_chain: vec![
                OcrLanguage::English,
                OcrLanguage::Arabic,
                OcrLanguage::Russian,
            ],
            psm_mode: PageSegMode::default(),
            buffer_size: FORMAT_DETECTION_BUFFER_SIZE,
            min_format_bytes: MIN_FORMAT_BYTES,
            max_file_size: MAX_FILE_SIZE,
            format_limits: FormatSizeLimits::default(),
            recovery: RecoveryConfig::default(),
            roi: RoiFractions::default(),
            threshold: ThresholdMode::default(),
            hosted: None,
        }
    }
}

impl OcrConfig {
    /// Build the configuration from environment variables, falling back to
    /// defaults for everything not set.
    ///
    /// Recognized variables: `OCR_TIMEOUT_SECS`, `OCR_SPACE_API_KEY`,
    /// `OCR_ROI` (four comma-separated fractions), `OCR_THRESHOLD`
    /// (a 0-255 luminance cutoff, or `adaptive`).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secs) = std::env::var("OCR_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.recovery.operation_timeout_secs = secs;
            }
        }

        if let Ok(key) = std::env::var("OCR_SPACE_API_KEY") {
            if !key.trim().is_empty() {
                config.hosted = Some(HostedOcrConfig {
                    api_key: key,
                    ..HostedOcrConfig::default()
                });
            }
        }

        if let Ok(roi) = std::env::var("OCR_ROI") {
            if let Some(parsed) = RoiFractions::parse(&roi) {
                config.roi = parsed;
            }
        }

        if let Ok(threshold) = std::env::var("OCR_THRESHOLD") {
            if threshold.eq_ignore_ascii_case("adaptive") {
                config.threshold = ThresholdMode::Adaptive;
            } else if let Ok(cutoff) = threshold.parse::<u8>() {
                config.threshold = ThresholdMode::Fixed(cutoff);
            }
        }

        config
    }

    /// The Tesseract language parameter for the full chain ("eng+ara+rus")
    pub fn tesseract_languages(&self) -> String {
        tesseract_language_string(&self.language_chain)
    }

    /// Validate the complete OCR configuration
    pub fn validate(&self) -> crate::errors::AppResult<()> {
        if self.language_chain.is_empty() {
            return Err(crate::errors::AppError::Config(
                "language_chain must contain at least one language".to_string(),
            ));
        }
        if self.buffer_size < self.min_format_bytes {
            return Err(crate::errors::AppError::Config(format!(
                "buffer_size ({}) must be >= min_format_bytes ({})",
                self.buffer_size, self.min_format_bytes
            )));
        }
        if self.max_file_size == 0 {
            return Err(crate::errors::AppError::Config(
                "max_file_size must be greater than 0".to_string(),
            ));
        }
        self.format_limits.validate()?;
        self.recovery.validate()?;
        self.roi.validate().map_err(crate::errors::AppError::Config)?;
        if let Some(hosted) = &self.hosted {
            hosted.validate()?;
        }
        Ok(())
    }
}
