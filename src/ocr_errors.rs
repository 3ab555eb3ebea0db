//! # OCR Error Types Module
//!
//! This module defines custom error types used throughout the OCR processing
//! system. It provides structured error handling for the local Tesseract
//! backend, the hosted OCR HTTP backend, and the shared pipeline machinery.

/// Custom error types for OCR operations
#[derive(Debug, Clone)]
pub enum OcrError {
    /// File validation errors
    Validation(String),
    /// OCR engine initialization errors
    Initialization(String),
    /// Image loading errors
    ImageLoad(String),
    /// Text extraction errors
    Extraction(String),
    /// Timeout errors
    Timeout(String),
    /// Hosted API rate limiting (429 or exhausted hourly budget)
    RateLimited(String),
    /// Hosted API transport or protocol errors
    Api(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Validation(msg) => write!(f, "[VALIDATION] Image validation failed: {}", msg),
            OcrError::Initialization(msg) => {
                write!(f, "[OCR_INIT] OCR engine initialization failed: {}", msg)
            }
            OcrError::ImageLoad(msg) => {
                write!(f, "[IMAGE_LOAD] Failed to load image for OCR processing: {}", msg)
            }
            OcrError::Extraction(msg) => {
                write!(f, "[OCR_EXTRACT] Text extraction from image failed: {}", msg)
            }
            OcrError::Timeout(msg) => write!(f, "[OCR_TIMEOUT] OCR processing timed out: {}", msg),
            OcrError::RateLimited(msg) => {
                write!(f, "[OCR_RATE_LIMIT] Hosted OCR request rejected: {}", msg)
            }
            OcrError::Api(msg) => write!(f, "[OCR_API] Hosted OCR request failed: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<anyhow::Error> for OcrError {
    fn from(err: anyhow::Error) -> Self {
        OcrError::Extraction(err.to_string())
    }
}
