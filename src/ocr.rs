//! # OCR Processing Module
//!
//! This module provides optical character recognition for the verification
//! pipeline. Two interchangeable backends sit behind [`OcrPipeline`]: the
//! local Tesseract engine (via `leptess`) and the hosted OCR HTTP service.
//! Each invocation is bounded by a hard wall-clock timeout; a timed-out or
//! failed call degrades to "no text" for that language/backend and the
//! pipeline moves on. Outputs of all attempts are concatenated — the match
//! stage works on the combined text.
//!
//! ## Supported Image Formats
//!
//! - PNG (Portable Network Graphics)
//! - JPEG/JPG (Joint Photographic Experts Group)
//! - BMP (Bitmap)
//! - TIFF/TIF (Tagged Image File Format)

use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

// Re-export types for easier access from external usage
pub use crate::circuit_breaker::CircuitBreaker;
pub use crate::instance_manager::OcrInstanceManager;
pub use crate::ocr_config::{OcrConfig, OcrLanguage, RecoveryConfig};
pub use crate::ocr_errors::OcrError;

use crate::hosted_ocr::HostedOcrClient;

/// Validate image file path and basic properties
pub fn validate_image_path(image_path: &str, config: &OcrConfig) -> anyhow::Result<()> {
    let path = std::path::Path::new(image_path);

    if !path.exists() {
        return Err(anyhow::anyhow!(
            "Image path validation failed: file does not exist ({})",
            image_path
        ));
    }

    if !path.is_file() {
        return Err(anyhow::anyhow!(
            "Image path validation failed: path is not a file ({})",
            image_path
        ));
    }

    match path.metadata() {
        Ok(metadata) => {
            let file_size = metadata.len();
            if file_size > config.max_file_size {
                return Err(anyhow::anyhow!(
                    "Image validation failed: file too large ({} bytes, maximum allowed: {} bytes)",
                    file_size,
                    config.max_file_size
                ));
            }
            if file_size == 0 {
                return Err(anyhow::anyhow!(
                    "Image validation failed: file is empty ({})",
                    image_path
                ));
            }
        }
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Image validation failed: cannot read file metadata ({}) - {}",
                image_path,
                e
            ));
        }
    }

    Ok(())
}

/// Enhanced validation with format-specific size limits
///
/// Detects the format from the file's magic bytes and applies the
/// per-format limit from the configuration, plus a memory-usage estimate so
/// oversized decompression jobs are rejected before they start.
pub fn validate_image_with_format_limits(
    image_path: &str,
    config: &OcrConfig,
) -> anyhow::Result<()> {
    validate_image_path(image_path, config)?;

    let path = std::path::Path::new(image_path);
    let file_size = path.metadata()?.len();

    // Quick rejection for extremely large files
    if file_size > config.format_limits.min_quick_reject {
        info!(
            "Quick rejecting file {image_path}: {file_size} bytes exceeds quick reject threshold"
        );
        return Err(anyhow::anyhow!(
            "File too large for processing: {} bytes (exceeds quick reject threshold of {} bytes)",
            file_size,
            config.format_limits.min_quick_reject
        ));
    }

    let file = File::open(image_path)
        .map_err(|e| anyhow::anyhow!("Cannot open image file for validation: {} - {}", image_path, e))?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; config.buffer_size];

    let bytes_read = reader.read(&mut buffer).unwrap_or(0);
    if bytes_read < config.min_format_bytes {
        // Could not read enough bytes for format detection, use general limit
        if file_size > config.max_file_size {
            return Err(anyhow::anyhow!(
                "Image file too large: {} bytes (maximum allowed: {} bytes)",
                file_size,
                config.max_file_size
            ));
        }
        return Ok(());
    }
    buffer.truncate(bytes_read);

    match image::guess_format(&buffer) {
        Ok(format) => {
            let format_limit = match format {
                image::ImageFormat::Png => config.format_limits.png_max,
                image::ImageFormat::Jpeg => config.format_limits.jpeg_max,
                image::ImageFormat::Bmp => config.format_limits.bmp_max,
                image::ImageFormat::Tiff => config.format_limits.tiff_max,
                _ => config.max_file_size,
            };

            if file_size > format_limit {
                return Err(anyhow::anyhow!(
                    "Image file too large for {:?} format: {} bytes (maximum allowed: {} bytes)",
                    format,
                    file_size,
                    format_limit
                ));
            }

            let estimated_memory_mb = estimate_memory_usage(file_size, &format);
            let max_memory_mb = std::env::var("OCR_MEMORY_LIMIT_MB")
                .unwrap_or_else(|_| "80".to_string())
                .parse::<f64>()
                .unwrap_or(80.0);
            if estimated_memory_mb > max_memory_mb {
                return Err(anyhow::anyhow!(
                    "Estimated memory usage too high: {}MB (maximum allowed: {}MB)",
                    estimated_memory_mb,
                    max_memory_mb
                ));
            }

            Ok(())
        }
        Err(_) => {
            info!("Could not determine image format for {image_path}, using general size limit");
            if file_size > config.max_file_size {
                return Err(anyhow::anyhow!(
                    "Image file too large: {} bytes (maximum allowed: {} bytes)",
                    file_size,
                    config.max_file_size
                ));
            }
            Ok(())
        }
    }
}

/// Estimate memory usage in MB for decoding an image of the given size.
///
/// | Format | Factor | Reason |
/// |--------|--------|--------|
/// | PNG    | 3.0x   | Lossless decompression expands compressed data |
/// | JPEG   | 2.5x   | Lossy decompression with working buffers |
/// | BMP    | 1.2x   | Mostly uncompressed, minimal expansion |
/// | TIFF   | 4.0x   | Complex format with layers and metadata |
pub fn estimate_memory_usage(file_size: u64, format: &image::ImageFormat) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let file_size_mb = file_size as f64 / (1024.0 * 1024.0);

    let memory_factor = match format {
        image::ImageFormat::Png => 3.0,
        image::ImageFormat::Jpeg => 2.5,
        image::ImageFormat::Bmp => 1.2,
        image::ImageFormat::Tiff => 4.0,
        _ => 3.0,
    };

    file_size_mb * memory_factor
}

/// Check whether a file is a supported image format within size limits
pub fn is_supported_image_format(file_path: &str, config: &OcrConfig) -> bool {
    if validate_image_with_format_limits(file_path, config).is_err() {
        return false;
    }

    let file = match File::open(file_path) {
        Ok(file) => file,
        Err(e) => {
            info!("Could not open image file for format detection: {file_path} - {e}");
            return false;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buffer = vec![0; config.buffer_size];

    match reader.read(&mut buffer) {
        Ok(bytes_read) if bytes_read >= config.min_format_bytes => {
            buffer.truncate(bytes_read);
            match image::guess_format(&buffer) {
                Ok(format) => matches!(
                    format,
                    image::ImageFormat::Png
                        | image::ImageFormat::Jpeg
                        | image::ImageFormat::Bmp
                        | image::ImageFormat::Tiff
                ),
                Err(e) => {
                    info!("Could not determine image format for file: {file_path} - {e}");
                    false
                }
            }
        }
        _ => false,
    }
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// `delay = min(base_delay * 2^(attempt-1), max_delay) + random(0, delay/4)`
pub fn calculate_retry_delay(attempt: u32, recovery: &RecoveryConfig) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let base_delay = recovery.base_retry_delay_ms as f64;

    #[allow(clippy::cast_precision_loss)]
    let exponential_delay = base_delay * (2.0_f64).powf(f64::from(attempt.saturating_sub(1)));

    #[allow(clippy::cast_precision_loss)]
    let delay = exponential_delay.min(recovery.max_retry_delay_ms as f64) as u64;

    let jitter = if delay >= 4 {
        rand::random::<u64>() % (delay / 4)
    } else {
        0
    };
    delay + jitter
}

/// Wrap a fallible extraction future in the configured hard timeout.
///
/// On timeout the future is dropped — abandoned, not killed — and the
/// caller receives `OcrError::Timeout` so the chain can continue.
pub async fn run_with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, OcrError>
where
    F: std::future::Future<Output = Result<T, OcrError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(OcrError::Timeout(format!(
            "OCR operation timed out after {} seconds",
            timeout.as_secs()
        ))),
    }
}

/// Multi-backend, multi-language text extraction.
///
/// Owns the Tesseract instance pool and the optional hosted client. The
/// entry point is [`OcrPipeline::extract_all_text`], which never fails:
/// every backend error degrades to skipping that backend.
pub struct OcrPipeline {
    config: OcrConfig,
    instance_manager: Arc<OcrInstanceManager>,
    hosted: Option<Arc<HostedOcrClient>>,
}

impl OcrPipeline {
    /// Build the pipeline from its configuration.
    ///
    /// The hosted backend is only constructed when an API key is configured.
    pub fn new(config: OcrConfig) -> anyhow::Result<Self> {
        let hosted = match &config.hosted {
            Some(hosted_config) => Some(Arc::new(HostedOcrClient::new(hosted_config.clone())?)),
            None => None,
        };

        Ok(Self {
            config,
            instance_manager: Arc::new(OcrInstanceManager::new()),
            hosted,
        })
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Run every configured backend and language over the image and
    /// concatenate whatever text came back.
    ///
    /// Returns the combined text, possibly empty when every attempt failed.
    /// Validation errors on the input image surface as `Err` so the caller
    /// can distinguish "unreadable upload" from "no text found".
    pub async fn extract_all_text(&self, image_path: &str) -> Result<String, OcrError> {
        validate_image_with_format_limits(image_path, &self.config)
            .map_err(|e| OcrError::Validation(e.to_string()))?;

        let timeout = Duration::from_secs(self.config.recovery.operation_timeout_secs);
        let mut combined = String::new();

        // Local engine first: one call per configured language
        for language in &self.config.language_chain {
            let attempt_start = std::time::Instant::now();
            match run_with_timeout(timeout, self.extract_local(image_path, *language)).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(
                        backend = "local",
                        language = language.tesseract_code(),
                        chars = text.len(),
                        "OCR backend produced text"
                    );
                    crate::observability::record_ocr_attempt("local", true, attempt_start.elapsed());
                    if !combined.is_empty() {
                        combined.push(' ');
                    }
                    combined.push_str(&text);
                }
                Ok(_) => {
                    debug!(
                        backend = "local",
                        language = language.tesseract_code(),
                        "OCR backend produced no text"
                    );
                    crate::observability::record_ocr_attempt("local", true, attempt_start.elapsed());
                }
                Err(e) => {
                    warn!(
                        backend = "local",
                        language = language.tesseract_code(),
                        error = %e,
                        "OCR backend attempt failed, continuing with next"
                    );
                    crate::observability::record_ocr_attempt("local", false, attempt_start.elapsed());
                }
            }
        }

        // Hosted engine second, when configured
        if let Some(hosted) = &self.hosted {
            for language in &self.config.language_chain {
                let attempt_start = std::time::Instant::now();
                match run_with_timeout(timeout, hosted.extract_text(image_path, *language)).await {
                    Ok(text) if !text.trim().is_empty() => {
                        debug!(
                            backend = "hosted",
                            language = language.hosted_code(),
                            chars = text.len(),
                            "OCR backend produced text"
                        );
                        crate::observability::record_ocr_attempt(
                            "hosted",
                            true,
                            attempt_start.elapsed(),
                        );
                        if !combined.is_empty() {
                            combined.push(' ');
                        }
                        combined.push_str(&text);
                    }
                    Ok(_) => {
                        crate::observability::record_ocr_attempt(
                            "hosted",
                            true,
                            attempt_start.elapsed(),
                        );
                    }
                    Err(OcrError::RateLimited(msg)) => {
                        // Budget exhausted applies to every remaining call too
                        warn!(error = %msg, "Hosted OCR budget exhausted, skipping remaining languages");
                        break;
                    }
                    Err(e) => {
                        warn!(
                            backend = "hosted",
                            language = language.hosted_code(),
                            error = %e,
                            "OCR backend attempt failed, continuing with next"
                        );
                        crate::observability::record_ocr_attempt(
                            "hosted",
                            false,
                            attempt_start.elapsed(),
                        );
                    }
                }
            }
        }

        Ok(combined)
    }

    /// Single local Tesseract extraction for one language.
    ///
    /// The blocking Tesseract call runs on the blocking thread pool so the
    /// surrounding timeout can abandon it without stalling the runtime.
    async fn extract_local(
        &self,
        image_path: &str,
        language: OcrLanguage,
    ) -> Result<String, OcrError> {
        let instance = self
            .instance_manager
            .get_instance(language.tesseract_code(), &self.config)
            .map_err(|e| OcrError::Initialization(e.to_string()))?;

        let path = image_path.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            let mut tess = instance
                .lock()
                .expect("Failed to acquire Tesseract instance lock");

            tess.set_image(&path).map_err(|e| {
                OcrError::ImageLoad(format!("Failed to load image for OCR: {e}"))
            })?;

            tess.get_utf8_text().map_err(|e| {
                OcrError::Extraction(format!("Failed to extract text from image: {e}"))
            })
        });

        let extracted = handle
            .await
            .map_err(|e| OcrError::Extraction(format!("OCR task panicked: {e}")))??;

        // Clean up the extracted text (remove extra whitespace and empty lines)
        let cleaned = extracted
            .trim()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>()
            .join("\n");

        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_retry_delay_progression() {
        let recovery = RecoveryConfig::default();

        let delay1 = calculate_retry_delay(1, &recovery);
        let delay2 = calculate_retry_delay(2, &recovery);
        let delay3 = calculate_retry_delay(3, &recovery);

        assert!((1000..=1250).contains(&delay1));
        assert!((2000..=2500).contains(&delay2));
        assert!((4000..=5000).contains(&delay3));
    }

    #[test]
    fn test_calculate_retry_delay_is_capped() {
        let recovery = RecoveryConfig::default();
        // Far past the cap: delay must stay within max + 25% jitter
        let delay = calculate_retry_delay(10, &recovery);
        assert!(delay <= recovery.max_retry_delay_ms + recovery.max_retry_delay_ms / 4);
    }

    #[tokio::test]
    async fn test_run_with_timeout_abandons_hanging_future() {
        let started = std::time::Instant::now();
        let result: Result<String, OcrError> = run_with_timeout(
            Duration::from_millis(50),
            std::future::pending::<Result<String, OcrError>>(),
        )
        .await;

        assert!(matches!(result, Err(OcrError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_with_timeout_passes_through_success() {
        let result = run_with_timeout(Duration::from_secs(1), async {
            Ok::<_, OcrError>("text".to_string())
        })
        .await;
        assert_eq!(result.unwrap(), "text");
    }

    #[test]
    fn test_estimate_memory_usage() {
        let memory_mb = estimate_memory_usage(1024 * 1024, &image::ImageFormat::Png);
        assert_eq!(memory_mb, 3.0);

        let memory_mb = estimate_memory_usage(2 * 1024 * 1024, &image::ImageFormat::Jpeg);
        assert_eq!(memory_mb, 5.0);
    }

    #[test]
    fn test_validate_rejects_missing_file() {
        let config = OcrConfig::default();
        assert!(validate_image_path("does-not-exist.png", &config).is_err());
    }
}
