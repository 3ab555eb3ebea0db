//! # OCR Tests Module
//!
//! Test suite for the OCR pipeline machinery: configuration validation,
//! circuit breaker behavior, retry backoff, timeout enforcement, and image
//! format validation. No test here requires an installed OCR engine.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;
    use tube_rewards::circuit_breaker::CircuitBreaker;
    use tube_rewards::ocr::{
        calculate_retry_delay, estimate_memory_usage, is_supported_image_format, run_with_timeout,
        validate_image_path, validate_image_with_format_limits,
    };
    use tube_rewards::ocr_config::{
        tesseract_language_string, FormatSizeLimits, HostedOcrConfig, OcrConfig, OcrLanguage,
        PageSegMode, RecoveryConfig,
    };
    use tube_rewards::ocr_errors::OcrError;

    /// Test OCR configuration defaults
    #[test]
    fn test_ocr_config_defaults() {
        let config = OcrConfig::default();

        assert_eq!(config.tesseract_languages(), "eng+ara+rus");
        assert_eq!(config.buffer_size, 32);
        assert_eq!(config.min_format_bytes, 8);
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.psm_mode, PageSegMode::SingleBlock);
        assert!(config.hosted.is_none());
        assert!(config.validate().is_ok());
    }

    /// Test recovery configuration defaults
    #[test]
    fn test_recovery_config_defaults() {
        let recovery = RecoveryConfig::default();

        assert_eq!(recovery.max_retries, 3);
        assert_eq!(recovery.base_retry_delay_ms, 1000);
        assert_eq!(recovery.max_retry_delay_ms, 10000);
        assert_eq!(recovery.operation_timeout_secs, 12);
        assert_eq!(recovery.circuit_breaker_threshold, 5);
        assert_eq!(recovery.circuit_breaker_reset_secs, 60);
    }

    /// Test format size limits defaults
    #[test]
    fn test_format_size_limits_defaults() {
        let limits = FormatSizeLimits::default();

        assert_eq!(limits.png_max, 15 * 1024 * 1024);
        assert_eq!(limits.jpeg_max, 10 * 1024 * 1024);
        assert_eq!(limits.bmp_max, 5 * 1024 * 1024);
        assert_eq!(limits.tiff_max, 20 * 1024 * 1024);
        assert_eq!(limits.min_quick_reject, 50 * 1024 * 1024);
        assert!(limits.validate().is_ok());
    }

    /// Invalid configurations must be rejected at validation time
    #[test]
    fn test_config_validation_rejects_bad_values() {
        let mut config = OcrConfig::default();
        config.language_chain.clear();
        assert!(config.validate().is_err());

        let mut config = OcrConfig::default();
        config.recovery.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = OcrConfig::default();
        config.recovery.max_retry_delay_ms = 1; // below base delay
        assert!(config.validate().is_err());

        let mut config = OcrConfig::default();
        config.hosted = Some(HostedOcrConfig {
            hourly_limit: 0,
            ..HostedOcrConfig::default()
        });
        assert!(config.validate().is_err());
    }

    /// Hosted backend defaults mirror the service contract
    #[test]
    fn test_hosted_config_defaults() {
        let hosted = HostedOcrConfig::default();

        assert_eq!(hosted.endpoint, "https://api.ocr.space/parse/image");
        assert_eq!(hosted.engine, 1);
        assert_eq!(hosted.max_retries, 3);
        assert_eq!(hosted.hourly_limit, 300);
        assert_eq!(hosted.request_timeout_secs, 10);
    }

    /// Language chain helpers
    #[test]
    fn test_language_codes() {
        assert_eq!(OcrLanguage::English.tesseract_code(), "eng");
        assert_eq!(OcrLanguage::Arabic.tesseract_code(), "ara");
        assert_eq!(OcrLanguage::Russian.tesseract_code(), "rus");
        assert_eq!(
            tesseract_language_string(&[OcrLanguage::English, OcrLanguage::Arabic]),
            "eng+ara"
        );
    }

    /// Test circuit breaker state transitions
    #[test]
    fn test_circuit_breaker_state_transitions() {
        let config = RecoveryConfig {
            circuit_breaker_threshold: 2,
            ..Default::default()
        };
        let circuit_breaker = CircuitBreaker::new(config);

        // Initially closed
        assert!(!circuit_breaker.is_open());

        circuit_breaker.record_failure();
        assert!(!circuit_breaker.is_open()); // Still closed (1 failure)

        circuit_breaker.record_failure();
        assert!(circuit_breaker.is_open()); // Now open (2 failures)

        // Success resets the breaker
        circuit_breaker.record_success();
        assert!(!circuit_breaker.is_open());
    }

    /// The breaker closes again once the reset timeout elapses
    #[test]
    fn test_circuit_breaker_reset_after_timeout() {
        let config = RecoveryConfig {
            circuit_breaker_threshold: 1,
            circuit_breaker_reset_secs: 1,
            ..Default::default()
        };
        let circuit_breaker = CircuitBreaker::new(config);

        circuit_breaker.record_failure();
        assert!(circuit_breaker.is_open());

        std::thread::sleep(Duration::from_millis(1100));
        assert!(!circuit_breaker.is_open());
    }

    /// Retry delays grow exponentially within jitter bounds
    #[test]
    fn test_retry_delay_progression() {
        let recovery = RecoveryConfig::default();

        for _ in 0..10 {
            let delay1 = calculate_retry_delay(1, &recovery);
            let delay2 = calculate_retry_delay(2, &recovery);
            assert!((1000..=1250).contains(&delay1));
            assert!((2000..=2500).contains(&delay2));
        }
    }

    /// A hanging OCR future is abandoned at the configured timeout
    #[tokio::test]
    async fn test_timeout_bounds_hanging_backend() {
        let started = std::time::Instant::now();
        let result: Result<String, OcrError> = run_with_timeout(
            Duration::from_millis(100),
            std::future::pending::<Result<String, OcrError>>(),
        )
        .await;

        assert!(matches!(result, Err(OcrError::Timeout(_))));
        // Generous bound: the decision must come promptly, not hang
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    /// Validation rejects missing and empty files
    #[test]
    fn test_validate_image_path() {
        let config = OcrConfig::default();

        assert!(validate_image_path("no-such-file.png", &config).is_err());

        let empty = NamedTempFile::new().expect("temp file should be created");
        let path = empty.path().to_string_lossy().to_string();
        assert!(validate_image_path(&path, &config).is_err());
    }

    /// A real PNG passes format validation and detection
    #[test]
    fn test_format_validation_accepts_png() {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(20, 20));
        let temp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file should be created");
        img.save(temp.path()).expect("image save should succeed");

        let config = OcrConfig::default();
        let path = temp.path().to_string_lossy().to_string();
        assert!(validate_image_with_format_limits(&path, &config).is_ok());
        assert!(is_supported_image_format(&path, &config));
    }

    /// Garbage bytes are not a supported image format
    #[test]
    fn test_format_validation_rejects_garbage() {
        let mut temp = NamedTempFile::new().expect("temp file should be created");
        temp.write_all(b"not an image at all, just text")
            .expect("write should succeed");

        let config = OcrConfig::default();
        let path = temp.path().to_string_lossy().to_string();
        assert!(!is_supported_image_format(&path, &config));
    }

    /// Memory estimation factors by format
    #[test]
    fn test_memory_estimation() {
        let one_mb = 1024 * 1024;
        assert_eq!(estimate_memory_usage(one_mb, &image::ImageFormat::Png), 3.0);
        assert_eq!(estimate_memory_usage(one_mb, &image::ImageFormat::Bmp), 1.2);
        assert_eq!(
            estimate_memory_usage(2 * one_mb, &image::ImageFormat::Tiff),
            8.0
        );
    }
}
