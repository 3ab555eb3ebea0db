//! # Hosted OCR Backend Module
//!
//! Client for the hosted OCR HTTP service (OCR.space `POST /parse/image`).
//! Requests are multipart uploads authenticated by an API key form field.
//! The client honours `Retry-After` on HTTP 429, retries transport failures
//! with a linear backoff, and tracks an in-process hourly request budget:
//! once the budget is exhausted further calls short-circuit without touching
//! the network.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::error_logging;
use crate::ocr_config::{HostedOcrConfig, OcrLanguage};
use crate::ocr_errors::OcrError;

/// Sliding hourly window over the number of requests sent
#[derive(Debug)]
struct RequestBudget {
    request_count: u32,
    window_start: Instant,
}

impl RequestBudget {
    fn new() -> Self {
        Self {
            request_count: 0,
            window_start: Instant::now(),
        }
    }

    /// Reset the window if more than an hour has passed
    fn maybe_reset(&mut self) {
        if self.window_start.elapsed() > Duration::from_secs(3600) {
            self.request_count = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Response shape of the hosted parse API
#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Option<Vec<ParsedResult>>,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
}

/// Client for the hosted OCR HTTP backend
pub struct HostedOcrClient {
    config: HostedOcrConfig,
    http: reqwest::Client,
    budget: Mutex<RequestBudget>,
}

impl HostedOcrClient {
    /// Create a new client from the hosted backend configuration
    pub fn new(config: HostedOcrConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create hosted OCR HTTP client: {}", e))?;

        Ok(Self {
            config,
            http,
            budget: Mutex::new(RequestBudget::new()),
        })
    }

    /// Number of requests sent in the current hourly window
    pub fn requests_this_hour(&self) -> u32 {
        let mut budget = self.budget.lock().expect("Failed to acquire budget lock");
        budget.maybe_reset();
        budget.request_count
    }

    /// Check the hourly budget, counting one request if allowed
    fn consume_budget(&self) -> Result<(), OcrError> {
        let mut budget = self.budget.lock().expect("Failed to acquire budget lock");
        budget.maybe_reset();
        if budget.request_count >= self.config.hourly_limit {
            return Err(OcrError::RateLimited(format!(
                "hourly request budget of {} exhausted",
                self.config.hourly_limit
            )));
        }
        budget.request_count += 1;
        Ok(())
    }

    /// Extract text from an image file via the hosted API.
    ///
    /// Retries up to `max_retries` times. A 429 response sleeps for the
    /// server-provided `Retry-After` (default 60s) before the next attempt;
    /// transport errors back off linearly. Any terminal failure is an
    /// `OcrError` which the pipeline degrades to "no text".
    pub async fn extract_text(
        &self,
        image_path: &str,
        language: OcrLanguage,
    ) -> Result<String, OcrError> {
        let image_bytes = tokio::fs::read(image_path).await.map_err(|e| {
            OcrError::ImageLoad(format!("Failed to read image '{}': {}", image_path, e))
        })?;

        let file_name = std::path::Path::new(image_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.png".to_string());

        for attempt in 0..self.config.max_retries {
            self.consume_budget()?;

            let part = reqwest::multipart::Part::bytes(image_bytes.clone()).file_name(file_name.clone());
            let form = reqwest::multipart::Form::new()
                .part("file", part)
                .text("apikey", self.config.api_key.clone())
                .text("language", language.hosted_code().to_string())
                .text("isOverlayRequired", "false".to_string())
                .text("OCREngine", self.config.engine.to_string());

            let response = match self.http.post(&self.config.endpoint).multipart(form).send().await
            {
                Ok(response) => response,
                Err(e) => {
                    error_logging::log_network_error(
                        &e,
                        "hosted_ocr_request",
                        Some(&self.config.endpoint),
                        Some(attempt + 1),
                    );
                    let delay = self.config.retry_delay_secs * u64::from(attempt + 1);
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    continue;
                }
            };

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(
                    retry_after_secs = retry_after,
                    attempt = attempt + 1,
                    "Hosted OCR rate limited, honouring Retry-After"
                );
                tokio::time::sleep(Duration::from_secs(retry_after)).await;
                continue;
            }

            if !status.is_success() {
                return Err(OcrError::Api(format!(
                    "hosted OCR returned HTTP {}",
                    status.as_u16()
                )));
            }

            let parsed: ParseResponse = response
                .json()
                .await
                .map_err(|e| OcrError::Api(format!("invalid hosted OCR response: {}", e)))?;

            match parsed.parsed_results {
                Some(results) if !results.is_empty() => {
                    let text = results
                        .into_iter()
                        .map(|r| r.parsed_text)
                        .collect::<Vec<_>>()
                        .join("\n");
                    debug!(
                        chars = text.len(),
                        language = language.hosted_code(),
                        "Hosted OCR extraction succeeded"
                    );
                    return Ok(text);
                }
                _ => {
                    let message = parsed
                        .error_message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(OcrError::Api(format!(
                        "hosted OCR reported an error: {}",
                        message
                    )));
                }
            }
        }

        Err(OcrError::Api(format!(
            "hosted OCR failed after {} attempts",
            self.config.max_retries
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_limit(hourly_limit: u32) -> HostedOcrClient {
        HostedOcrClient::new(HostedOcrConfig {
            api_key: "test-key".to_string(),
            hourly_limit,
            ..HostedOcrConfig::default()
        })
        .expect("client construction should succeed")
    }

    #[test]
    fn test_budget_counts_and_exhausts() {
        let client = client_with_limit(2);

        assert!(client.consume_budget().is_ok());
        assert!(client.consume_budget().is_ok());
        assert!(matches!(
            client.consume_budget(),
            Err(OcrError::RateLimited(_))
        ));
        assert_eq!(client.requests_this_hour(), 2);
    }

    #[tokio::test]
    async fn test_missing_image_is_image_load_error() {
        let client = client_with_limit(10);
        let result = client
            .extract_text("no-such-file.png", OcrLanguage::English)
            .await;
        assert!(matches!(result, Err(OcrError::ImageLoad(_))));
        // No budget should have been consumed for an unreadable input
        assert_eq!(client.requests_this_hour(), 0);
    }

    #[test]
    fn test_parse_response_shapes() {
        let ok: ParseResponse = serde_json::from_str(
            r#"{"ParsedResults":[{"ParsedText":"Subscribed"}],"OCRExitCode":1}"#,
        )
        .expect("valid response should parse");
        assert_eq!(ok.parsed_results.unwrap()[0].parsed_text, "Subscribed");

        let err: ParseResponse = serde_json::from_str(
            r#"{"ErrorMessage":["Invalid API key"],"OCRExitCode":99}"#,
        )
        .expect("error response should parse");
        assert!(err.parsed_results.is_none());
        assert!(err.error_message.is_some());
    }
}
