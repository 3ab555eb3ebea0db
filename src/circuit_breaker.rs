//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for OCR operations.
//! It prevents cascading failures by temporarily stopping requests when
//! the OCR backends fail repeatedly.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ocr_config::RecoveryConfig;

/// Circuit breaker for OCR operations
///
/// Opens after `circuit_breaker_threshold` consecutive failures and rejects
/// verification requests fast while open. After `circuit_breaker_reset_secs`
/// without a failure the breaker resets and requests flow again.
///
/// All state mutations use `Mutex<T>` for thread-safe access.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_count: Mutex<u32>,
    last_failure_time: Mutex<Option<Instant>>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            failure_count: Mutex::new(0),
            last_failure_time: Mutex::new(None),
            config,
        }
    }

    /// Check if circuit breaker is open (blocking requests)
    ///
    /// Returns `true` when the failure count has reached the threshold and
    /// the reset timeout has not yet elapsed. Automatically resets to the
    /// closed state once the timeout expires.
    pub fn is_open(&self) -> bool {
        let failure_count = *self
            .failure_count
            .lock()
            .expect("Failed to acquire failure count lock");
        let last_failure = *self
            .last_failure_time
            .lock()
            .expect("Failed to acquire last failure time lock");

        if failure_count >= self.config.circuit_breaker_threshold {
            if let Some(last_time) = last_failure {
                let elapsed = last_time.elapsed();
                if elapsed < Duration::from_secs(self.config.circuit_breaker_reset_secs) {
                    return true; // Circuit is still open
                }
                // Reset circuit breaker
                *self
                    .failure_count
                    .lock()
                    .expect("Failed to acquire failure count lock") = 0;
                *self
                    .last_failure_time
                    .lock()
                    .expect("Failed to acquire last failure time lock") = None;
            }
        }
        false
    }

    /// Record a failure to increment the failure counter
    ///
    /// Should be called whenever all OCR backends fail for a request.
    pub fn record_failure(&self) {
        *self
            .failure_count
            .lock()
            .expect("Failed to acquire failure count lock") += 1;
        *self
            .last_failure_time
            .lock()
            .expect("Failed to acquire last failure time lock") = Some(Instant::now());
    }

    /// Record a success to reset the failure counter
    pub fn record_success(&self) {
        *self
            .failure_count
            .lock()
            .expect("Failed to acquire failure count lock") = 0;
        *self
            .last_failure_time
            .lock()
            .expect("Failed to acquire last failure time lock") = None;
    }
}
