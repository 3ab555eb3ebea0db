//! # OCR Instance Manager Module
//!
//! This module provides thread-safe OCR instance management for reusing
//! Tesseract instances. The verification pipeline runs every screenshot
//! through up to three language packs, so reusing initialized instances
//! avoids paying the 100-500ms engine startup cost per language per request.

use leptess::LepTess;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::ocr_config::OcrConfig;

/// Thread-safe OCR instance manager for reusing Tesseract instances
///
/// Manages a pool of Tesseract OCR instances keyed by the language string
/// ("eng", "ara", "eng+ara+rus", ...). Instances are created on first
/// request for a language combination and reused afterwards.
pub struct OcrInstanceManager {
    instances: Mutex<HashMap<String, Arc<Mutex<LepTess>>>>,
}

impl OcrInstanceManager {
    /// Create a new, empty instance manager
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Get or create an OCR instance for the given language string
    ///
    /// # Errors
    ///
    /// Returns an error if Tesseract instance creation fails (e.g. a language
    /// pack is not installed on the host).
    pub fn get_instance(
        &self,
        languages: &str,
        config: &OcrConfig,
    ) -> anyhow::Result<Arc<Mutex<LepTess>>> {
        // Try to get existing instance
        {
            let instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            if let Some(instance) = instances.get(languages) {
                return Ok(Arc::clone(instance));
            }
        }

        // Create new instance if none exists
        info!(languages = %languages, "Creating new OCR instance");

        let mut tess = LepTess::new(None, languages)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Tesseract OCR instance: {}", e))?;

        tess.set_variable(
            leptess::Variable::TesseditPagesegMode,
            config.psm_mode.as_str(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to set PSM mode: {}", e))?;

        let instance = Arc::new(Mutex::new(tess));

        // Store the instance
        {
            let mut instances = self
                .instances
                .lock()
                .expect("Failed to acquire instances lock");
            instances.insert(languages.to_string(), Arc::clone(&instance));
        }

        Ok(instance)
    }

    /// Remove an instance (useful when a language pack turns out to be broken)
    pub fn remove_instance(&self, languages: &str) {
        let mut instances = self
            .instances
            .lock()
            .expect("Failed to acquire instances lock");
        if instances.remove(languages).is_some() {
            info!(languages = %languages, "Removed OCR instance");
        }
    }

    /// Get the number of cached instances
    pub fn instance_count(&self) -> usize {
        let instances = self
            .instances
            .lock()
            .expect("Failed to acquire instances lock");
        instances.len()
    }
}

impl Default for OcrInstanceManager {
    fn default() -> Self {
        Self::new()
    }
}
