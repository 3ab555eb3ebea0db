//! Localization support for the bot's bilingual (English/Arabic) surface.
//!
//! Messages live in Fluent resource files under `locales/{locale}/main.ftl`
//! and are resolved per user from the Telegram language code, falling back
//! to English.

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::FluentResource;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

/// Locales shipped with the bot
const SUPPORTED_LOCALES: &[&str] = &["en", "ar"];

/// Localization manager holding one Fluent bundle per locale
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager, loading every supported locale
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for locale_str in SUPPORTED_LOCALES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let bundle = Self::create_bundle(&locale)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: &LanguageIdentifier) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);

        // Path relative to Cargo.toml
        let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        let resource_path = format!("{}/locales/{}/main.ftl", manifest_dir, locale);
        if let Ok(content) = fs::read_to_string(&resource_path) {
            if let Ok(resource) = FluentResource::try_new(content) {
                let _ = bundle.add_resource(resource);
            }
        }

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self.bundles.get(language) {
            Some(bundle) => bundle,
            None => match self.bundles.get("en") {
                Some(bundle) => bundle,
                None => return format!("Missing translation: {}", key),
            },
        };

        let msg = match bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {}", key),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {}", key),
        };

        let mut value = String::new();

        if let Some(args) = args {
            let fluent_args = fluent_bundle::FluentArgs::from_iter(
                args.iter()
                    .map(|(k, v)| (*k, fluent_bundle::FluentValue::from(*v))),
            );
            let _ = bundle.write_pattern(&mut value, pattern, Some(&fluent_args), &mut vec![]);
        } else {
            let _ = bundle.write_pattern(&mut value, pattern, None, &mut vec![]);
        }

        value
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }
}

/// Create a shared localization manager
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Map a Telegram language code ("ar-SY", "en-US", ...) onto a supported locale
pub fn detect_language(manager: &LocalizationManager, language_code: Option<&str>) -> String {
    if let Some(code) = language_code {
        let lang = code.split('-').next().unwrap_or("en");
        if manager.is_language_supported(lang) {
            return lang.to_string();
        }
    }
    "en".to_string()
}

/// Convenience function to get a localized message in the user's language
pub fn t_lang(
    manager: &Arc<LocalizationManager>,
    key: &str,
    language_code: Option<&str>,
) -> String {
    let language = detect_language(manager, language_code);
    manager.get_message_in_language(key, &language, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args_lang(
    manager: &Arc<LocalizationManager>,
    key: &str,
    args: &[(&str, &str)],
    language_code: Option<&str>,
) -> String {
    let language = detect_language(manager, language_code);
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    manager.get_message_in_language(key, &language, Some(&args_map))
}
