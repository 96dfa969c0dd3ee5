//! Language catalog: the languages offered in the source and target selectors.
//!
//! The catalog is static data held in a lazily-initialised registry, the same
//! way the rest of the crate treats reference data.

use std::sync::OnceLock;

/// Selector value meaning "let the provider detect the source language".
pub const AUTO_DETECT: &str = "autodetect";

/// The provider's own spelling of the auto-detect source.
pub const PROVIDER_AUTO_DETECT: &str = "Autodetect";

/// Label shown for records whose source was auto-detected.
pub const DETECTED_LABEL: &str = "Detected";

/// Target language used when nothing else has been chosen.
pub const DEFAULT_TARGET: &str = "en-US";

/// A language offered in the selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    /// Provider language code (e.g., "pt-BR", "ja-JP")
    pub code: &'static str,

    /// Display name (e.g., "Portuguese (Brazil)")
    pub name: &'static str,
}

/// Registry of all catalog languages, in selector order.
pub struct LanguageCatalog {
    languages: Vec<LanguageEntry>,
}

static CATALOG: OnceLock<LanguageCatalog> = OnceLock::new();

impl LanguageCatalog {
    /// Get the global catalog instance.
    pub fn get() -> &'static LanguageCatalog {
        CATALOG.get_or_init(|| LanguageCatalog {
            languages: default_languages(),
        })
    }

    pub fn get_by_code(&self, code: &str) -> Option<&LanguageEntry> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }

    pub fn list(&self) -> &[LanguageEntry] {
        &self.languages
    }
}

/// Map a language code to the label shown in the history list.
///
/// The auto-detect sentinel (or a missing code) becomes [`DETECTED_LABEL`];
/// codes outside the catalog are returned unchanged.
pub fn display_name(code: &str) -> &str {
    if code.is_empty() || code == PROVIDER_AUTO_DETECT {
        return DETECTED_LABEL;
    }
    match LanguageCatalog::get().get_by_code(code) {
        Some(entry) => entry.name,
        None => code,
    }
}

/// Translate a selector value into the source half of a provider `langpair`.
pub fn provider_source(selection: &str) -> &str {
    if selection == AUTO_DETECT {
        PROVIDER_AUTO_DETECT
    } else {
        selection
    }
}

fn default_languages() -> Vec<LanguageEntry> {
    const LANGUAGES: &[(&str, &str)] = &[
        ("af-ZA", "Afrikaans"),
        ("ar-SA", "Arabic"),
        ("bg-BG", "Bulgarian"),
        ("ca-ES", "Catalan"),
        ("cs-CZ", "Czech"),
        ("da-DK", "Danish"),
        ("de-DE", "German"),
        ("el-GR", "Greek"),
        ("en-GB", "English (UK)"),
        ("en-US", "English (US)"),
        ("es-ES", "Spanish (Spain)"),
        ("es-MX", "Spanish (Mexico)"),
        ("fi-FI", "Finnish"),
        ("fr-FR", "French"),
        ("he-IL", "Hebrew"),
        ("hi-IN", "Hindi"),
        ("hu-HU", "Hungarian"),
        ("id-ID", "Indonesian"),
        ("it-IT", "Italian"),
        ("ja-JP", "Japanese"),
        ("ko-KR", "Korean"),
        ("nl-NL", "Dutch"),
        ("no-NO", "Norwegian"),
        ("pl-PL", "Polish"),
        ("pt-BR", "Portuguese (Brazil)"),
        ("pt-PT", "Portuguese (Portugal)"),
        ("ro-RO", "Romanian"),
        ("ru-RU", "Russian"),
        ("sv-SE", "Swedish"),
        ("th-TH", "Thai"),
        ("tr-TR", "Turkish"),
        ("uk-UA", "Ukrainian"),
        ("vi-VN", "Vietnamese"),
        ("zh-CN", "Chinese (Simplified)"),
        ("zh-TW", "Chinese (Traditional)"),
    ];

    LANGUAGES
        .iter()
        .map(|&(code, name)| LanguageEntry { code, name })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_get_returns_singleton() {
        assert!(std::ptr::eq(LanguageCatalog::get(), LanguageCatalog::get()));
    }

    #[test]
    fn test_catalog_codes_are_unique() {
        let list = LanguageCatalog::get().list();
        let mut codes: Vec<_> = list.iter().map(|l| l.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), list.len());
    }

    #[test]
    fn test_catalog_does_not_contain_sentinels() {
        let catalog = LanguageCatalog::get();
        assert!(!catalog.contains(AUTO_DETECT));
        assert!(!catalog.contains(PROVIDER_AUTO_DETECT));
        assert!(catalog.contains(DEFAULT_TARGET));
    }

    #[test]
    fn test_display_name_for_every_catalog_code() {
        for entry in LanguageCatalog::get().list() {
            let name = display_name(entry.code);
            assert!(!name.is_empty());
            assert_ne!(name, entry.code);
            assert_eq!(name, entry.name);
        }
    }

    #[test]
    fn test_display_name_for_sentinel() {
        assert_eq!(display_name(PROVIDER_AUTO_DETECT), DETECTED_LABEL);
        assert_eq!(display_name(""), DETECTED_LABEL);
    }

    #[test]
    fn test_display_name_unknown_code_is_unchanged() {
        assert_eq!(display_name("xx-YY"), "xx-YY");
        assert_eq!(display_name("en"), "en");
    }

    #[test]
    fn test_provider_source() {
        assert_eq!(provider_source(AUTO_DETECT), PROVIDER_AUTO_DETECT);
        assert_eq!(provider_source("pt-BR"), "pt-BR");
    }
}
