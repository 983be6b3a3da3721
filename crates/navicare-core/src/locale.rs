//! Supported conversation languages.
//!
//! Closed list. Every language currently shares one voice persona. The
//! language `code` is what the reasoning service is told to answer in.

/// Voice persona used for speech synthesis.
pub const DEFAULT_VOICE: &str = "Kore";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// English name sent in prompts ("Spanish").
    pub code: &'static str,
    /// Native display label ("Español").
    pub label: &'static str,
    pub flag: &'static str,
    pub voice: &'static str,
}

const fn lang(code: &'static str, label: &'static str, flag: &'static str) -> Language {
    Language {
        code,
        label,
        flag,
        voice: DEFAULT_VOICE,
    }
}

pub const LANGUAGES: [Language; 15] = [
    lang("English", "English", "🇺🇸"),
    lang("Spanish", "Español", "🇪🇸"),
    lang("French", "Français", "🇫🇷"),
    lang("German", "Deutsch", "🇩🇪"),
    lang("Chinese", "中文", "🇨🇳"),
    lang("Japanese", "日本語", "🇯🇵"),
    lang("Arabic", "العربية", "🇸🇦"),
    lang("Portuguese", "Português", "🇵🇹"),
    lang("Italian", "Italiano", "🇮🇹"),
    lang("Russian", "Русский", "🇷🇺"),
    lang("Hindi", "हिन्दी", "🇮🇳"),
    lang("Korean", "한국어", "🇰🇷"),
    lang("Dutch", "Nederlands", "🇳🇱"),
    lang("Turkish", "Türkçe", "🇹🇷"),
    lang("Vietnamese", "Tiếng Việt", "🇻🇳"),
];

impl Default for Language {
    fn default() -> Self {
        LANGUAGES[0]
    }
}

/// Look up by code or label, case-insensitively.
pub fn find_language(name: &str) -> Option<Language> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(name) || l.label.to_lowercase() == name.to_lowercase())
        .copied()
}

/// Languages whose code or label contains `query` (case-insensitive). Empty query matches all.
pub fn filter_languages(query: &str) -> Vec<Language> {
    let query = query.trim().to_lowercase();
    LANGUAGES
        .iter()
        .filter(|l| l.label.to_lowercase().contains(&query) || l.code.to_lowercase().contains(&query))
        .copied()
        .collect()
}
