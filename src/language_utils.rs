use anyhow::{Result, anyhow};
use isolang::Language;

/// Locale code utilities for ISO 639 handling
///
/// Target locales are ISO 639-1 (2-letter) or ISO 639-3 (3-letter) language
/// codes, optionally carrying a region subtag ("pt-br"). Only the language
/// subtag is validated; the region subtag is preserved as-is.

/// Split a locale code into its language and optional region subtags
fn split_subtags(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().to_lowercase().replace('_', "-");
    match normalized.split_once('-') {
        Some((lang, region)) if !region.is_empty() => {
            (lang.to_string(), Some(region.to_string()))
        }
        _ => (normalized, None),
    }
}

/// Resolve the language subtag of a locale code
fn resolve_language(lang: &str) -> Option<Language> {
    match lang.len() {
        2 => Language::from_639_1(lang),
        3 => Language::from_639_3(lang),
        _ => None,
    }
}

/// Validate a locale code, returning it in normalized lowercase form
pub fn validate_locale_code(code: &str) -> Result<String> {
    let (lang, region) = split_subtags(code);
    if resolve_language(&lang).is_none() {
        return Err(anyhow!("Invalid locale code: {}", code));
    }
    match region {
        Some(region) => Ok(format!("{}-{}", lang, region)),
        None => Ok(lang),
    }
}

/// Check if two locale codes refer to the same language
///
/// Region subtags are ignored; "pt" and "pt-br" match.
pub fn locale_codes_match(code1: &str, code2: &str) -> bool {
    let (lang1, _) = split_subtags(code1);
    let (lang2, _) = split_subtags(code2);
    match (resolve_language(&lang1), resolve_language(&lang2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name for a locale code
pub fn language_name(code: &str) -> Result<String> {
    let (lang, _) = split_subtags(code);
    let language = resolve_language(&lang)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(language.to_name().to_string())
}
