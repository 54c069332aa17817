/*!
 * Tests for locale code utilities
 */

use quizloc::language_utils::{language_name, locale_codes_match, validate_locale_code};

/// Two-letter codes validate and normalize to lowercase
#[test]
fn test_validate_withTwoLetterCode_shouldNormalize() {
    assert_eq!(validate_locale_code("ES").unwrap(), "es");
    assert_eq!(validate_locale_code(" fr ").unwrap(), "fr");
}

/// Three-letter codes validate
#[test]
fn test_validate_withThreeLetterCode_shouldSucceed() {
    assert_eq!(validate_locale_code("spa").unwrap(), "spa");
    assert_eq!(validate_locale_code("deu").unwrap(), "deu");
}

/// Region subtags are preserved, underscores normalized to dashes
#[test]
fn test_validate_withRegionSubtag_shouldPreserveRegion() {
    assert_eq!(validate_locale_code("pt-BR").unwrap(), "pt-br");
    assert_eq!(validate_locale_code("zh_CN").unwrap(), "zh-cn");
}

/// Invalid codes are rejected
#[test]
fn test_validate_withInvalidCode_shouldFail() {
    assert!(validate_locale_code("q").is_err());
    assert!(validate_locale_code("zz").is_err());
    assert!(validate_locale_code("english").is_err());
    assert!(validate_locale_code("").is_err());
}

/// Codes for the same language match across formats
#[test]
fn test_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(locale_codes_match("es", "spa"));
    assert!(locale_codes_match("pt", "pt-br"));
    assert!(locale_codes_match("DE", "deu"));
}

/// Codes for different languages do not match
#[test]
fn test_codes_match_withDifferentLanguages_shouldNotMatch() {
    assert!(!locale_codes_match("es", "fr"));
    assert!(!locale_codes_match("es", "zz"));
}

/// Language names resolve from either code length
#[test]
fn test_language_name_withValidCodes_shouldResolve() {
    assert_eq!(language_name("es").unwrap(), "Spanish");
    assert_eq!(language_name("fra").unwrap(), "French");
    assert!(language_name("zz").is_err());
}
