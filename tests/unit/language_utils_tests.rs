/*!
 * Tests for language utility functions
 */

use doctranslate::language_utils::{get_language_name, language_codes_match, normalize_to_part2t, validate_target_language};

/// Test validation of target codes
#[test]
fn test_validate_target_language_withValidCodes_shouldSucceed() {
    for code in ["de", "fr", "deu", "ger", "pt-BR", " EN ", "zh_Hant"] {
        assert!(validate_target_language(code).is_ok(), "{} should be valid", code);
    }
}

/// Test rejection of invalid codes
#[test]
fn test_validate_target_language_withInvalidCodes_shouldFail() {
    for code in ["", "x", "xx", "klingon", "123"] {
        assert!(validate_target_language(code).is_err(), "{} should be invalid", code);
    }
}

/// Test normalization and matching across code forms
#[test]
fn test_language_codes_match_acrossForms_shouldMatch() {
    assert_eq!(normalize_to_part2t("fr").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("pt-BR", "por"));
    assert!(!language_codes_match("de", "fr"));
}

/// Test language names
#[test]
fn test_get_language_name_withValidCode_shouldReturnEnglishName() {
    assert_eq!(get_language_name("de").unwrap(), "German");
    assert_eq!(get_language_name("jpn").unwrap(), "Japanese");
    assert!(get_language_name("zz").is_err());
}
