/*!
 * Tests for language utility functions
 */

use anyhow::Result;
use talkalign::language_utils::{get_language_name, language_codes_match, output_key};

/// Test language code matching across code forms
#[test]
fn test_language_codes_match_withEquivalentCodes_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("pt", "POR"));
    assert!(!language_codes_match("en", "es"));
    assert!(language_codes_match(" FR ", "fre"));
    assert!(!language_codes_match("en", "invalid"));
}

/// Test language names
#[test]
fn test_get_language_name_withValidCodes_shouldReturnName() -> Result<()> {
    assert_eq!(get_language_name("en")?, "English");
    assert_eq!(get_language_name("spa")?, "Spanish");
    assert!(get_language_name("zz").is_err());
    Ok(())
}

/// Test output record keys
#[test]
fn test_output_key_withLowercaseCode_shouldUppercase() {
    assert_eq!(output_key("en"), "EN");
    assert_eq!(output_key(" pt-br "), "PT-BR");
}
