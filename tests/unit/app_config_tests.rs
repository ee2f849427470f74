/*!
 * Tests for application configuration
 */

use anyhow::Result;
use std::collections::HashMap;
use doctranslate::app_config::{BackendSelection, Config, LogLevel, OnlineBackend, TranslationConfig};
use doctranslate::errors::AppError;
use crate::common;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

/// Test the documented defaults
#[test]
fn test_default_config_shouldUseDocumentedValues() {
    let config = Config::default();

    assert_eq!(config.translation.requests_per_second, 2.0);
    assert_eq!(config.translation.max_retries, 3);
    assert_eq!(config.translation.initial_backoff_ms, 1000);
    assert_eq!(config.translation.concurrent_requests, 5);
    assert_eq!(config.translation.local_model.endpoint, "http://localhost:11434");
    assert_eq!(config.documents.legacy_extractor, "antiword");
    assert!(config.documents.write_issues_log);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test backend selection from key and local flag
#[test]
fn test_selection_withKeyAndFlag_shouldPreferLocalThenDeepL() {
    let mut config = TranslationConfig::default();
    assert_eq!(config.selection(), BackendSelection::Online(OnlineBackend::Google));

    config.deepl_api_key = "abc:fx".to_string();
    assert_eq!(config.selection(), BackendSelection::Online(OnlineBackend::DeepL));

    config.local_only = true;
    assert_eq!(config.selection(), BackendSelection::LocalOnly);
}

/// Test that a whitespace key does not select DeepL
#[test]
fn test_selection_withBlankKey_shouldUseGoogle() {
    let config = TranslationConfig {
        deepl_api_key: "   ".to_string(),
        ..TranslationConfig::default()
    };
    assert_eq!(config.selection(), BackendSelection::Online(OnlineBackend::Google));
}

/// Test environment overrides
#[test]
fn test_apply_env_overrides_withVariables_shouldOverrideConfig() {
    let mut config = TranslationConfig::default();
    config.apply_env_overrides(env(&[("DEEPL_API_KEY", " secret "), ("LOCAL_TRANSLATION", "TRUE")]));

    assert_eq!(config.deepl_api_key, "secret");
    assert!(config.local_only);
}

/// Test that an unparsable flag turns local-only mode off
#[test]
fn test_apply_env_overrides_withFalseFlag_shouldDisableLocalOnly() {
    let mut config = TranslationConfig {
        local_only: true,
        ..TranslationConfig::default()
    };
    config.apply_env_overrides(env(&[("LOCAL_TRANSLATION", "no")]));
    assert!(!config.local_only);

    let mut untouched = TranslationConfig {
        local_only: true,
        ..TranslationConfig::default()
    };
    untouched.apply_env_overrides(env(&[]));
    assert!(untouched.local_only);
}

/// Test validation failures
#[test]
fn test_validate_withInvalidValues_shouldReturnConfigError() {
    let mut config = Config::default();
    config.translation.requests_per_second = 0.0;
    assert!(matches!(config.validate(), Err(AppError::Config(_))));

    let mut config = Config::default();
    config.translation.concurrent_requests = 0;
    assert!(matches!(config.validate(), Err(AppError::Config(_))));

    let mut config = Config::default();
    config.translation.max_retries = 0;
    assert!(matches!(config.validate(), Err(AppError::Config(_))));

    let mut config = Config::default();
    config.translation.local_only = true;
    config.translation.local_model.model = String::new();
    assert!(matches!(config.validate(), Err(AppError::Config(_))));
}

/// Test loading a missing file
#[test]
fn test_load_withMissingFile_shouldReturnDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let config = Config::load(temp_dir.path().join("missing.json"))?;
    assert_eq!(config.translation.max_retries, 3);
    Ok(())
}

/// Test loading a partial file
#[test]
fn test_load_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{ "translation": { "requests_per_second": 5.0, "local_model": { "model": "mistral" } }, "log_level": "debug" }"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.translation.requests_per_second, 5.0);
    assert_eq!(config.translation.local_model.model, "mistral");
    assert_eq!(config.translation.local_model.endpoint, "http://localhost:11434");
    assert_eq!(config.translation.concurrent_requests, 5);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Test loading malformed JSON
#[test]
fn test_load_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load(&path).is_err());
    Ok(())
}
