/*!
 * Integration tests for controller setup and failure handling
 */

use anyhow::Result;
use std::sync::Arc;

use doctranslate::app_config::Config;
use doctranslate::app_controller::{Controller, is_document_error};
use doctranslate::errors::AppError;
use doctranslate::providers::mock::{MockBackend, MockFallback};
use crate::common;

fn mock_controller(backend: Arc<MockBackend>) -> Controller {
    let dispatcher = common::dispatcher_with(Some(backend), Arc::new(MockFallback::new()), 2.0);
    Controller::with_dispatcher(Config::default(), dispatcher).quiet()
}

/// Test controller creation with the real backends
#[test]
fn test_controller_with_config_withValidConfig_shouldSucceed() {
    let mut config = Config::default();
    config.translation.local_only = true;
    config.translation.concurrent_requests = 3;

    let controller = Controller::with_config(config).unwrap();
    assert_eq!(controller.config().translation.concurrent_requests, 3);
}

/// Test controller creation with an invalid configuration
#[test]
fn test_controller_with_config_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.translation.requests_per_second = -1.0;

    assert!(Controller::with_config(config).is_err());
}

/// Test a missing input file
#[tokio::test(start_paused = true)]
async fn test_controller_run_withMissingFile_shouldFailWithoutOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("missing.pptx");
    let backend = Arc::new(MockBackend::working());

    let error = mock_controller(backend.clone()).run(&input, "de", None).await.unwrap_err();

    assert!(is_document_error(&error));
    assert!(error.to_string().contains("not found"));
    assert!(!temp_dir.path().join("missing_translated.pptx").exists());
    assert_eq!(backend.calls(), 0);
    Ok(())
}

/// Test an unsupported extension
#[tokio::test(start_paused = true)]
async fn test_controller_run_withUnsupportedExtension_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "notes.txt", "plain notes")?;

    let error = mock_controller(Arc::new(MockBackend::working()))
        .run(&input, "de", None)
        .await
        .unwrap_err();

    assert!(is_document_error(&error));
    assert!(error.to_string().contains("Unsupported file type: .txt"));
    Ok(())
}

/// Test an invalid target language
#[tokio::test(start_paused = true)]
async fn test_controller_run_withInvalidLanguage_shouldFailBeforeLoading() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("letter.docx");
    common::write_docx(&input, &[vec!["Hello"]])?;
    let backend = Arc::new(MockBackend::working());

    let error = mock_controller(backend.clone()).run(&input, "xx-invalid", None).await.unwrap_err();

    assert!(matches!(error.downcast_ref::<AppError>(), Some(AppError::Config(_))));
    assert!(!is_document_error(&error));
    assert_eq!(backend.calls(), 0);
    assert!(!temp_dir.path().join("letter_translated.docx").exists());
    Ok(())
}

/// Test a corrupt package
#[tokio::test(start_paused = true)]
async fn test_controller_run_withCorruptPackage_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "deck.pptx", "PK but not really")?;

    let error = mock_controller(Arc::new(MockBackend::working()))
        .run(&input, "de", None)
        .await
        .unwrap_err();

    assert!(is_document_error(&error));
    Ok(())
}
