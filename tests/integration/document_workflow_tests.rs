/*!
 * End-to-end document translation through the controller
 *
 * Each test writes a small document, translates it with mock backends and
 * reads the saved output back.
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use doctranslate::app_config::Config;
use doctranslate::app_controller::Controller;
use doctranslate::document::{DocumentKind, Presentation, Workbook, WordDocument};
use doctranslate::file_utils::ISSUES_LOG_NAME;
use doctranslate::providers::mock::{MockBackend, MockFallback};
use crate::common::{self, ShapeSpec};

fn controller(backend: Option<Arc<MockBackend>>, fallback: Arc<MockFallback>) -> Controller {
    controller_with_config(Config::default(), backend, fallback)
}

fn controller_with_config(config: Config, backend: Option<Arc<MockBackend>>, fallback: Arc<MockFallback>) -> Controller {
    let online = backend.map(|b| b as Arc<dyn doctranslate::providers::TranslationBackend>);
    let dispatcher = common::dispatcher_with(online, fallback, config.translation.requests_per_second);
    Controller::with_dispatcher(config, dispatcher).quiet()
}

/// Test that every non-blank run of a presentation is sent exactly once
#[tokio::test(start_paused = true)]
async fn test_controller_run_withPptx_shouldTranslateEveryRunOnce() -> Result<()> {
    common::init_test_logging();
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("deck.pptx");
    common::write_pptx(
        &input,
        &[
            vec![
                ShapeSpec::Text(vec![vec!["Hello", "   "], vec!["World"]]),
                ShapeSpec::Picture,
                ShapeSpec::Text(vec![vec!["Good morning"]]),
            ],
            vec![ShapeSpec::Text(vec![vec!["Agenda"], vec![" \t "], vec!["Thanks"]])],
        ],
    )?;

    let backend = Arc::new(MockBackend::working());
    let fallback = Arc::new(MockFallback::new());
    let report = controller(Some(backend.clone()), fallback.clone()).run(&input, "de", None).await?;

    assert_eq!(backend.calls(), 5);
    assert_eq!(fallback.calls(), 0);
    assert_eq!(report.kind, DocumentKind::Presentation);
    assert_eq!(report.total, 5);
    assert_eq!(report.translated, 5);
    assert!(report.is_success());
    assert_eq!(report.output, temp_dir.path().join("deck_translated.pptx"));

    let translated = Presentation::load(&report.output)?;
    let runs: Vec<(String, &str)> = translated
        .fragments()
        .iter()
        .map(|f| (f.location.to_string(), f.text.as_str()))
        .collect();
    assert_eq!(
        runs,
        vec![
            ("Slide 1, Shape 1, Paragraph 1, Run 1".to_string(), "[de] Hello"),
            ("Slide 1, Shape 1, Paragraph 2, Run 1".to_string(), "[de] World"),
            ("Slide 1, Shape 3, Paragraph 1, Run 1".to_string(), "[de] Good morning"),
            ("Slide 2, Shape 1, Paragraph 1, Run 1".to_string(), "[de] Agenda"),
            ("Slide 2, Shape 1, Paragraph 3, Run 1".to_string(), "[de] Thanks"),
        ]
    );

    // Whitespace runs are left as they were
    assert!(common::read_part(&report.output, "ppt/slides/slide2.xml")?.contains("<a:t>   </a:t>"));
    assert!(common::read_part(&report.output, "ppt/slides/slide1.xml")?.contains("<a:t> \t </a:t>"));
    assert!(!temp_dir.path().join(ISSUES_LOG_NAME).exists());
    Ok(())
}

/// Test a document whose translation is throttled twice before succeeding
#[tokio::test(start_paused = true)]
async fn test_controller_run_withThrottledBackend_shouldRetryWithoutErrors() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("report.docx");
    common::write_docx(&input, &[vec!["Introduction"], vec!["Results"], vec!["Conclusion"]])?;

    let mut config = Config::default();
    config.translation.concurrent_requests = 1;
    let backend = Arc::new(MockBackend::flaky(2));
    let fallback = Arc::new(MockFallback::new());
    let started = tokio::time::Instant::now();
    let report = controller_with_config(config, Some(backend.clone()), fallback.clone())
        .run(&input, "fr", None)
        .await?;

    assert!(report.is_success());
    assert_eq!(report.translated, 3);
    assert_eq!(report.fallbacks, 0);
    assert_eq!(backend.calls(), 5);
    assert_eq!(fallback.calls(), 0);
    // Backoffs of one and two seconds on the first fragment
    assert!(started.elapsed() >= std::time::Duration::from_secs(3));

    let translated = WordDocument::load(&report.output)?;
    let texts: Vec<&str> = translated.fragments().iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["[fr] Introduction", "[fr] Results", "[fr] Conclusion"]);
    Ok(())
}

/// Test that a backend failing every call still produces a complete document
#[tokio::test(start_paused = true)]
async fn test_controller_run_withFailingBackend_shouldFallBackForEveryCell() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("budget.xlsx");
    common::write_xlsx(&input)?;

    let backend = Arc::new(MockBackend::failing());
    let fallback = Arc::new(MockFallback::echo());
    let report = controller(Some(backend.clone()), fallback.clone()).run(&input, "es", None).await?;

    assert!(report.is_success());
    assert_eq!(report.total, 4);
    assert_eq!(report.translated, 4);
    assert_eq!(report.fallbacks, 4);
    // Terminal errors are not retried
    assert_eq!(backend.calls(), 4);
    assert_eq!(fallback.calls(), 4);

    let translated = Workbook::load(&report.output)?;
    let texts: Vec<&str> = translated.fragments().iter().map(|f| f.text.as_str()).collect();
    assert_eq!(texts, vec!["Quarterly report", "Revenue", "Notes here", "Revenue"]);
    Ok(())
}

/// Test local-only translation to an explicit output path
#[tokio::test(start_paused = true)]
async fn test_controller_run_localOnlyWithOutputPath_shouldWriteThere() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("letter.docx");
    let output = temp_dir.path().join("out").join("brief.docx");
    common::write_docx(&input, &[vec!["Dear ", "Sir"]])?;

    let fallback = Arc::new(MockFallback::new());
    let report = controller(None, fallback.clone()).run(&input, "de", Some(&output)).await?;

    assert_eq!(report.output, output);
    assert_eq!(report.fallbacks, 0);
    assert_eq!(fallback.calls(), 1);
    assert!(!temp_dir.path().join("letter_translated.docx").exists());

    let translated = WordDocument::load(&output)?;
    assert_eq!(translated.fragments()[0].text, MockFallback::expected("Dear Sir", "de"));
    Ok(())
}

/// Test legacy documents end as plain text next to the input
#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn test_controller_run_withLegacyDoc_shouldWriteTextFile() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "memo.doc", "Meeting moved to Friday.")?;

    let mut config = Config::default();
    config.documents.legacy_extractor = "cat".to_string();
    let backend = Arc::new(MockBackend::working());
    let report = controller_with_config(config, Some(backend.clone()), Arc::new(MockFallback::new()))
        .run(&input, "it", None)
        .await?;

    assert_eq!(report.kind, DocumentKind::LegacyDoc);
    assert_eq!(report.output, temp_dir.path().join("memo_translated.txt"));
    assert_eq!(backend.calls(), 1);
    assert_eq!(fs::read_to_string(&report.output)?, "[it] Meeting moved to Friday.");
    Ok(())
}

/// Test that a document without text is saved unchanged
#[tokio::test(start_paused = true)]
async fn test_controller_run_withBlankDocument_shouldSaveWithoutCalls() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = temp_dir.path().join("blank.docx");
    common::write_docx(&input, &[vec!["  "], vec![]])?;

    let backend = Arc::new(MockBackend::working());
    let report = controller(Some(backend.clone()), Arc::new(MockFallback::new()))
        .run(&input, "fr", None)
        .await?;

    assert_eq!(report.total, 0);
    assert!(report.is_success());
    assert_eq!(backend.calls(), 0);
    assert_eq!(
        common::read_part(&report.output, "word/document.xml")?,
        common::read_part(&input, "word/document.xml")?
    );
    Ok(())
}
