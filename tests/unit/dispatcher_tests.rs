/*!
 * Tests for backend dispatch through the parallel pipeline
 *
 * Time is paused in every test so backoff and rate limiting are observed
 * on tokio's virtual clock.
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use doctranslate::document::{Fragment, FragmentLocation};
use doctranslate::errors::{FragmentApplyError, ProviderError};
use doctranslate::providers::TranslationBackend;
use doctranslate::providers::mock::{MockBackend, MockFallback};
use doctranslate::translation::{FragmentTarget, ParallelTranslationPipeline, TranslationSource};
use crate::common;

/// Backend that throttles one particular text a fixed number of times
#[derive(Debug)]
struct ThrottledText {
    text: String,
    remaining_failures: Mutex<usize>,
    /// (text, virtual time) of every call
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ThrottledText {
    fn new(text: &str, failures: usize) -> Self {
        Self {
            text: text.to_string(),
            remaining_failures: Mutex::new(failures),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls_for(&self, text: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t == text)
            .map(|(_, at)| *at)
            .collect()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl TranslationBackend for ThrottledText {
    fn name(&self) -> &str {
        "throttled"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push((text.to_string(), Instant::now()));

        if text == self.text {
            let mut remaining = self.remaining_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ProviderError::RateLimitExceeded("Too many requests".to_string()));
            }
        }
        Ok(MockBackend::expected(text, target_language))
    }
}

#[derive(Default)]
struct RecordingTarget {
    texts: HashMap<usize, String>,
}

impl FragmentTarget for RecordingTarget {
    fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError> {
        self.texts.insert(id, text.to_string());
        Ok(())
    }
}

fn paragraphs(texts: &[&str]) -> Vec<Fragment> {
    texts
        .iter()
        .enumerate()
        .map(|(id, text)| Fragment {
            id,
            location: FragmentLocation::Paragraph { index: id + 1 },
            text: text.to_string(),
        })
        .collect()
}

/// Test a fragment that is throttled twice before succeeding
#[tokio::test(start_paused = true)]
async fn test_pipeline_withTwiceThrottledFragment_shouldRetryAndTranslateAll() {
    common::init_test_logging();
    let backend = Arc::new(ThrottledText::new("Second", 2));
    let dispatcher = common::dispatcher_with(Some(backend.clone()), Arc::new(MockFallback::new()), 100.0);
    let pipeline = ParallelTranslationPipeline::new(dispatcher, 5);

    let fragments = paragraphs(&["First", "Second", "Third"]);
    let mut target = RecordingTarget::default();
    let outcome = pipeline.run(&fragments, &mut target, "de", |_, _| {}).await;

    assert!(outcome.is_clean());
    assert_eq!(outcome.translated, 3);
    assert_eq!(outcome.fallbacks, 0);
    assert_eq!(target.texts[&1], "[de] Second");

    let attempts = backend.calls_for("Second");
    assert_eq!(attempts.len(), 3);
    assert!(attempts[1] - attempts[0] >= Duration::from_secs(1));
    assert!(attempts[2] - attempts[1] >= Duration::from_secs(2));
    assert_eq!(backend.calls_for("First").len(), 1);
    assert_eq!(backend.calls_for("Third").len(), 1);
}

/// Test the reported backoff schedule of a single call
#[tokio::test(start_paused = true)]
async fn test_translate_detailed_withTwoThrottles_shouldReportDoublingBackoffs() {
    let backend = Arc::new(ThrottledText::new("Hello", 2));
    let dispatcher = common::dispatcher_with(Some(backend), Arc::new(MockFallback::new()), 100.0);

    let translation = dispatcher.translate_detailed("Hello", "fr").await;

    assert_eq!(translation.text, "[fr] Hello");
    assert_eq!(translation.source, TranslationSource::Online);
    assert_eq!(translation.attempts, 3);
    assert_eq!(translation.backoffs, vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

/// Test that parallel workers share one rate limit
#[tokio::test(start_paused = true)]
async fn test_pipeline_withSharedLimiter_shouldSpaceAllCalls() {
    let backend = Arc::new(ThrottledText::new("never sent", 0));
    let dispatcher = common::dispatcher_with(Some(backend.clone()), Arc::new(MockFallback::new()), 2.0);
    let pipeline = ParallelTranslationPipeline::new(dispatcher, 5);

    let fragments = paragraphs(&["a", "b", "c", "d", "e", "f"]);
    let mut target = RecordingTarget::default();
    let outcome = pipeline.run(&fragments, &mut target, "es", |_, _| {}).await;
    assert_eq!(outcome.translated, 6);

    let mut times = backend.call_times();
    times.sort();
    assert_eq!(times.len(), 6);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(500));
    }
}

/// Test that exhausted retries end in the fallback without an error record
#[tokio::test(start_paused = true)]
async fn test_pipeline_withPersistentThrottling_shouldUseFallback() {
    let backend = Arc::new(MockBackend::rate_limited());
    let fallback = Arc::new(MockFallback::new());
    let dispatcher = common::dispatcher_with(Some(backend.clone()), fallback.clone(), 100.0);
    let pipeline = ParallelTranslationPipeline::new(dispatcher, 2);

    let fragments = paragraphs(&["One", "Two"]);
    let mut target = RecordingTarget::default();
    let outcome = pipeline.run(&fragments, &mut target, "it", |_, _| {}).await;

    assert!(outcome.is_clean());
    assert_eq!(outcome.fallbacks, 2);
    assert_eq!(backend.calls(), 6);
    assert_eq!(fallback.calls(), 2);
    assert_eq!(target.texts[&0], MockFallback::expected("One", "it"));
}

/// Test that local-only dispatch never reaches an online backend
#[tokio::test(start_paused = true)]
async fn test_pipeline_localOnly_shouldOnlyCallFallback() {
    let fallback = Arc::new(MockFallback::new());
    let dispatcher = common::dispatcher_with(None, fallback.clone(), 2.0);
    assert!(dispatcher.is_local_only());
    let pipeline = ParallelTranslationPipeline::new(dispatcher, 3);

    let fragments = paragraphs(&["One", "  ", "Three"]);
    let mut target = RecordingTarget::default();
    let outcome = pipeline.run(&fragments, &mut target, "nl", |_, _| {}).await;

    assert_eq!(outcome.dispatched, 2);
    assert_eq!(outcome.fallbacks, 0);
    assert_eq!(fallback.calls(), 2);
    assert!(!target.texts.contains_key(&1));
}
