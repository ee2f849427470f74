/*!
 * Parallel fragment translation.
 *
 * Every translatable fragment becomes one dispatcher call. Calls run with
 * bounded concurrency and their results are written back as they complete,
 * in whatever order that is. The call returns only after every fragment has
 * resolved, so the caller can save a consistent document afterwards.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error};
use std::fmt;
use std::time::{Duration, Instant};

use crate::document::{Fragment, FragmentLocation};
use crate::errors::FragmentApplyError;
use crate::providers::preview;

use super::dispatcher::{TranslationDispatcher, TranslationSource};

/// Characters of the original text kept in an error record
const ERROR_PREVIEW_CHARS: usize = 50;

/// Something translated text can be written back into
pub trait FragmentTarget {
    /// Replace the text of fragment `id`
    fn apply(&mut self, id: usize, text: &str) -> Result<(), FragmentApplyError>;
}

/// A fragment whose translation could not be written back
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub location: FragmentLocation,
    /// Original text, truncated for display
    pub original_text: String,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: '{}' ({})", self.location, self.original_text, self.message)
    }
}

/// Result of translating one document's fragments
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    /// Fragments handed to the dispatcher
    pub dispatched: usize,
    /// Fragments whose translation was written back
    pub translated: usize,
    /// Translations produced by the fallback after the online backend gave up
    pub fallbacks: usize,
    /// Fragments whose translation could not be written back
    pub errors: Vec<ErrorRecord>,
    pub elapsed: Duration,
}

impl PipelineOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Bounded pool of dispatcher calls over a document's fragments
#[derive(Debug, Clone)]
pub struct ParallelTranslationPipeline {
    dispatcher: TranslationDispatcher,
    concurrency: usize,
}

impl ParallelTranslationPipeline {
    /// Default number of fragments in flight
    pub const DEFAULT_CONCURRENCY: usize = 5;

    pub fn new(dispatcher: TranslationDispatcher, concurrency: usize) -> Self {
        Self {
            dispatcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn dispatcher(&self) -> &TranslationDispatcher {
        &self.dispatcher
    }

    /// Translate all fragments and write the results into `target`
    ///
    /// # Arguments
    /// * `fragments` - Fragments in document order
    /// * `target` - Receives each translation as it completes
    /// * `target_language` - Target language code
    /// * `progress_callback` - Called with (completed, total) once per finished fragment
    ///
    /// # Returns
    /// * `PipelineOutcome` - Counts and the error records of fragments that could not be written
    pub async fn run<T, F>(
        &self,
        fragments: &[Fragment],
        target: &mut T,
        target_language: &str,
        progress_callback: F,
    ) -> PipelineOutcome
    where
        T: FragmentTarget + ?Sized,
        F: Fn(usize, usize),
    {
        let start_time = Instant::now();
        let pending: Vec<&Fragment> = fragments.iter().filter(|f| f.is_translatable()).collect();
        let total = pending.len();

        let mut outcome = PipelineOutcome {
            dispatched: total,
            ..PipelineOutcome::default()
        };

        let mut results = stream::iter(pending)
            .map(|fragment| {
                let dispatcher = &self.dispatcher;
                async move {
                    let translation = dispatcher.translate_detailed(&fragment.text, target_language).await;
                    (fragment, translation)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut completed = 0;
        while let Some((fragment, translation)) = results.next().await {
            if translation.source == TranslationSource::Fallback {
                outcome.fallbacks += 1;
            }

            match target.apply(fragment.id, &translation.text) {
                Ok(()) => {
                    debug!("Fragment {} at {} translated", fragment.id, fragment.location);
                    outcome.translated += 1;
                }
                Err(e) => {
                    error!("Failed to apply translation at {}: {}", fragment.location, e);
                    outcome.errors.push(ErrorRecord {
                        location: fragment.location.clone(),
                        original_text: preview(&fragment.text, ERROR_PREVIEW_CHARS),
                        message: e.to_string(),
                    });
                }
            }

            completed += 1;
            progress_callback(completed, total);
        }

        outcome.elapsed = start_time.elapsed();
        outcome
    }
}
