use anyhow::{Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::{Config, DocumentConfig};
use crate::document::{Document, DocumentKind, Fragment};
use crate::errors::{AppError, DocumentError};
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::translation::{ErrorRecord, ParallelTranslationPipeline, PipelineOutcome, TranslationDispatcher};

// @module: Application controller for document translation

/// Lifecycle of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    NotLoaded,
    Loaded,
    FragmentsExtracted,
    Translated,
    Saved,
    Failed,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotLoaded => "not loaded",
            Self::Loaded => "loaded",
            Self::FragmentsExtracted => "fragments extracted",
            Self::Translated => "translated",
            Self::Saved => "saved",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Drives one document from loading to saving
///
/// Every step checks that the previous one happened; a failed load or save
/// leaves the driver in `Failed` for good.
#[derive(Debug)]
pub struct DocumentDriver {
    input: PathBuf,
    state: DocumentState,
    document: Option<Document>,
    fragments: Vec<Fragment>,
    outcome: Option<PipelineOutcome>,
}

impl DocumentDriver {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            state: DocumentState::NotLoaded,
            document: None,
            fragments: Vec::new(),
            outcome: None,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.document.as_ref().map(Document::kind)
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    fn expect_state(&self, expected: DocumentState, step: &str) -> Result<()> {
        if self.state != expected {
            return Err(anyhow!(
                "Cannot {} {}: document is {}, expected {}",
                step,
                self.input.display(),
                self.state,
                expected
            ));
        }
        Ok(())
    }

    fn transition(&mut self, next: DocumentState) {
        debug!("{}: {} -> {}", self.input.display(), self.state, next);
        self.state = next;
    }

    /// Open and parse the input file
    pub fn load(&mut self, config: &DocumentConfig) -> Result<DocumentKind> {
        self.expect_state(DocumentState::NotLoaded, "load")?;

        match Document::load(&self.input, config) {
            Ok(document) => {
                let kind = document.kind();
                self.document = Some(document);
                self.transition(DocumentState::Loaded);
                Ok(kind)
            }
            Err(e) => {
                self.transition(DocumentState::Failed);
                Err(AppError::from(e).into())
            }
        }
    }

    /// Collect the translatable fragments
    pub fn extract(&mut self) -> Result<&[Fragment]> {
        self.expect_state(DocumentState::Loaded, "extract")?;
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| anyhow!("No document loaded"))?;

        self.fragments = document.fragments().to_vec();
        self.transition(DocumentState::FragmentsExtracted);
        Ok(&self.fragments)
    }

    /// Translate all fragments and write the results into the document
    pub async fn translate<F>(
        &mut self,
        pipeline: &ParallelTranslationPipeline,
        target_language: &str,
        progress_callback: F,
    ) -> Result<&PipelineOutcome>
    where
        F: Fn(usize, usize),
    {
        self.expect_state(DocumentState::FragmentsExtracted, "translate")?;
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| anyhow!("No document loaded"))?;

        let outcome = pipeline
            .run(&self.fragments, document, target_language, progress_callback)
            .await;
        self.transition(DocumentState::Translated);
        Ok(self.outcome.insert(outcome))
    }

    /// Write the translated document
    pub fn save(&mut self, output: &Path) -> Result<()> {
        self.expect_state(DocumentState::Translated, "save")?;
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| anyhow!("No document loaded"))?;

        match document.save(output) {
            Ok(()) => {
                self.transition(DocumentState::Saved);
                Ok(())
            }
            Err(e) => {
                self.transition(DocumentState::Failed);
                Err(AppError::from(e).into())
            }
        }
    }
}

/// Result of translating one document
#[derive(Debug, Clone)]
pub struct TranslationReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: DocumentKind,
    /// Fragments sent for translation
    pub total: usize,
    /// Fragments whose translation was written back
    pub translated: usize,
    /// Translations that came from the local fallback
    pub fallbacks: usize,
    pub errors: Vec<ErrorRecord>,
    pub elapsed: Duration,
}

impl TranslationReport {
    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Final summary, one line per entry
    pub fn summary_lines(&self) -> Vec<String> {
        let noun = self.kind.fragment_noun();
        if self.is_success() {
            return vec![format!("All {} {} translated successfully.", self.translated, noun)];
        }

        let mut lines = vec![format!(
            "{} of {} {} could not be translated:",
            self.failed(),
            self.total,
            noun
        )];
        lines.extend(self.errors.iter().map(|record| format!("  {}", record)));
        lines
    }
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Shared dispatcher, one rate limiter for every document
    dispatcher: TranslationDispatcher,
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the real backends for the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let dispatcher = TranslationDispatcher::from_config(&config.translation);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a controller around an existing dispatcher
    pub fn with_dispatcher(config: Config, dispatcher: TranslationDispatcher) -> Self {
        Self {
            config,
            dispatcher,
            show_progress: true,
        }
    }

    /// Disable the progress bar
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one document
    ///
    /// # Arguments
    /// * `input_file` - Document to translate
    /// * `target_language` - Target language code
    /// * `output_file` - Output path, derived from the input when `None`
    ///
    /// # Returns
    /// * `Result<TranslationReport>` - Counts and per-fragment failures; setup
    ///   and extraction failures are returned as errors instead
    pub async fn run(
        &self,
        input_file: &Path,
        target_language: &str,
        output_file: Option<&Path>,
    ) -> Result<TranslationReport> {
        let start_time = Instant::now();

        if language_utils::validate_target_language(target_language).is_err() {
            return Err(AppError::Config(format!("Invalid target language code: {}", target_language)).into());
        }

        let mut driver = DocumentDriver::new(input_file);
        info!("Translating {} into {}", input_file.display(), target_language);
        let kind = driver.load(&self.config.documents)?;

        let total = driver.extract()?.len();
        info!(
            "{}: {} {} to translate with {}",
            kind,
            total,
            kind.fragment_noun(),
            self.dispatcher.backend_name()
        );

        let output_path = match output_file {
            Some(path) => path.to_path_buf(),
            None => kind.output_path(input_file),
        };

        let progress_bar = self.progress_bar(total as u64, kind);
        let pb = progress_bar.clone();
        let pipeline = ParallelTranslationPipeline::new(self.dispatcher.clone(), self.config.translation.concurrent_requests);

        let outcome = driver
            .translate(&pipeline, target_language, move |completed, _total| {
                pb.set_position(completed as u64);
            })
            .await?
            .clone();
        progress_bar.finish_and_clear();

        driver.save(&output_path)?;
        info!("Success: {}", output_path.display());

        let report = TranslationReport {
            input: input_file.to_path_buf(),
            output: output_path,
            kind,
            total,
            translated: outcome.translated,
            fallbacks: outcome.fallbacks,
            errors: outcome.errors,
            elapsed: start_time.elapsed(),
        };

        self.print_summary(&report);
        if !report.is_success() && self.config.documents.write_issues_log {
            self.write_issues_log(&report, target_language);
        }

        Ok(report)
    }

    fn progress_bar(&self, total: u64, kind: DocumentKind) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({percent}%) {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message(kind.fragment_noun().to_string());
        progress_bar
    }

    fn print_summary(&self, report: &TranslationReport) {
        let lines = report.summary_lines();
        if report.is_success() {
            for line in &lines {
                info!("{}", line);
            }
        } else {
            for line in &lines {
                error!("{}", line);
            }
        }

        if report.fallbacks > 0 {
            warn!("{} translation(s) came from the local fallback model", report.fallbacks);
        }
        info!("Finished in {}", Self::format_duration(report.elapsed));
    }

    fn write_issues_log(&self, report: &TranslationReport, target_language: &str) {
        let log_file_path = FileManager::issues_log_path(&report.output);
        let mut content = format!(
            "{} -> {} ({}, {})",
            report.input.display(),
            report.output.display(),
            target_language,
            self.dispatcher.backend_name()
        );
        for record in &report.errors {
            content.push_str("\n    ");
            content.push_str(&record.to_string());
        }

        if let Err(e) = FileManager::append_to_log_file(&log_file_path, &content) {
            warn!("Failed to write issues log: {}", e);
        } else {
            info!("Issues written to {}", log_file_path.display());
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

/// Whether an error returned by [`Controller::run`] came from the document itself
pub fn is_document_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<AppError>(), Some(AppError::Document(_)))
        || error.downcast_ref::<DocumentError>().is_some()
}
