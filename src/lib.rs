/*!
 * # doctranslate - Office document translation
 *
 * A Rust library that translates PowerPoint, Word and Excel documents in
 * place, and the text of PDF and legacy Word files, through online
 * translation services with a local model as fallback.
 *
 * ## Features
 *
 * - Translate text runs of PPTX slides, paragraphs of DOCX documents and
 *   text cells of XLSX workbooks, keeping everything else untouched
 * - Extract and translate the text of PDF and legacy DOC files
 * - Translate with DeepL (when an API key is set) or Google Translate
 * - Fall back to a local model served by Ollama when the online backend
 *   gives up, or use it exclusively
 * - Shared rate limit, retries with exponential backoff on throttling
 * - Bounded parallel translation of fragments
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `document`: Document formats and their translatable fragments
 * - `translation`: Rate limiting, backend dispatch and the parallel pipeline
 * - `providers`: Client implementations for the translation backends:
 *   - `providers::deepl`: DeepL API client
 *   - `providers::google`: Google Translate client
 *   - `providers::local`: Local model client (Ollama)
 * - `app_controller`: Document lifecycle and main application controller
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, DocumentDriver, DocumentState, TranslationReport};
pub use document::{Document, DocumentKind, Fragment, FragmentLocation};
pub use errors::{AppError, DocumentError, FragmentApplyError, ProviderError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use translation::{ParallelTranslationPipeline, RateLimiter, TranslationDispatcher};
