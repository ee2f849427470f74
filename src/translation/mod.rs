/*!
 * Text translation over the configured backends.
 *
 * This module is split into several submodules:
 *
 * - `rate_limiter`: Minimum spacing between backend calls
 * - `dispatcher`: Backend selection, retry with backoff and local fallback
 * - `pipeline`: Bounded parallel translation of document fragments
 */

// Re-export main types for easier usage
pub use self::dispatcher::{RetryPolicy, Translation, TranslationDispatcher, TranslationSource};
pub use self::pipeline::{ErrorRecord, FragmentTarget, ParallelTranslationPipeline, PipelineOutcome};
pub use self::rate_limiter::RateLimiter;

// Submodules
pub mod dispatcher;
pub mod pipeline;
pub mod rate_limiter;
