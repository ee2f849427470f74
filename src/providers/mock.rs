/*!
 * Mock backend implementations for testing.
 *
 * This module provides mock backends that simulate different behaviors:
 * - `MockBackend::working()` - Always succeeds with a tagged translation
 * - `MockBackend::flaky(n)` - Throttled `n` times, then succeeds
 * - `MockBackend::rate_limited()` - Always throttled
 * - `MockBackend::failing()` - Always fails with a terminal error
 * - `MockFallback` - Infallible fallback that tags its output
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{FallbackBackend, TranslationBackend};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails with a retryable error for the first `failures` calls
    Flaky { failures: usize },
    /// Always fails with a retryable error
    RateLimited,
    /// Always fails with a non-retryable error
    Failing,
    /// Succeeds after a delay
    Slow { delay_ms: u64 },
}

/// Mock online backend for testing dispatch behavior
#[derive(Debug, Clone)]
pub struct MockBackend {
    behavior: MockBehavior,
    /// Shared call counter, so clones observe the same calls
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    pub fn rate_limited() -> Self {
        Self::new(MockBehavior::RateLimited)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of translate calls seen so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The text a successful call returns
    pub fn expected(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(Self::expected(text, target_language)),
            MockBehavior::Flaky { failures } if count < failures => Err(ProviderError::RateLimitExceeded(
                format!("Simulated throttling on call {}", count + 1),
            )),
            MockBehavior::Flaky { .. } => Ok(Self::expected(text, target_language)),
            MockBehavior::RateLimited => Err(ProviderError::RateLimitExceeded("Simulated throttling".to_string())),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated backend failure".to_string(),
            }),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Self::expected(text, target_language))
            }
        }
    }
}

/// Mock fallback backend, tags its output so tests can tell where a result came from
#[derive(Debug, Clone, Default)]
pub struct MockFallback {
    calls: Arc<AtomicUsize>,
    /// Return the input unchanged, like a failed local model
    echo: bool,
}

impl MockFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fallback that hands back the original text
    pub fn echo() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            echo: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn expected(text: &str, target_language: &str) -> String {
        format!("[local {}] {}", target_language, text)
    }
}

#[async_trait]
impl FallbackBackend for MockFallback {
    fn name(&self) -> &str {
        "mock fallback"
    }

    async fn translate(&self, text: &str, target_language: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.echo {
            text.to_string()
        } else {
            Self::expected(text, target_language)
        }
    }
}
