/*!
 * Mock provider implementation for testing.
 *
 * Behaviors:
 * - `MockTranslator::working()` - always succeeds with a tagged translation
 * - `MockTranslator::failing()` - always fails with a transient error
 * - `MockTranslator::flaky(n)` - fails the first n requests, then succeeds
 * - `MockTranslator::rejecting()` - always fails with a permanent error
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use super::{TranslationClient, TranslationRequest};

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a tagged translation
    Working,
    /// Always fails with a transient error
    Failing,
    /// Fails the first `fail_count` requests, then succeeds
    Flaky { fail_count: usize },
    /// Always fails with a permanent (non-retryable) error
    Rejecting,
}

/// Mock translation client for exercising driver and pipeline behavior
#[derive(Debug)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total requests received
    request_count: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Mock that always fails with a transient error
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock that fails the first `fail_count` requests, then succeeds
    pub fn flaky(fail_count: usize) -> Self {
        Self::new(MockBehavior::Flaky { fail_count })
    }

    /// Mock that always fails with a permanent error
    pub fn rejecting() -> Self {
        Self::new(MockBehavior::Rejecting)
    }

    /// Shared handle to the request counter
    pub fn request_counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    /// Number of translate calls received so far
    pub fn requests(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// The deterministic translation the working mock produces
    pub fn translate_text(text: &str, target_locale: &str) -> String {
        format!("[{}] {}", target_locale, text)
    }
}

#[async_trait]
impl TranslationClient for MockTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let seen = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(Self::translate_text(&request.text, &request.target_locale)),
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "mock connection failure".to_string(),
            )),
            MockBehavior::Flaky { fail_count } => {
                if seen < fail_count {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: "mock overload".to_string(),
                    })
                } else {
                    Ok(Self::translate_text(&request.text, &request.target_locale))
                }
            }
            MockBehavior::Rejecting => Err(ProviderError::AuthenticationError(
                "mock invalid key".to_string(),
            )),
        }
    }

    async fn probe(&self, _model: &str) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Rejecting => Err(ProviderError::AuthenticationError(
                "mock invalid key".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
