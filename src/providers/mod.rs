/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration
 * - Anthropic: Anthropic API integration
 *
 * Adapters do one thing: send a single unit of text and return its
 * translation. Retry, backoff, pacing and fallback policy live in the
 * translation driver, so they apply uniformly to every provider.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One unit of text to translate: a question, one option, or an explanation
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// The text to translate
    pub text: String,

    /// Source language code
    pub source_language: String,

    /// Target locale code
    pub target_locale: String,

    /// Resolved system prompt for the provider
    pub system_prompt: String,

    /// Model name to use
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,
}

/// Common trait for all translation providers
///
/// A single-method capability: hand over one scalar string, get back its
/// translation. Implementations must not batch or concatenate units.
#[async_trait]
pub trait TranslationClient: Send + Sync + Debug {
    /// Translate one unit of text
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn probe(&self, model: &str) -> Result<(), ProviderError>;

    /// Provider name for logs and summaries
    fn name(&self) -> &'static str;
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
