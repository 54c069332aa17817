/*!
 * Core translation driver.
 *
 * This module contains the TranslationService, which owns the retry,
 * backoff, pacing and fallback policy around a provider-agnostic
 * translation client. Units are single scalar fields; they are never
 * concatenated into batches, because no delimiter-preservation guarantee
 * exists for any provider.
 */

use anyhow::{Result, anyhow};
use log::{debug, warn};
use std::time::Duration;
use url::Url;

use crate::app_config::{Config, PipelineConfig, TranslationConfig, TranslationProviderKind};
use crate::corpus::QuizRecord;
use crate::language_utils;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAI;
use crate::providers::{TranslationClient, TranslationRequest};

/// Result of translating one unit of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedUnit {
    /// The translated text, or the original source text after fallback
    pub text: String,

    /// Whether the unit fell back to the source text after retry exhaustion
    pub fell_back: bool,
}

/// Result of translating every field of one record
#[derive(Debug, Clone)]
pub struct TranslatedRecord {
    /// The target-locale record
    pub record: QuizRecord,

    /// Whether any field fell back to source text
    pub any_fallback: bool,
}

/// Normalize an endpoint string into an absolute URL
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    if url.host_str().is_none() {
        return Err(anyhow!("Invalid host in endpoint: {}", endpoint));
    }

    Ok(url.to_string().trim_end_matches('/').to_string())
}

/// Main translation service driving a single provider client
pub struct TranslationService {
    /// Provider client
    client: Box<dyn TranslationClient>,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Pacing configuration
    pacing: PipelineConfig,
}

impl TranslationService {
    /// Create a new translation service from the application configuration
    pub fn new(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let endpoint = normalize_endpoint(&translation.get_endpoint())?;
        let timeout_secs = translation.get_timeout_secs();

        let client: Box<dyn TranslationClient> = match translation.provider {
            TranslationProviderKind::Ollama => Box::new(Ollama::new(endpoint, timeout_secs)),
            TranslationProviderKind::OpenAI => Box::new(OpenAI::new(
                translation.get_api_key(),
                endpoint,
                timeout_secs,
            )),
            TranslationProviderKind::Anthropic => Box::new(Anthropic::new(
                translation.get_api_key(),
                endpoint,
                timeout_secs,
            )),
        };

        Ok(Self {
            client,
            config: translation.clone(),
            pacing: config.pipeline.clone(),
        })
    }

    /// Create a translation service around an arbitrary client.
    ///
    /// Used by tests to inject mock providers; pacing comes from the given
    /// pipeline configuration so tests can disable delays.
    pub fn with_client(
        client: Box<dyn TranslationClient>,
        config: TranslationConfig,
        pacing: PipelineConfig,
    ) -> Self {
        Self {
            client,
            config,
            pacing,
        }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        self.client
            .probe(&self.config.get_model())
            .await
            .map_err(|e| anyhow!("Failed to connect to {}: {}", self.client.name(), e))
    }

    /// Resolve the system prompt template for a language pair
    fn system_prompt(&self, source_language: &str, target_locale: &str) -> String {
        let source_name = language_utils::language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target_name = language_utils::language_name(target_locale)
            .unwrap_or_else(|_| target_locale.to_string());

        self.config
            .common
            .system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name)
    }

    /// Translate one unit of text: a question, one option, or an explanation.
    ///
    /// Transient failures are retried up to the configured count with
    /// exponential backoff. When retries are exhausted, or the failure is
    /// permanent, the unit falls back to the source text so the run can
    /// continue; the caller marks the record failed. A fixed pacing delay
    /// is enforced after every provider call.
    pub async fn translate_unit(
        &self,
        text: &str,
        source_language: &str,
        target_locale: &str,
    ) -> TranslatedUnit {
        // Empty fields have nothing to translate
        if text.trim().is_empty() {
            return TranslatedUnit {
                text: text.to_string(),
                fell_back: false,
            };
        }

        let request = TranslationRequest {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_locale: target_locale.to_string(),
            system_prompt: self.system_prompt(source_language, target_locale),
            model: self.config.get_model(),
            temperature: self.config.common.temperature,
        };

        let retry_count = self.config.common.retry_count;
        let backoff_base_ms = self.config.common.retry_backoff_ms;
        let mut attempt = 0u32;
        let mut outcome = None;

        while attempt <= retry_count {
            match self.client.translate(&request).await {
                Ok(translated) => {
                    outcome = Some(TranslatedUnit {
                        text: translated,
                        fell_back: false,
                    });
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        "Transient translation failure (attempt {}/{}): {}",
                        attempt + 1,
                        retry_count + 1,
                        e
                    );
                    attempt += 1;
                    if attempt <= retry_count {
                        let backoff_ms = backoff_base_ms * (1u64 << (attempt - 1));
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
                Err(e) => {
                    warn!("Permanent translation failure, not retrying: {}", e);
                    break;
                }
            }
        }

        let unit = outcome.unwrap_or_else(|| {
            warn!(
                "Falling back to source text for unit after {} attempt(s)",
                attempt.max(1)
            );
            TranslatedUnit {
                text: text.to_string(),
                fell_back: true,
            }
        });

        // Inter-call pacing applies after every unit, success or not
        if self.pacing.unit_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.pacing.unit_delay_ms)).await;
        }

        unit
    }

    /// Translate every translatable field of a source record.
    ///
    /// Fields are translated independently; `id` and `correctIndex` are
    /// carried over from the source record untouched.
    pub async fn translate_record(
        &self,
        source: &QuizRecord,
        source_language: &str,
        target_locale: &str,
    ) -> TranslatedRecord {
        let mut any_fallback = false;

        let text = self
            .translate_unit(&source.text, source_language, target_locale)
            .await;
        any_fallback |= text.fell_back;

        let mut options = Vec::with_capacity(source.options.len());
        for option in &source.options {
            let unit = self
                .translate_unit(option, source_language, target_locale)
                .await;
            any_fallback |= unit.fell_back;
            options.push(unit.text);
        }

        let explanation = match &source.explanation {
            Some(explanation) => {
                let unit = self
                    .translate_unit(explanation, source_language, target_locale)
                    .await;
                any_fallback |= unit.fell_back;
                Some(unit.text)
            }
            None => None,
        };

        debug!(
            "Translated record '{}' into {} ({} field(s), fallback: {})",
            source.id,
            target_locale,
            2 + source.options.len(),
            any_fallback
        );

        TranslatedRecord {
            record: QuizRecord {
                id: source.id.clone(),
                text: text.text,
                options,
                correct_index: source.correct_index,
                explanation,
            },
            any_fallback,
        }
    }
}
