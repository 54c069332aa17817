/*!
 * Common test utilities for the quizloc test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use quizloc::app_config::{Config, PipelineConfig, TranslationCommonConfig, TranslationConfig};
use quizloc::providers::TranslationClient;
use quizloc::translation::TranslationService;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Route log output through env_logger when RUST_LOG is set
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small source corpus with two topics and three records
pub fn sample_source_corpus() -> &'static str {
    r#"general_knowledge: [
  {
    id: "gk1",
    text: "Which planet is known as the Red Planet?",
    options: ["Venus", "Mars", "Jupiter"],
    correctIndex: 1,
    explanation: "Iron oxide on the surface gives Mars its color.",
  },
  {
    id: "gk2",
    text: "How many continents are there?",
    options: ["Five", "Six", "Seven"],
    correctIndex: 2,
  },
]

science: [
  {
    id: "sc1",
    text: "What is the chemical symbol for water?",
    options: ["H2O", "CO2"],
    correctIndex: 0,
    explanation: "Two hydrogen atoms bonded to one oxygen atom.",
  },
]
"#
}

/// Pacing configuration with every delay disabled, for fast tests
pub fn no_delay_pipeline() -> PipelineConfig {
    PipelineConfig {
        unit_delay_ms: 0,
        record_delay_ms: 0,
        ..PipelineConfig::default()
    }
}

/// Translation settings with instant retries, for fast tests
pub fn fast_retry_translation() -> TranslationConfig {
    TranslationConfig {
        common: TranslationCommonConfig {
            retry_count: 2,
            retry_backoff_ms: 0,
            ..TranslationCommonConfig::default()
        },
        ..TranslationConfig::default()
    }
}

/// Build a translation service around an injected client, without pacing
pub fn mock_service(client: Box<dyn TranslationClient>) -> TranslationService {
    TranslationService::with_client(client, fast_retry_translation(), no_delay_pipeline())
}

/// Config rooted in a temp directory: source corpus at `en.quiz`,
/// per-locale files next to it, no pacing delays.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_locales = vec!["es".to_string()];
    config.corpus.source_file = dir.join("en.quiz");
    config.corpus.locales_dir = dir.to_path_buf();
    config.corpus.extension = "quiz".to_string();
    config.pipeline = no_delay_pipeline();
    config.translation = fast_retry_translation();
    config
}
