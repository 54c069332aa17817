/*!
 * Tests for the translation driver: retry, backoff exhaustion, fallback,
 * and unit independence
 */

use quizloc::corpus::QuizRecord;
use quizloc::providers::mock::MockTranslator;
use crate::common;

fn sample_record() -> QuizRecord {
    QuizRecord::new(
        "q1".to_string(),
        "What color is the sky?".to_string(),
        vec!["Red".to_string(), "Blue".to_string()],
        1,
        Some("Rayleigh scattering.".to_string()),
    )
}

/// A working provider translates a unit in one request
#[tokio::test]
async fn test_translate_unit_withWorkingProvider_shouldTranslate() {
    let mock = MockTranslator::working();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let unit = service.translate_unit("hello", "en", "es").await;

    assert_eq!(unit.text, "[es] hello");
    assert!(!unit.fell_back);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Transient failures are retried until they succeed
#[tokio::test]
async fn test_translate_unit_withFlakyProvider_shouldRetryAndSucceed() {
    // Fails twice; the configured retry count of 2 allows three attempts
    let mock = MockTranslator::flaky(2);
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let unit = service.translate_unit("hello", "en", "es").await;

    assert_eq!(unit.text, "[es] hello");
    assert!(!unit.fell_back);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
}

/// Retry exhaustion falls back to the source text and flags the unit
#[tokio::test]
async fn test_translate_unit_withAlwaysFailingProvider_shouldFallBackToSource() {
    let mock = MockTranslator::failing();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let unit = service.translate_unit("hello", "en", "es").await;

    assert_eq!(unit.text, "hello");
    assert!(unit.fell_back);
    // retry_count = 2 in the test config: initial attempt plus two retries
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
}

/// Permanent failures are not retried before falling back
#[tokio::test]
async fn test_translate_unit_withPermanentFailure_shouldNotRetry() {
    let mock = MockTranslator::rejecting();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let unit = service.translate_unit("hello", "en", "es").await;

    assert_eq!(unit.text, "hello");
    assert!(unit.fell_back);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
}

/// Empty fields are returned untouched without a provider call
#[tokio::test]
async fn test_translate_unit_withEmptyText_shouldSkipProvider() {
    let mock = MockTranslator::working();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let unit = service.translate_unit("   ", "en", "es").await;

    assert_eq!(unit.text, "   ");
    assert!(!unit.fell_back);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
}

/// Fields are translated independently, one request per unit
#[tokio::test]
async fn test_translate_record_withWorkingProvider_shouldTranslateEachFieldSeparately() {
    let mock = MockTranslator::working();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let outcome = service.translate_record(&sample_record(), "en", "es").await;

    // text + two options + explanation = four independent units
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert!(!outcome.any_fallback);
    assert_eq!(outcome.record.id, "q1");
    assert_eq!(outcome.record.text, "[es] What color is the sky?");
    assert_eq!(outcome.record.options, vec!["[es] Red", "[es] Blue"]);
    assert_eq!(outcome.record.correct_index, 1);
    assert_eq!(
        outcome.record.explanation.as_deref(),
        Some("[es] Rayleigh scattering.")
    );
}

/// Identifier and correct index are carried over, never translated
#[tokio::test]
async fn test_translate_record_withFailingProvider_shouldKeepStructure() {
    let mock = MockTranslator::failing();
    let service = common::mock_service(Box::new(mock));

    let outcome = service.translate_record(&sample_record(), "en", "es").await;

    assert!(outcome.any_fallback);
    assert_eq!(outcome.record.id, "q1");
    assert_eq!(outcome.record.correct_index, 1);
    // Fallback keeps the source text per field
    assert_eq!(outcome.record.text, "What color is the sky?");
    assert_eq!(outcome.record.options, vec!["Red", "Blue"]);
}

/// A record without an explanation produces no explanation unit
#[tokio::test]
async fn test_translate_record_withoutExplanation_shouldSkipExplanationUnit() {
    let mock = MockTranslator::working();
    let counter = mock.request_counter();
    let service = common::mock_service(Box::new(mock));

    let mut record = sample_record();
    record.explanation = None;
    let outcome = service.translate_record(&record, "en", "es").await;

    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(outcome.record.explanation, None);
}
