/*!
 * End-to-end pipeline tests: extraction, drift detection, translation,
 * persistence, resumability and verification against real files.
 */

use std::sync::atomic::Ordering;

use quizloc::app_config::Config;
use quizloc::corpus::extractor;
use quizloc::pipeline::{SyncOrchestrator, verify_files};
use quizloc::progress::{EntryStatus, ProgressStore, digest_file};
use quizloc::providers::mock::MockTranslator;
use quizloc::translation::TranslationService;

use crate::common;

/// Write the source corpus and return the ready-to-use config
fn setup(dir: &tempfile::TempDir, source: &str) -> Config {
    let config = common::test_config(dir.path());
    common::create_test_file(dir.path(), "en.quiz", source).unwrap();
    config
}

fn working_service() -> (TranslationService, std::sync::Arc<std::sync::atomic::AtomicUsize>) {
    let mock = MockTranslator::working();
    let counter = mock.request_counter();
    (common::mock_service(Box::new(mock)), counter)
}

/// The end-to-end scenario: a record absent from the target locale is
/// translated, persisted with its structure intact, and verifies clean.
#[tokio::test]
async fn test_sync_withMissingRecord_shouldCreateVerifiedTarget() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "Stop here", options: ["A", "B"], correctIndex: 0 },
]
"#,
    );
    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);

    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.missing, 1);
    assert_eq!(summary.translated, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.is_clean());

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    let record = target.record("gk1").expect("gk1 must exist after sync");
    assert_eq!(record.options.len(), 2);
    assert_eq!(record.correct_index, 0);
    assert_eq!(record.text, "[es] Stop here");

    let violations = verify_files(
        &config.corpus.source_file,
        &config.corpus.target_file("es"),
        "en",
        "es",
    )
    .unwrap();
    assert!(violations.is_empty());
}

/// A full sync of several topics ends clean and removes the checkpoint
#[tokio::test]
async fn test_sync_withFullCorpus_shouldTranslateEverythingAndFinish() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(&dir, common::sample_source_corpus());
    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);

    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.source_records, 3);
    assert_eq!(summary.translated, 3);
    assert!(summary.is_clean());

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    assert_eq!(target.record_ids(), vec!["gk1", "gk2", "sc1"]);
    // Topic structure mirrors the source
    assert_eq!(target.topics[0].name, "general_knowledge");
    assert_eq!(target.topics[1].name, "science");

    // Clean completion leaves no checkpoint residue
    assert!(!config.corpus.progress_file("es").exists());
}

/// Running the pipeline twice over an in-sync corpus is byte-stable and
/// issues no further translation calls
#[tokio::test]
async fn test_sync_withAlreadySyncedTarget_shouldBeIdempotent() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(&dir, common::sample_source_corpus());

    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    orchestrator.sync_locale("es", false, None).await.unwrap();
    let first_bytes = std::fs::read(config.corpus.target_file("es")).unwrap();

    // Second run with a fresh counter: everything classifies ok
    let (service, counter) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.in_sync, 3);
    assert_eq!(summary.translated, 0);
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let second_bytes = std::fs::read(config.corpus.target_file("es")).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

/// A resumed run processes exactly the records the interrupted run did not
/// finish
#[tokio::test]
async fn test_sync_withExistingCheckpoint_shouldResumeAfterDoneRecords() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(&dir, common::sample_source_corpus());

    // Simulate an interrupted earlier run that finished gk1 only
    let digest = digest_file(&config.corpus.source_file).unwrap();
    let store = ProgressStore::new(config.corpus.progress_file("es"));
    let mut doc = store
        .open_or_create(
            "es",
            &config.corpus.source_file.display().to_string(),
            &digest,
        )
        .unwrap();
    store.mark(&mut doc, "gk1", EntryStatus::Done).unwrap();

    let (service, counter) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.resumed, 1);
    assert_eq!(summary.translated, 2);
    // gk2 has 4 units (text + 3 options), sc1 has 4 (text + 2 options +
    // explanation); gk1 must not be retranslated
    assert_eq!(counter.load(Ordering::SeqCst), 8);

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    assert!(target.record("gk1").is_none());
    assert!(target.record("gk2").is_some());
    assert!(target.record("sc1").is_some());
}

/// When the capability always fails, output falls back to source text and
/// the record is reported failed, never silently ok
#[tokio::test]
async fn test_sync_withAlwaysFailingProvider_shouldFallBackAndReportFailed() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "Stop here", options: ["A", "B"], correctIndex: 0 },
]
"#,
    );
    let service = common::mock_service(Box::new(MockTranslator::failing()));
    let orchestrator = SyncOrchestrator::new(&config, &service);

    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.translated, 0);
    assert!(!summary.is_clean());

    // The fallback persists the source text, structure intact
    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    let record = target.record("gk1").unwrap();
    assert_eq!(record.text, "Stop here");
    assert_eq!(record.options, vec!["A", "B"]);

    // The checkpoint survives for a later fix pass and remembers the failure
    let store = ProgressStore::new(config.corpus.progress_file("es"));
    assert!(store.exists());
    let doc = store
        .open_or_create(
            "es",
            &config.corpus.source_file.display().to_string(),
            &digest_file(&config.corpus.source_file).unwrap(),
        )
        .unwrap();
    assert_eq!(doc.failed_ids(), vec!["gk1"]);
}

/// A later run with a healthy provider re-translates records the failed
/// run persisted as source-text fallbacks
#[tokio::test]
async fn test_sync_withRetainedFailure_shouldRefixOnNextRun() {
    common::init_test_logging();
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "Stop here", options: ["A", "B"], correctIndex: 0 },
]
"#,
    );

    let service = common::mock_service(Box::new(MockTranslator::failing()));
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let failed_run = orchestrator.sync_locale("es", false, None).await.unwrap();
    assert_eq!(failed_run.failed, 1);

    // The fallback record structurally matches the source, so only the
    // retained checkpoint tells the next run it still needs work
    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let repair_run = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(repair_run.refixed, 1);
    assert_eq!(repair_run.translated, 1);
    assert!(repair_run.is_clean());

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    assert_eq!(target.record("gk1").unwrap().text, "[es] Stop here");
    assert!(!config.corpus.progress_file("es").exists());
}

/// Stub records are retranslated while in-sync siblings keep their bytes
#[tokio::test]
async fn test_sync_withStubRecord_shouldReplaceStubAndPreserveSiblings() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "One?", options: ["A", "B"], correctIndex: 0 },
  { id: "gk2", text: "Two?", options: ["C", "D"], correctIndex: 1 },
]
"#,
    );

    // gk1 is a stub; gk2 is already translated, with odd spacing that a
    // re-render would normalize away
    let sibling = "{ id: 'gk2',  text: 'Dos?', options: ['Ce', 'De'], correctIndex: 1 }";
    let target_content = format!(
        "general: [\n  {{ id: \"gk1\", text: \"TODO_TRANSLATE\", options: [\"A\", \"B\"], correctIndex: 0 }},\n  {},\n]\n",
        sibling
    );
    common::create_test_file(dir.path(), "es.quiz", &target_content).unwrap();

    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.stubs, 1);
    assert_eq!(summary.in_sync, 1);
    assert_eq!(summary.translated, 1);

    let updated = std::fs::read_to_string(config.corpus.target_file("es")).unwrap();
    assert!(updated.contains(sibling), "sibling bytes must be preserved");

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    assert_eq!(target.record("gk1").unwrap().text, "[es] One?");
}

/// A malformed target record (wrong option count) is rebuilt from source
#[tokio::test]
async fn test_sync_withMalformedTarget_shouldRebuildRecord() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "One?", options: ["A", "B", "C"], correctIndex: 2 },
]
"#,
    );
    common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"general: [
  { id: "gk1", text: "Uno?", options: ["A", "B"], correctIndex: 0 },
]
"#,
    )
    .unwrap();

    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.translated, 1);

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    let record = target.record("gk1").unwrap();
    assert_eq!(record.options.len(), 3);
    assert_eq!(record.correct_index, 2);

    let violations = verify_files(
        &config.corpus.source_file,
        &config.corpus.target_file("es"),
        "en",
        "es",
    )
    .unwrap();
    assert!(violations.is_empty());
}

/// Fix-only scope reprocesses broken records but leaves missing ones alone
#[tokio::test]
async fn test_sync_withFixOnly_shouldSkipMissingRecords() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "One?", options: ["A", "B"], correctIndex: 0 },
  { id: "gk2", text: "Two?", options: ["C", "D"], correctIndex: 1 },
]
"#,
    );
    common::create_test_file(
        dir.path(),
        "es.quiz",
        r#"general: [
  { id: "gk1", text: "TODO_TRANSLATE", options: ["A", "B"], correctIndex: 0 },
]
"#,
    )
    .unwrap();

    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", true, None).await.unwrap();

    assert_eq!(summary.stubs, 1);
    assert_eq!(summary.translated, 1);
    assert_eq!(summary.out_of_scope, 1);

    let target = extractor::extract_file(config.corpus.target_file("es"), "es").unwrap();
    assert_eq!(target.record("gk1").unwrap().text, "[es] One?");
    assert!(target.record("gk2").is_none());
}

/// The verifier-driven resync pass repairs exactly the flagged ids
#[tokio::test]
async fn test_resync_withFlaggedIds_shouldOnlyTouchThoseRecords() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(&dir, common::sample_source_corpus());

    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    orchestrator.sync_locale("es", false, None).await.unwrap();

    let (service, counter) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let ids = std::collections::HashSet::from(["gk2".to_string()]);
    let summary = orchestrator.resync_records("es", &ids, None).await.unwrap();

    // gk2 already classifies ok after the first sync, so nothing happens
    assert_eq!(summary.in_sync, 1);
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

/// A stale checkpoint from an older source corpus does not suppress work
#[tokio::test]
async fn test_sync_withStaleCheckpoint_shouldIgnoreOldEntries() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "One?", options: ["A", "B"], correctIndex: 0 },
]
"#,
    );

    // Checkpoint recorded against a different source digest
    let store = ProgressStore::new(config.corpus.progress_file("es"));
    let mut doc = store
        .open_or_create("es", "en.quiz", "an-outdated-digest")
        .unwrap();
    store.mark(&mut doc, "gk1", EntryStatus::Done).unwrap();

    let (service, counter) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);
    let summary = orchestrator.sync_locale("es", false, None).await.unwrap();

    assert_eq!(summary.resumed, 0);
    assert_eq!(summary.translated, 1);
    assert!(counter.load(Ordering::SeqCst) > 0);
}

/// A source corpus without topics is a hard error
#[test]
fn test_sync_withEmptySource_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(&dir, "not a corpus at all\n");
    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);

    let result = tokio_test::block_on(orchestrator.sync_locale("es", false, None));
    assert!(result.is_err());
}

/// Duplicate source ids are a hard error
#[tokio::test]
async fn test_sync_withDuplicateSourceIds_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let config = setup(
        &dir,
        r#"general: [
  { id: "gk1", text: "One?", options: ["A"], correctIndex: 0 },
  { id: "gk1", text: "Two?", options: ["B"], correctIndex: 0 },
]
"#,
    );
    let (service, _) = working_service();
    let orchestrator = SyncOrchestrator::new(&config, &service);

    let result = orchestrator.sync_locale("es", false, None).await;
    assert!(result.is_err());
}
