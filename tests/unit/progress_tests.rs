/*!
 * Tests for the progress checkpoint store
 */

use quizloc::progress::{EntryStatus, ProgressStore, digest_file};
use crate::common;

/// Creating a checkpoint writes the document to disk
#[test]
fn test_open_or_create_withNoExistingDocument_shouldCreateFile() {
    let dir = common::create_temp_dir().unwrap();
    let store = ProgressStore::new(dir.path().join(".es.progress.json"));

    assert!(!store.exists());
    let doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    assert!(store.exists());
    assert_eq!(doc.locale, "es");
    assert_eq!(doc.source_digest, "digest-1");
    assert!(doc.entries.is_empty());
}

/// Marks persist across a reopen with the same digest
#[test]
fn test_mark_withReopen_shouldResumeEntries() {
    let dir = common::create_temp_dir().unwrap();
    let store = ProgressStore::new(dir.path().join(".es.progress.json"));

    let mut doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    store.mark(&mut doc, "q1", EntryStatus::Done).unwrap();
    store.mark(&mut doc, "q2", EntryStatus::Failed).unwrap();

    let resumed = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    assert_eq!(resumed.run_id, doc.run_id);
    assert!(resumed.is_done("q1"));
    assert!(!resumed.is_done("q2"));
    assert_eq!(resumed.failed_ids(), vec!["q2"]);
    assert_eq!(resumed.count(EntryStatus::Done), 1);
}

/// A changed source digest discards the stale checkpoint
#[test]
fn test_open_or_create_withChangedDigest_shouldStartFresh() {
    let dir = common::create_temp_dir().unwrap();
    let store = ProgressStore::new(dir.path().join(".es.progress.json"));

    let mut doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    store.mark(&mut doc, "q1", EntryStatus::Done).unwrap();

    let fresh = store.open_or_create("es", "en.quiz", "digest-2").unwrap();
    assert_ne!(fresh.run_id, doc.run_id);
    assert!(fresh.entries.is_empty());
}

/// A different locale in the document discards the checkpoint
#[test]
fn test_open_or_create_withDifferentLocale_shouldStartFresh() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join(".progress.json");
    let store = ProgressStore::new(&path);

    let mut doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    store.mark(&mut doc, "q1", EntryStatus::Done).unwrap();

    let fresh = store.open_or_create("fr", "en.quiz", "digest-1").unwrap();
    assert!(fresh.entries.is_empty());
}

/// An unreadable checkpoint is discarded, not fatal
#[test]
fn test_open_or_create_withCorruptDocument_shouldStartFresh() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join(".es.progress.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = ProgressStore::new(&path);
    let doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    assert!(doc.entries.is_empty());
}

/// Finishing a run removes the document
#[test]
fn test_finish_withExistingDocument_shouldRemoveFile() {
    let dir = common::create_temp_dir().unwrap();
    let store = ProgressStore::new(dir.path().join(".es.progress.json"));

    store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    assert!(store.exists());

    store.finish().unwrap();
    assert!(!store.exists());

    // Finishing twice is harmless
    store.finish().unwrap();
}

/// Pending entries do not count as done
#[test]
fn test_mark_withPendingStatus_shouldNotCountAsDone() {
    let dir = common::create_temp_dir().unwrap();
    let store = ProgressStore::new(dir.path().join(".es.progress.json"));

    let mut doc = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    store.mark(&mut doc, "q1", EntryStatus::Pending).unwrap();

    let resumed = store.open_or_create("es", "en.quiz", "digest-1").unwrap();
    assert!(!resumed.is_done("q1"));
    assert_eq!(resumed.count(EntryStatus::Pending), 1);
}

/// Digest changes with file content
#[test]
fn test_digest_file_withChangedContent_shouldChange() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "a.quiz", "one").unwrap();
    let first = digest_file(&path).unwrap();

    std::fs::write(&path, "two").unwrap();
    let second = digest_file(&path).unwrap();

    assert_ne!(first, second);
    assert_eq!(first.len(), 64);
}
