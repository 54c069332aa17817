use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::app_config::Config;
use crate::corpus::extractor;
use crate::corpus::serializer;
use crate::errors::CorpusError;
use crate::file_utils::FileManager;
use crate::progress::{self, EntryStatus, ProgressStore};
use crate::translation::TranslationService;

use super::drift::{self, DriftStatus};

// @module: Batch orchestration of one sync run
//
// The orchestrator is a strictly sequential, single-worker scan over the
// source corpus in file order. One record is in flight at a time, which
// keeps the provider pacing trivial and the checkpoint order a prefix of
// the processing order. An interrupted run loses at most the in-flight
// record.
//
// The target corpus file is the only shared mutable resource. It is
// rewritten wholesale after each record (read-modify-write on the held
// content), so concurrent runs against the same locale are unsafe and must
// be serialized externally.

/// Lifecycle of one record within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    NotStarted,
    Translating,
    Translated,
    Failed,
    Persisted,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotStarted => "not-started",
            Self::Translating => "translating",
            Self::Translated => "translated",
            Self::Failed => "failed",
            Self::Persisted => "persisted",
        };
        write!(f, "{}", label)
    }
}

/// Outcome counts of one sync run for one locale
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Target locale of the run
    pub locale: String,

    /// Parsed source records considered
    pub source_records: usize,

    /// Records skipped because a previous pass already finished them
    pub resumed: usize,

    /// Records classified ok, nothing to do
    pub in_sync: usize,

    /// Records classified missing in the target
    pub missing: usize,

    /// Records classified as untranslated stubs
    pub stubs: usize,

    /// Records classified structurally malformed in the target
    pub malformed: usize,

    /// Records skipped because they were outside the fix-only scope
    pub out_of_scope: usize,

    /// Records translated and persisted cleanly
    pub translated: usize,

    /// Previously failed records re-translated despite classifying ok
    pub refixed: usize,

    /// Records persisted with source-text fallback
    pub failed: usize,

    /// Source record blocks that did not parse
    pub source_parse_failures: usize,
}

impl RunSummary {
    fn new(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            ..Default::default()
        }
    }

    /// Whether everything in scope ended ok or done
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.source_parse_failures == 0
    }

    /// One-line human summary for the final report
    pub fn report(&self) -> String {
        format!(
            "locale {}: {} record(s), {} in sync, {} resumed, {} translated ({} missing, {} stub, {} malformed, {} refixed), {} failed, {} out of scope, {} source parse failure(s)",
            self.locale,
            self.source_records,
            self.in_sync,
            self.resumed,
            self.translated,
            self.missing,
            self.stubs,
            self.malformed,
            self.refixed,
            self.failed,
            self.out_of_scope,
            self.source_parse_failures,
        )
    }
}

/// Drives extraction, drift detection, translation and persistence for one
/// locale at a time.
pub struct SyncOrchestrator<'a> {
    config: &'a Config,
    service: &'a TranslationService,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(config: &'a Config, service: &'a TranslationService) -> Self {
        Self { config, service }
    }

    /// Synchronize one target locale with the source corpus.
    ///
    /// With `fix_only`, records missing from the target are left alone and
    /// only broken ones (stubs, malformed blocks, previous failures) are
    /// reprocessed.
    pub async fn sync_locale(
        &self,
        locale: &str,
        fix_only: bool,
        bar: Option<&ProgressBar>,
    ) -> Result<RunSummary> {
        self.run(locale, fix_only, None, bar).await
    }

    /// One re-translation pass over specific record ids, used by the
    /// verifier's fix mode.
    pub async fn resync_records(
        &self,
        locale: &str,
        ids: &HashSet<String>,
        bar: Option<&ProgressBar>,
    ) -> Result<RunSummary> {
        self.run(locale, false, Some(ids), bar).await
    }

    async fn run(
        &self,
        locale: &str,
        fix_only: bool,
        id_filter: Option<&HashSet<String>>,
        bar: Option<&ProgressBar>,
    ) -> Result<RunSummary> {
        let source_path = &self.config.corpus.source_file;
        if !FileManager::file_exists(source_path) {
            return Err(anyhow!(
                "Source corpus does not exist: {}",
                source_path.display()
            ));
        }

        let source = extractor::extract_file(source_path, &self.config.source_language)?;
        if source.topics.is_empty() {
            return Err(CorpusError::NoTopics(source_path.display().to_string()).into());
        }
        if let Some(dup) = source.find_duplicate_id() {
            return Err(CorpusError::DuplicateId(dup.to_string()).into());
        }

        let source_digest = progress::digest_file(source_path)?;
        let target_path = self.config.corpus.target_file(locale);
        let mut target_content = if FileManager::file_exists(&target_path) {
            FileManager::read_to_string(&target_path)?
        } else {
            info!(
                "Target corpus {} does not exist yet, it will be created",
                target_path.display()
            );
            String::new()
        };

        let store = ProgressStore::new(self.config.corpus.progress_file(locale));
        let mut doc = store.open_or_create(
            locale,
            &source_path.display().to_string(),
            &source_digest,
        )?;

        let mut summary = RunSummary::new(locale);
        let marker = &self.config.pipeline.placeholder_marker;
        let record_delay = Duration::from_millis(self.config.pipeline.record_delay_ms);

        for topic in &source.topics {
            for extracted in &topic.records {
                let Some(source_record) = extracted.record.as_ref() else {
                    warn!(
                        "Unparseable source record block in topic '{}', skipping",
                        topic.name
                    );
                    summary.source_parse_failures += 1;
                    if let Some(bar) = bar {
                        bar.inc(1);
                    }
                    continue;
                };
                summary.source_records += 1;
                let id = source_record.id.as_str();

                if let Some(filter) = id_filter {
                    if !filter.contains(id) {
                        continue;
                    }
                }

                // Resume: finished records from an interrupted run stay done
                if doc.is_done(id) {
                    summary.resumed += 1;
                    if let Some(bar) = bar {
                        bar.inc(1);
                    }
                    continue;
                }

                // Classify against the current on-disk shape of the target
                let target = extractor::extract(&target_content, &target_path, locale);
                let status = drift::classify(source_record, target.extracted(id), marker);
                debug!("Record '{}' classified {}", id, status);

                let previously_failed =
                    matches!(doc.entries.get(id), Some(EntryStatus::Failed));

                // A record that fell back to source text classifies ok on
                // the next pass (its structure matches), so the retained
                // failed mark is what forces the re-translation.
                if status == DriftStatus::Ok && !previously_failed {
                    summary.in_sync += 1;
                    store
                        .mark(&mut doc, id, EntryStatus::Done)
                        .context("Checkpoint write failed")?;
                    if let Some(bar) = bar {
                        bar.inc(1);
                    }
                    continue;
                }

                match status {
                    DriftStatus::Ok => summary.refixed += 1,
                    DriftStatus::Missing => summary.missing += 1,
                    DriftStatus::Stub => summary.stubs += 1,
                    DriftStatus::Malformed => summary.malformed += 1,
                }

                if fix_only && status == DriftStatus::Missing && !previously_failed {
                    debug!("Record '{}' missing but outside fix-only scope", id);
                    summary.out_of_scope += 1;
                    if let Some(bar) = bar {
                        bar.inc(1);
                    }
                    continue;
                }

                // Claim the record before the translation starts; a crash
                // mid-flight leaves it pending and the next run redoes it.
                store
                    .mark(&mut doc, id, EntryStatus::Pending)
                    .context("Checkpoint write failed")?;
                debug!(
                    "Record '{}' {} -> {}",
                    id,
                    RecordState::NotStarted,
                    RecordState::Translating
                );

                let outcome = self
                    .service
                    .translate_record(source_record, &self.config.source_language, locale)
                    .await;
                let state = if outcome.any_fallback {
                    RecordState::Failed
                } else {
                    RecordState::Translated
                };
                debug!("Record '{}' {}", id, state);

                // Persist the record into the target corpus, then advance
                // the checkpoint. Order matters: a crash between the two
                // re-translates this record, which is wasteful but safe.
                let new_content =
                    serializer::upsert_record(&target_content, &topic.name, &outcome.record)?;
                FileManager::write_atomic(&target_path, &new_content).with_context(|| {
                    format!("Failed to write target corpus: {}", target_path.display())
                })?;
                target_content = new_content;

                let entry_status = if outcome.any_fallback {
                    summary.failed += 1;
                    EntryStatus::Failed
                } else {
                    summary.translated += 1;
                    EntryStatus::Done
                };
                store
                    .mark(&mut doc, id, entry_status)
                    .context("Checkpoint write failed")?;
                debug!("Record '{}' {}", id, RecordState::Persisted);

                if let Some(bar) = bar {
                    bar.inc(1);
                }

                // Record-level pacing on top of the per-unit delay
                if !record_delay.is_zero() {
                    tokio::time::sleep(record_delay).await;
                }
            }
        }

        // A clean completion leaves no checkpoint residue; failures keep
        // the document around for a later fix pass.
        if doc.count(EntryStatus::Failed) == 0 && summary.source_parse_failures == 0 {
            store.finish()?;
        } else {
            warn!(
                "Retaining checkpoint {} ({} failed record(s))",
                store.path().display(),
                doc.count(EntryStatus::Failed)
            );
        }

        info!("{}", summary.report());
        Ok(summary)
    }
}
