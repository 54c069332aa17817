/*!
 * Resumable run checkpoints.
 *
 * The progress store owns one small JSON document per (locale, source file)
 * pair, living next to the target corpus file. The document is created at
 * run start, rewritten atomically after every processed record, deleted on
 * clean completion, and retained when a run is interrupted so the next run
 * can resume where it stopped.
 *
 * A sha-256 digest of the source corpus guards resumes: when the source
 * changed between runs, the stale checkpoint is discarded.
 */

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Outcome of one record within a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Claimed but not yet persisted
    Pending,
    /// Translated (or confirmed in sync) and persisted
    Done,
    /// Persisted with source-text fallback after translation failure
    Failed,
}

/// Persisted checkpoint document for one (locale, source file) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressDocument {
    /// Unique id of the run that created this document
    pub run_id: String,

    /// Target locale the run is synchronizing
    pub locale: String,

    /// Source corpus file the run reads from
    pub source_file: String,

    /// Hex sha-256 of the source corpus at run start
    pub source_digest: String,

    /// RFC 3339 creation timestamp
    pub started_at: String,

    /// RFC 3339 timestamp of the last checkpoint write
    pub updated_at: String,

    /// Per-record outcomes, keyed by record id
    pub entries: BTreeMap<String, EntryStatus>,
}

impl ProgressDocument {
    fn new(locale: &str, source_file: &str, source_digest: &str) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            run_id: Uuid::new_v4().to_string(),
            locale: locale.to_string(),
            source_file: source_file.to_string(),
            source_digest: source_digest.to_string(),
            started_at: now.clone(),
            updated_at: now,
            entries: BTreeMap::new(),
        }
    }

    /// Whether a record finished (successfully) in a previous pass
    pub fn is_done(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(EntryStatus::Done))
    }

    /// Ids that ended failed
    pub fn failed_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, s)| **s == EntryStatus::Failed)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Count of entries with the given status
    pub fn count(&self, status: EntryStatus) -> usize {
        self.entries.values().filter(|s| **s == status).count()
    }
}

/// Store managing the on-disk checkpoint document
pub struct ProgressStore {
    /// Path of the checkpoint document
    path: PathBuf,
}

impl ProgressStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the underlying document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an unfinished run left a checkpoint behind
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the checkpoint for a resumed run, or create a fresh one.
    ///
    /// A stale document (different source digest or locale, or one that
    /// cannot be decoded) is discarded with a warning.
    pub fn open_or_create(
        &self,
        locale: &str,
        source_file: &str,
        source_digest: &str,
    ) -> Result<ProgressDocument> {
        if self.exists() {
            match self.load() {
                Ok(doc) if doc.locale == locale && doc.source_digest == source_digest => {
                    info!(
                        "Resuming run {} for '{}' ({} record(s) already done)",
                        &doc.run_id[..8],
                        locale,
                        doc.count(EntryStatus::Done)
                    );
                    return Ok(doc);
                }
                Ok(_) => {
                    warn!(
                        "Discarding stale checkpoint {}: source corpus or locale changed",
                        self.path.display()
                    );
                }
                Err(e) => {
                    warn!(
                        "Discarding unreadable checkpoint {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
        }

        let doc = ProgressDocument::new(locale, source_file, source_digest);
        self.save(&doc)?;
        debug!(
            "Created checkpoint {} (run {})",
            self.path.display(),
            &doc.run_id[..8]
        );
        Ok(doc)
    }

    fn load(&self) -> Result<ProgressDocument> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read checkpoint: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to decode checkpoint: {}", self.path.display()))
    }

    /// Persist the document atomically (temp file in the same directory,
    /// then rename over the target).
    pub fn save(&self, doc: &ProgressDocument) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        let json = serde_json::to_string_pretty(doc).context("Failed to encode checkpoint")?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .context("Failed to create checkpoint temp file")?;
        temp.write_all(json.as_bytes())
            .context("Failed to write checkpoint temp file")?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to persist checkpoint: {}", self.path.display()))?;
        Ok(())
    }

    /// Record a per-record outcome and checkpoint immediately
    pub fn mark(&self, doc: &mut ProgressDocument, id: &str, status: EntryStatus) -> Result<()> {
        doc.entries.insert(id.to_string(), status);
        doc.updated_at = Utc::now().to_rfc3339();
        self.save(doc)
    }

    /// Remove the checkpoint after a clean run; a completed run leaves no
    /// residue behind.
    pub fn finish(&self) -> Result<()> {
        if self.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove checkpoint: {}", self.path.display()))?;
            debug!("Removed checkpoint {}", self.path.display());
        }
        Ok(())
    }
}

/// Hex sha-256 digest of a file's contents
pub fn digest_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = fs::read(path)
        .with_context(|| format!("Failed to read file for digest: {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}
