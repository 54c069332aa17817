use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use anyhow::Result;
use log::debug;

use crate::corpus::extractor;

// @module: End-to-end structural verification of a target corpus
//
// The verifier is deliberately independent of the sync pass: both corpora
// are re-extracted from disk, never reused from memory, so serialization
// bugs that corrupt the file surface here instead of being masked by
// in-memory state.

/// Kind of structural violation found in a target corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// A source record id has no counterpart in the target
    MissingInTarget,
    /// A target record id has no counterpart in the source
    UnexpectedInTarget,
    /// Source and target disagree on the number of options
    OptionCountMismatch,
    /// The target's correct index does not address an option
    CorrectIndexOutOfRange,
    /// A target record block did not match the field anchors
    UnparseableTarget,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MissingInTarget => "missing in target",
            Self::UnexpectedInTarget => "unexpected in target",
            Self::OptionCountMismatch => "option count mismatch",
            Self::CorrectIndexOutOfRange => "correct index out of range",
            Self::UnparseableTarget => "unparseable target record",
        };
        write!(f, "{}", label)
    }
}

/// One reported violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Record id, or a topic-positional label for unparseable blocks
    pub id: String,

    /// What is wrong with it
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.kind)
    }
}

/// Verify a target corpus file against its source corpus file.
///
/// Both files are re-extracted from disk. Checks, per spec of the record
/// shape: id-set equality in both directions, option-count equality for
/// every shared id, and the correct index addressing an option. Reports
/// violations; mutates nothing.
pub fn verify_files<P: AsRef<Path>>(
    source_path: P,
    target_path: P,
    source_language: &str,
    locale: &str,
) -> Result<Vec<Violation>> {
    let source = extractor::extract_file(source_path.as_ref(), source_language)?;

    // A target corpus that does not exist yet verifies like an empty one:
    // every source id is missing, nothing is unexpected.
    let target = if target_path.as_ref().is_file() {
        extractor::extract_file(target_path.as_ref(), locale)?
    } else {
        crate::corpus::Corpus::new(target_path.as_ref().to_path_buf(), locale.to_string())
    };

    let mut violations = Vec::new();

    // Unparseable target blocks first: they have no id to pair on
    for topic in &target.topics {
        for (idx, extracted) in topic.records.iter().enumerate() {
            if extracted.record.is_none() {
                violations.push(Violation {
                    id: format!("{}[{}]", topic.name, idx),
                    kind: ViolationKind::UnparseableTarget,
                });
            }
        }
    }

    let source_index = source.record_index();
    let target_index = target.record_index();
    let source_ids: HashSet<&str> = source_index.keys().copied().collect();
    let target_ids: HashSet<&str> = target_index.keys().copied().collect();

    for id in source.record_ids() {
        if !target_ids.contains(id) {
            violations.push(Violation {
                id: id.to_string(),
                kind: ViolationKind::MissingInTarget,
            });
        }
    }

    for id in target.record_ids() {
        if !source_ids.contains(id) {
            violations.push(Violation {
                id: id.to_string(),
                kind: ViolationKind::UnexpectedInTarget,
            });
        }
    }

    // Field-shape checks for every shared id
    for (id, source_record) in &source_index {
        let Some(target_record) = target_index.get(id) else {
            continue;
        };

        if target_record.options.len() != source_record.options.len() {
            violations.push(Violation {
                id: id.to_string(),
                kind: ViolationKind::OptionCountMismatch,
            });
        }

        if target_record.correct_index >= target_record.options.len() {
            violations.push(Violation {
                id: id.to_string(),
                kind: ViolationKind::CorrectIndexOutOfRange,
            });
        }
    }

    debug!(
        "Verified '{}' against source: {} violation(s)",
        locale,
        violations.len()
    );

    Ok(violations)
}
