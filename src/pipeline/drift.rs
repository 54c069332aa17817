use std::fmt;

use crate::corpus::{ExtractedRecord, QuizRecord};

// @module: Drift classification between source and target records

/// Structural relationship between a source record and its target-locale
/// counterpart. Derived on the fly, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriftStatus {
    /// No record with a matching id exists in the target
    Missing,
    /// The target record is an untranslated placeholder
    Stub,
    /// The target record is structurally broken
    Malformed,
    /// The target record matches the source structurally
    Ok,
}

impl fmt::Display for DriftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Missing => "missing",
            Self::Stub => "stub",
            Self::Malformed => "malformed",
            Self::Ok => "ok",
        };
        write!(f, "{}", label)
    }
}

/// Classify one (source, target) record pair.
///
/// Priority order matters: a stub is reported as a stub even when its
/// option count also disagrees with the source, so it is never misfiled
/// as merely malformed. The placeholder token is matched exactly and
/// case-sensitively. Pure function, no I/O.
pub fn classify(
    source: &QuizRecord,
    target: Option<&ExtractedRecord>,
    placeholder_marker: &str,
) -> DriftStatus {
    let Some(extracted) = target else {
        return DriftStatus::Missing;
    };

    // A block that did not match the field anchors is the malformed signal
    let Some(record) = extracted.record.as_ref() else {
        return DriftStatus::Malformed;
    };

    if record.text == placeholder_marker {
        return DriftStatus::Stub;
    }

    if record.options.len() != source.options.len() {
        return DriftStatus::Malformed;
    }

    DriftStatus::Ok
}
