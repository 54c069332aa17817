use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

// @module: Corpus data model

/// Byte range of a syntactic element inside a corpus file.
///
/// Spans are what make surgical replace-by-id rewrites possible: the
/// serializer splices rendered text over a record's span and leaves every
/// sibling byte untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// @struct: Single quiz record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRecord {
    // @field: Unique record id within a corpus
    pub id: String,

    // @field: Question text
    pub text: String,

    // @field: Ordered answer options
    pub options: Vec<String>,

    // @field: Index of the correct option
    pub correct_index: usize,

    // @field: Optional explanation shown after answering
    pub explanation: Option<String>,
}

impl QuizRecord {
    /// Creates a new record without validation - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(
        id: String,
        text: String,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Self {
        QuizRecord {
            id,
            text,
            options,
            correct_index,
            explanation,
        }
    }

    // @creates: Validated quiz record
    // @validates: Non-empty id/text/options, correct index in range
    pub fn new_validated(
        id: String,
        text: String,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self> {
        let id = id.trim().to_string();
        if id.is_empty() {
            return Err(anyhow!("Record id must not be empty"));
        }

        if text.trim().is_empty() {
            return Err(anyhow!("Empty question text for record '{}'", id));
        }

        if options.is_empty() {
            return Err(anyhow!("Record '{}' has no options", id));
        }

        if correct_index >= options.len() {
            return Err(anyhow!(
                "Record '{}': correct index {} out of range for {} options",
                id,
                correct_index,
                options.len()
            ));
        }

        Ok(QuizRecord {
            id,
            text,
            options,
            correct_index,
            explanation,
        })
    }
}

/// One record block found in a corpus file.
///
/// The span always covers the full `{ ... }` block including braces.
/// `record` is None when the block could not be matched to the field
/// anchors; the caller treats that as the malformed signal.
#[derive(Debug, Clone)]
pub struct ExtractedRecord {
    /// Byte span of the record block in the source text
    pub span: Span,

    /// Parsed record, or None when the block did not match the anchors
    pub record: Option<QuizRecord>,
}

impl ExtractedRecord {
    pub fn id(&self) -> Option<&str> {
        self.record.as_ref().map(|r| r.id.as_str())
    }
}

/// A named, ordered list of record blocks.
#[derive(Debug, Clone)]
pub struct TopicSection {
    /// Topic identifier from the list header
    pub name: String,

    /// Byte span of the whole `name : [ ... ]` construct
    pub span: Span,

    /// Byte span of the list body between the brackets
    pub body_span: Span,

    /// Record blocks in file order
    pub records: Vec<ExtractedRecord>,
}

/// Parsed corpus for one locale: ordered topics of ordered records.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// File the corpus was extracted from
    pub source_file: PathBuf,

    /// Locale code this corpus holds content for
    pub locale: String,

    /// Topic sections in file order
    pub topics: Vec<TopicSection>,
}

impl Corpus {
    /// Create an empty corpus
    pub fn new(source_file: PathBuf, locale: String) -> Self {
        Corpus {
            source_file,
            locale,
            topics: Vec::new(),
        }
    }

    /// Total number of record blocks, parsed or not
    pub fn record_count(&self) -> usize {
        self.topics.iter().map(|t| t.records.len()).sum()
    }

    /// Number of record blocks that failed to parse
    pub fn malformed_count(&self) -> usize {
        self.topics
            .iter()
            .flat_map(|t| t.records.iter())
            .filter(|r| r.record.is_none())
            .count()
    }

    /// Look up a topic section by name
    pub fn topic(&self, name: &str) -> Option<&TopicSection> {
        self.topics.iter().find(|t| t.name == name)
    }

    /// Look up a parsed record by id across all topics
    pub fn record(&self, id: &str) -> Option<&QuizRecord> {
        self.topics
            .iter()
            .flat_map(|t| t.records.iter())
            .filter_map(|r| r.record.as_ref())
            .find(|r| r.id == id)
    }

    /// Look up the extracted block for an id, including its span
    pub fn extracted(&self, id: &str) -> Option<&ExtractedRecord> {
        self.topics
            .iter()
            .flat_map(|t| t.records.iter())
            .find(|r| r.id() == Some(id))
    }

    /// Map from record id to parsed record, file order preserved by topics
    pub fn record_index(&self) -> HashMap<&str, &QuizRecord> {
        self.topics
            .iter()
            .flat_map(|t| t.records.iter())
            .filter_map(|r| r.record.as_ref())
            .map(|r| (r.id.as_str(), r))
            .collect()
    }

    /// All parsed record ids in file order
    pub fn record_ids(&self) -> Vec<&str> {
        self.topics
            .iter()
            .flat_map(|t| t.records.iter())
            .filter_map(|r| r.id())
            .collect()
    }

    /// First duplicate id, if any. Uniqueness is a corpus invariant.
    pub fn find_duplicate_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        for id in self.record_ids() {
            if !seen.insert(id) {
                return Some(id);
            }
        }
        None
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Corpus")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Locale: {}", self.locale)?;
        writeln!(f, "Topics: {}", self.topics.len())?;
        writeln!(f, "Records: {}", self.record_count())?;
        Ok(())
    }
}
