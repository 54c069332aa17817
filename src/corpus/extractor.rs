use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::model::{Corpus, ExtractedRecord, QuizRecord, Span, TopicSection};

// @module: Record extraction from corpus files
//
// The extractor is not a grammar for the host format. It locates topic list
// headers, then walks each list body with a small cursor scanner that knows
// exactly three things: brackets, braces, and string literals (single,
// double or back quoted, with backslash escapes). Record fields are found
// by anchor name, so field order inside a block does not matter.
//
// Extraction is pure and deterministic: the same input bytes always produce
// the same corpus, which is what makes post-write re-verification meaningful.

// @const: Topic list header anchor, `name : [` or `name = [` at line start
static TOPIC_HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*([A-Za-z_][A-Za-z0-9_]*)[ \t]*[:=][ \t]*\[").unwrap()
});

/// Field anchors of the fixed record shape
const ANCHOR_ID: &str = "id";
const ANCHOR_TEXT: &str = "text";
const ANCHOR_OPTIONS: &str = "options";
const ANCHOR_CORRECT_INDEX: &str = "correctIndex";
const ANCHOR_EXPLANATION: &str = "explanation";

/// Extract a corpus from a file on disk
pub fn extract_file<P: AsRef<Path>>(path: P, locale: &str) -> Result<Corpus> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    Ok(extract(&content, path, locale))
}

/// Extract a corpus from raw text.
///
/// Never fails: content with no recognizable topics yields an empty corpus,
/// and a record block that does not match the anchors is kept as an
/// un-parsed span. The caller decides what those mean.
pub fn extract(content: &str, path: &Path, locale: &str) -> Corpus {
    let mut corpus = Corpus::new(path.to_path_buf(), locale.to_string());
    let mut cursor = 0usize;

    while let Some(m) = TOPIC_HEADER_REGEX.find_at(content, cursor) {
        let open = m.end() - 1; // the '[' itself
        let name = TOPIC_HEADER_REGEX
            .captures(&content[m.start()..m.end()])
            .and_then(|c| c.get(1))
            .map(|g| g.as_str().to_string())
            .unwrap_or_default();

        let Some(close) = matching_delimiter(content, open, b'[', b']') else {
            warn!("Unterminated topic list '{}', skipping rest of file", name);
            break;
        };

        let body_span = Span::new(open + 1, close);
        let records = scan_topic_body(content, body_span);
        debug!("Topic '{}': {} record block(s)", name, records.len());

        corpus.topics.push(TopicSection {
            name,
            span: Span::new(m.start(), close + 1),
            body_span,
            records,
        });

        cursor = close + 1;
    }

    corpus
}

/// Scan one list body for `{ ... }` record blocks
fn scan_topic_body(content: &str, body: Span) -> Vec<ExtractedRecord> {
    let bytes = content.as_bytes();
    let mut records = Vec::new();
    let mut pos = body.start;

    while pos < body.end {
        // Anything between records that is not an opening brace is skipped;
        // commas and whitespace are the normal case, garbage is tolerated.
        match next_brace(bytes, pos, body.end) {
            Some(open) => {
                let Some(close) = matching_delimiter(content, open, b'{', b'}') else {
                    warn!("Unterminated record block at byte {}", open);
                    break;
                };
                let span = Span::new(open, close + 1);
                let record = parse_record_block(&content[open..close + 1]);
                if record.is_none() {
                    warn!("Record block at byte {} did not match the field anchors", open);
                }
                records.push(ExtractedRecord { span, record });
                pos = close + 1;
            }
            None => break,
        }
    }

    records
}

/// Find the next top-level `{` outside any string literal
fn next_brace(bytes: &[u8], mut pos: usize, end: usize) -> Option<usize> {
    while pos < end {
        match bytes[pos] {
            b'{' => return Some(pos),
            b'\'' | b'"' | b'`' => {
                pos = skip_string(bytes, pos)?;
            }
            _ => pos += 1,
        }
    }
    None
}

/// Parse a single `{ ... }` block into a record.
///
/// Returns None when any mandatory anchor is missing or its value cannot be
/// read, or when the parsed fields violate the record invariants.
fn parse_record_block(block: &str) -> Option<QuizRecord> {
    let id_pos = find_field(block, ANCHOR_ID)?;
    let (id, _) = parse_string_literal(block, id_pos)?;

    let text_pos = find_field(block, ANCHOR_TEXT)?;
    let (text, _) = parse_string_literal(block, text_pos)?;

    let options_pos = find_field(block, ANCHOR_OPTIONS)?;
    let options = parse_string_list(block, options_pos)?;

    let index_pos = find_field(block, ANCHOR_CORRECT_INDEX)?;
    let correct_index = parse_integer(block, index_pos)?;

    // Explanation is optional, but when the anchor is present its value
    // must be a readable string literal.
    let explanation = match find_field(block, ANCHOR_EXPLANATION) {
        Some(pos) => Some(parse_string_literal(block, pos)?.0),
        None => None,
    };

    QuizRecord::new_validated(id, text, options, correct_index, explanation).ok()
}

/// Locate a field anchor as a standalone key and return the byte offset of
/// its value (just past the colon).
///
/// The anchor must be preceded by `{`, `,` or whitespace and followed by an
/// optional run of whitespace and a colon; occurrences inside string
/// literals do not count.
fn find_field(block: &str, name: &str) -> Option<usize> {
    let bytes = block.as_bytes();
    let name_bytes = name.as_bytes();
    let mut pos = 0usize;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' | b'"' | b'`' => {
                pos = skip_string(bytes, pos)?;
            }
            c if c == name_bytes[0] && block[pos..].starts_with(name) => {
                let before_ok = pos == 0
                    || matches!(bytes[pos - 1], b'{' | b',' | b' ' | b'\t' | b'\n' | b'\r');
                let after = pos + name_bytes.len();
                if before_ok {
                    // Skip whitespace, then require the colon
                    let mut p = after;
                    while p < bytes.len() && bytes[p].is_ascii_whitespace() {
                        p += 1;
                    }
                    if p < bytes.len() && bytes[p] == b':' {
                        return Some(p + 1);
                    }
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }
    None
}

/// Parse a quoted string literal starting at or after `pos`.
///
/// Accepts single, double and back quotes. Backslash escapes are decoded:
/// `\n`, `\t`, `\r` become control characters, an escaped quote or
/// backslash becomes itself, and any other escaped character is kept as-is.
/// Raw newlines inside the literal are preserved (multi-line fields).
///
/// Returns the decoded string and the byte offset just past the closing quote.
fn parse_string_literal(block: &str, pos: usize) -> Option<(String, usize)> {
    let start = skip_whitespace(block, pos);
    let mut chars = block[start..].char_indices();
    let (_, quote) = chars.next()?;
    if quote != '\'' && quote != '"' && quote != '`' {
        return None;
    }

    let mut out = String::new();
    let mut escaped = false;
    for (off, ch) in chars {
        if escaped {
            match ch {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                other => out.push(other),
            }
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return Some((out, start + off + ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    None
}

/// Parse a bracketed list of string literals, tolerating a trailing comma
fn parse_string_list(block: &str, pos: usize) -> Option<Vec<String>> {
    let bytes = block.as_bytes();
    let mut p = skip_whitespace(block, pos);
    if p >= bytes.len() || bytes[p] != b'[' {
        return None;
    }
    p += 1;

    let mut items = Vec::new();
    loop {
        p = skip_whitespace(block, p);
        if p >= bytes.len() {
            return None; // unterminated list
        }
        match bytes[p] {
            b']' => return Some(items),
            b',' => {
                p += 1; // separator or trailing comma
            }
            b'\'' | b'"' | b'`' => {
                let (item, next) = parse_string_literal(block, p)?;
                items.push(item);
                p = next;
            }
            _ => return None, // non-string list item
        }
    }
}

/// Parse a non-negative integer literal
fn parse_integer(block: &str, pos: usize) -> Option<usize> {
    let start = skip_whitespace(block, pos);
    let bytes = block.as_bytes();
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == start {
        return None;
    }
    block[start..end].parse().ok()
}

/// Advance past ASCII whitespace
fn skip_whitespace(block: &str, mut pos: usize) -> usize {
    let bytes = block.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Skip a string literal starting at `pos`, returning the offset just past
/// the closing quote. Escaped quotes do not terminate the literal.
fn skip_string(bytes: &[u8], pos: usize) -> Option<usize> {
    let quote = bytes[pos];
    let mut p = pos + 1;
    while p < bytes.len() {
        match bytes[p] {
            b'\\' => p += 2,
            c if c == quote => return Some(p + 1),
            _ => p += 1,
        }
    }
    None
}

/// Find the matching closing delimiter for the opener at `open`,
/// accounting for nesting and string literals.
fn matching_delimiter(content: &str, open: usize, opener: u8, closer: u8) -> Option<usize> {
    let bytes = content.as_bytes();
    debug_assert_eq!(bytes[open], opener);
    let mut depth = 0usize;
    let mut pos = open;

    while pos < bytes.len() {
        match bytes[pos] {
            b'\'' | b'"' | b'`' => {
                pos = skip_string(bytes, pos)?;
            }
            c if c == opener => {
                depth += 1;
                pos += 1;
            }
            c if c == closer => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }
    None
}
