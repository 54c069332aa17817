use anyhow::{Result, anyhow};
use log::debug;

use super::extractor;
use super::model::QuizRecord;

// @module: Rendering records back into corpus text
//
// The serializer owns the canonical house shape: double-quoted strings,
// two-space indent, trailing commas. Whatever quote style the input used,
// output is normalized to this shape, and the extractor re-parses it
// unchanged (round-trip property).
//
// Rewrites are surgical. The current file content is re-extracted to get
// fresh byte spans, then the rendered record is spliced over the existing
// block (or inserted before the topic's closing bracket). Sibling records
// keep their exact bytes.

/// Indentation of a record line relative to its topic header
const RECORD_INDENT: &str = "  ";

/// Escape a string value for the canonical double-quoted form
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Render one record as a block in the canonical shape.
///
/// `indent` is the indentation of the line the `{` sits on; fields are
/// rendered one level deeper and the closing brace returns to `indent`.
/// The first line carries no leading indentation, so the caller can place
/// the block at any position.
pub fn render_record(record: &QuizRecord, indent: &str) -> String {
    let field_indent = format!("{}{}", indent, RECORD_INDENT);
    let mut out = String::new();
    out.push_str("{\n");

    out.push_str(&format!("{}id: \"{}\",\n", field_indent, escape(&record.id)));
    out.push_str(&format!("{}text: \"{}\",\n", field_indent, escape(&record.text)));

    out.push_str(&field_indent);
    out.push_str("options: [");
    let rendered_options: Vec<String> = record
        .options
        .iter()
        .map(|option| format!("\"{}\"", escape(option)))
        .collect();
    out.push_str(&rendered_options.join(", "));
    out.push_str("],\n");

    out.push_str(&format!("{}correctIndex: {},\n", field_indent, record.correct_index));

    if let Some(explanation) = &record.explanation {
        out.push_str(&format!(
            "{}explanation: \"{}\",\n",
            field_indent,
            escape(explanation)
        ));
    }

    out.push_str(indent);
    out.push('}');
    out
}

/// Render a whole topic list with the given records
pub fn render_topic(name: &str, records: &[QuizRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}: [\n", name));
    for record in records {
        out.push_str(RECORD_INDENT);
        out.push_str(&render_record(record, RECORD_INDENT));
        out.push_str(",\n");
    }
    out.push_str("]\n");
    out
}

/// Insert or replace one record in existing corpus text, by id.
///
/// - If a block with the record's id exists anywhere in the content, the
///   rendered record replaces exactly that block's bytes.
/// - Otherwise, if the topic exists, the record is inserted before the
///   topic's closing bracket.
/// - Otherwise a new topic list is appended at the end of the file.
///
/// Returns the new file content; the caller is responsible for writing it.
pub fn upsert_record(content: &str, topic_name: &str, record: &QuizRecord) -> Result<String> {
    if record.id.is_empty() {
        return Err(anyhow!("Cannot serialize a record without an id"));
    }

    let corpus = extractor::extract(content, std::path::Path::new("<memory>"), "");

    // Replace in place when the id already exists
    if let Some(existing) = corpus.extracted(&record.id) {
        let indent = line_indent(content, existing.span.start);
        let rendered = render_record(record, &indent);
        debug!("Replacing record '{}' in place", record.id);
        let mut out = String::with_capacity(content.len() + rendered.len());
        out.push_str(&content[..existing.span.start]);
        out.push_str(&rendered);
        out.push_str(&content[existing.span.end..]);
        return Ok(out);
    }

    // Insert into the existing topic
    if let Some(topic) = corpus.topic(topic_name) {
        let topic_indent = line_indent(content, topic.span.start);
        let record_indent = format!("{}{}", topic_indent, RECORD_INDENT);
        let rendered = render_record(record, &record_indent);
        let body = &content[topic.body_span.start..topic.body_span.end];

        // Splice just before the closing bracket, after the last
        // non-whitespace byte of the body (adding a separator comma when
        // the previous record lacks a trailing one).
        let trimmed = body.trim_end();
        let insert_at = topic.body_span.start + trimmed.len();
        let needs_comma = !trimmed.is_empty() && !trimmed.ends_with(',');

        let mut fragment = String::new();
        if needs_comma {
            fragment.push(',');
        }
        fragment.push('\n');
        fragment.push_str(&record_indent);
        fragment.push_str(&rendered);
        fragment.push(',');

        debug!("Inserting record '{}' into topic '{}'", record.id, topic_name);
        let mut out = String::with_capacity(content.len() + fragment.len());
        out.push_str(&content[..insert_at]);
        out.push_str(&fragment);
        // Keep the closing bracket on its own line
        let tail = &content[insert_at..topic.body_span.end];
        if tail.contains('\n') {
            out.push_str(tail);
        } else {
            out.push('\n');
            out.push_str(&topic_indent);
        }
        out.push_str(&content[topic.body_span.end..]);
        return Ok(out);
    }

    // Append a brand new topic at the end of the file
    debug!("Appending new topic '{}' for record '{}'", topic_name, record.id);
    let mut out = String::with_capacity(content.len() + 256);
    out.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    if !content.trim().is_empty() {
        out.push('\n');
    }
    out.push_str(&render_topic(topic_name, std::slice::from_ref(record)));
    Ok(out)
}

/// Leading whitespace of the line containing `pos`
fn line_indent(content: &str, pos: usize) -> String {
    let line_start = content[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    content[line_start..pos]
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect()
}
