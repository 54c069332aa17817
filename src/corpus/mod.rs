/*!
 * Corpus handling: the typed record model, the tolerant extractor, and the
 * serializer that renders records back into re-parseable text.
 *
 * - `model`: record and corpus types with validated construction
 * - `extractor`: field-anchored scanner over the fixed record shape
 * - `serializer`: canonical rendering and replace-by-id rewrites
 */

pub mod extractor;
pub mod model;
pub mod serializer;

pub use model::{Corpus, ExtractedRecord, QuizRecord, Span, TopicSection};
