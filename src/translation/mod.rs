/*!
 * Translation driver for quiz record localization.
 *
 * - `core`: the TranslationService with retry, backoff, pacing and the
 *   source-text fallback policy
 */

// Re-export main types for easier usage
pub use self::core::{TranslatedRecord, TranslatedUnit, TranslationService};

// Submodules
pub mod core;
