/*!
 * The synchronization pipeline.
 *
 * - `drift`: pure classification of (source, target) record pairs
 * - `orchestrator`: the sequential per-record sync run with checkpointing
 * - `verifier`: independent post-hoc structural validation from disk
 */

pub mod drift;
pub mod orchestrator;
pub mod verifier;

pub use drift::{DriftStatus, classify};
pub use orchestrator::{RecordState, RunSummary, SyncOrchestrator};
pub use verifier::{Violation, ViolationKind, verify_files};
