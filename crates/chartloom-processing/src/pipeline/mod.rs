//! Dataset-level operations.
//!
//! - [`PreviewAssembler`]: dry run producing before/after snapshots.
//! - [`ApplyExecutor`]: persisting run with write-then-flip ordering.
//! - [`Engine`]: ownership checks and collaborator I/O around both.

mod apply;
mod engine;
mod preview;

pub use apply::{ApplyExecutor, processed_artifact_path};
pub use engine::{Engine, EngineBuilder};
pub use preview::{PREPROCESSING_STEPS, PreviewAssembler};
