//! External capability clients
//!
//! Each external collaborator is a trait seam with one production client:
//! - media: open a song's URL in a new context (no return value consumed)
//! - remark: single generative-text request, degraded to a fixed fallback
//! - recorder: fire-and-forget form-encoded attempt write

pub mod media;
pub mod recorder;
pub mod remark;

pub use media::{LogOpener, MediaOpener};
pub use recorder::{AttemptRecord, AttemptRecorder, RecorderError, ScriptRecorder};
pub use remark::{GeminiRemarkClient, RemarkError, RemarkGenerator};
