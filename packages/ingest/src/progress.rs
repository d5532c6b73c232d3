//! Progress reporting handle injected into each pipeline stage.
//!
//! Stages report row counts through [`ProgressCallback`] instead of a
//! global renderer, so a binary can attach `indicatif` bars while tests
//! pass [`NullProgress`].

use std::sync::Arc;

/// Trait for reporting progress from a pipeline stage.
///
/// Implementations must be `Send + Sync` so a handle can be shared behind
/// an `Arc` across the async holiday fetch.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op [`ProgressCallback`].
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
