//! Cooperative cancellation for long-running exports.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{SceneCastError, SceneCastResult};

/// A cloneable cancellation flag shared between the caller and a pipeline.
///
/// Pipelines poll it at every loop iteration and at stage boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Return `Err(Cancelled)` if cancellation was requested.
    pub fn check(&self) -> SceneCastResult<()> {
        if self.is_cancelled() {
            Err(SceneCastError::Cancelled)
        } else {
            Ok(())
        }
    }
}
