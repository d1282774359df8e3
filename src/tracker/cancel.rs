//! Cooperative cancellation for polling and fetch operations
//!
//! Holders check the token at two points: before issuing a request and
//! before applying its response. A response that arrives after
//! cancellation is discarded, never applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Marker error for a checkpoint hit after cancellation
#[derive(Debug, Error, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A cooperative cancellation token
///
/// Clones share state: cancelling any clone cancels them all. Cancellation
/// is one-way and permanent for the token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether two tokens share the same underlying state
    pub fn same_token(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.cancelled, &other.cancelled)
    }

    /// Fail fast when cancelled; the `?`-friendly form of [`is_cancelled`]
    ///
    /// [`is_cancelled`]: CancelToken::is_cancelled
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
