//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TextureError;

/// Shared cancellation flag, cloned into every job of a build.
///
/// Hot loops poll [`CancellationToken::check`] and unwind with
/// [`TextureError::Cancelled`] once the flag is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn check(&self) -> Result<(), TextureError> {
        if self.is_cancelled() {
            Err(TextureError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let job = token.clone();
        assert!(job.check().is_ok());

        token.cancel();
        assert!(job.is_cancelled());
        assert!(matches!(job.check(), Err(TextureError::Cancelled)));
    }
}
