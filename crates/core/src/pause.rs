//! Injectable sleep used by the polling loops.
//!
//! Production code uses [`TokioPause`]; tests substitute an
//! implementation that records the requested durations and returns
//! immediately.

use std::time::Duration;

use async_trait::async_trait;

#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[async_trait]
impl<P: Pause + ?Sized> Pause for std::sync::Arc<P> {
    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await;
    }
}
