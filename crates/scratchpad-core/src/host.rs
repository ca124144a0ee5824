//! Host readiness.
//!
//! While the host is indexing (loading workspace metadata, for example) runs
//! that were waiting on a module build are deferred until indexing clears.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;

/// Host readiness query.
pub trait HostReadiness: Send + Sync {
    /// Whether the host is currently indexing.
    fn is_indexing(&self) -> bool;

    /// Resolves once the host is no longer indexing.
    fn when_ready(&self) -> BoxFuture<'static, ()>;
}

/// Readiness gate counting in-flight indexing jobs.
///
/// Each job holds an [`IndexingGuard`]; the host is ready once the last
/// guard drops.
#[derive(Clone)]
pub struct ReadinessGate {
    active: Arc<watch::Sender<usize>>,
}

impl ReadinessGate {
    /// Create a gate with no indexing in progress.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            active: Arc::new(tx),
        }
    }

    /// Mark the start of an indexing job.
    pub fn begin_indexing(&self) -> IndexingGuard {
        self.active.send_modify(|count| *count += 1);
        tracing::debug!("Indexing started ({} active)", *self.active.borrow());
        IndexingGuard {
            active: self.active.clone(),
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

impl HostReadiness for ReadinessGate {
    fn is_indexing(&self) -> bool {
        *self.active.borrow() > 0
    }

    fn when_ready(&self) -> BoxFuture<'static, ()> {
        let mut rx = self.active.subscribe();
        Box::pin(async move {
            // Errors only when every sender is gone, which also means no one is indexing.
            let _ = rx.wait_for(|count| *count == 0).await;
        })
    }
}

/// Held for the duration of an indexing job.
pub struct IndexingGuard {
    active: Arc<watch::Sender<usize>>,
}

impl Drop for IndexingGuard {
    fn drop(&mut self) {
        self.active.send_modify(|count| *count = count.saturating_sub(1));
        if *self.active.borrow() == 0 {
            tracing::debug!("Indexing finished, host ready");
        }
    }
}
