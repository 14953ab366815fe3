//! Deferred deletion of warning notices.
//!
//! Each scheduled cleanup gets its own waiter task, so a pending deletion never
//! holds up inbound message handling. The pending set is the single source of
//! truth: whoever removes an entry owns the delete call, which keeps every
//! cleanup to exactly one attempt.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{domain::MessageRef, gateway::ChatGateway};

/// A warning notice waiting to be deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingCleanup {
    pub warning: MessageRef,
    pub fire_at: Instant,
}

#[derive(Clone)]
pub struct CleanupScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    gateway: Arc<dyn ChatGateway>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingCleanup>>,
    cancel: CancellationToken,
}

impl CleanupScheduler {
    pub fn new(gateway: Arc<dyn ChatGateway>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                gateway,
                next_id: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Register `cleanup` and spawn its waiter. Returns the entry id.
    pub async fn schedule(&self, cleanup: PendingCleanup) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.pending.lock().await.insert(id, cleanup);

        let scheduler = self.clone();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep_until(cleanup.fire_at) => scheduler.fire(id).await,
            }
        });

        debug!(
            chat_id = cleanup.warning.chat_id.0,
            message_id = cleanup.warning.message_id.0,
            "warning cleanup scheduled"
        );
        id
    }

    async fn fire(&self, id: u64) {
        let Some(cleanup) = self.inner.pending.lock().await.remove(&id) else {
            return;
        };

        match self.inner.gateway.delete_message(cleanup.warning).await {
            Ok(()) => debug!(
                chat_id = cleanup.warning.chat_id.0,
                message_id = cleanup.warning.message_id.0,
                "warning removed"
            ),
            Err(e) => warn!(
                chat_id = cleanup.warning.chat_id.0,
                message_id = cleanup.warning.message_id.0,
                op = "delete_warning",
                "warning cleanup failed: {e}"
            ),
        }
    }

    /// Snapshot of cleanups that have not fired yet.
    pub async fn pending(&self) -> Vec<PendingCleanup> {
        let mut out: Vec<_> = self.inner.pending.lock().await.values().copied().collect();
        out.sort_by_key(|c| c.fire_at);
        out
    }

    pub async fn len(&self) -> usize {
        self.inner.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stop all waiters. Cleanups that have not fired are dropped.
    pub async fn shutdown(&self) -> usize {
        self.inner.cancel.cancel();
        let mut pending = self.inner.pending.lock().await;
        let dropped = pending.len();
        pending.clear();
        if dropped > 0 {
            info!(dropped, "cleanup scheduler stopped with pending warnings");
        }
        dropped
    }
}
