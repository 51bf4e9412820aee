//! Background tasks and the single-run gate for bulk operations.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{RedcalError, RedcalResult};

/// Handle to work running on a tokio task.
///
/// The outcome arrives on a completion channel; dropping the handle lets the
/// work finish in the background, `cancel` aborts it.
pub struct BackgroundTask<T> {
    handle: JoinHandle<()>,
    result: oneshot::Receiver<RedcalResult<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = RedcalResult<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            // The receiver may already be gone; nobody is waiting then.
            let _ = tx.send(work.await);
        });

        BackgroundTask { handle, result: rx }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the outcome. A cancelled task yields [`RedcalError::Cancelled`].
    pub async fn wait(self) -> RedcalResult<T> {
        self.result.await.map_err(|_| RedcalError::Cancelled)?
    }
}

/// Allows at most one bulk save or revert at a time.
#[derive(Debug, Default)]
pub struct SyncGate {
    running: AtomicBool,
}

impl SyncGate {
    /// Claim the gate. `None` if another run holds it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SyncGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard {
                gate: Arc::clone(self),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct SyncGuard {
    gate: Arc<SyncGate>,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.gate.running.store(false, Ordering::Release);
    }
}
