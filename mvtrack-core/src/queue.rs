//! Serial rename queue
//!
//! Move events arrive whenever the watcher sees them, possibly while git is
//! still busy with an earlier one. The queue hands them to a single consumer
//! task so reconciliations never overlap and run in arrival order. A failed
//! reconciliation is reported and the queue moves on.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::reconcile::{ReconcileOutcome, Reconciler, RenameEvent};
use crate::Error;

/// Surfaces failed reconciliations to the user
pub trait Notifier: Send + Sync {
    /// Called once for every event whose index commands failed
    fn rename_failed(&self, event: &RenameEvent, error: &Error);
}

impl<F> Notifier for F
where
    F: Fn(&RenameEvent, &Error) + Send + Sync,
{
    fn rename_failed(&self, event: &RenameEvent, error: &Error) {
        self(event, error)
    }
}

/// Receives move events from an event source
pub trait RenameSink: Send + Sync {
    /// Accept one move
    fn on_rename(&self, event: RenameEvent);
}

/// Counters collected by the consumer task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Events whose move was staged
    pub staged: usize,
    /// Events a guard short-circuited
    pub skipped: usize,
    /// Events whose index commands failed
    pub failed: usize,
}

impl QueueStats {
    /// Total events taken off the queue
    pub fn processed(&self) -> usize {
        self.staged + self.skipped + self.failed
    }
}

/// Cheap, clonable way to enqueue events
#[derive(Debug, Clone)]
pub struct QueueHandle {
    tx: mpsc::UnboundedSender<RenameEvent>,
}

impl QueueHandle {
    /// Append an event; same-path moves are dropped here
    pub fn enqueue(&self, event: RenameEvent) {
        if event.is_noop() {
            trace!(path = %event.old_path, "Ignoring rename onto itself");
            return;
        }

        debug!(%event, "Queueing rename");
        if self.tx.send(event).is_err() {
            debug!("Rename queue is shut down, dropping event");
        }
    }
}

impl RenameSink for QueueHandle {
    fn on_rename(&self, event: RenameEvent) {
        self.enqueue(event);
    }
}

/// Owns the consumer task that runs reconciliations one at a time
#[derive(Debug)]
pub struct RenameQueue {
    handle: QueueHandle,
    cancel: CancellationToken,
    task: JoinHandle<QueueStats>,
}

impl RenameQueue {
    /// Spawn the consumer task on the current tokio runtime
    pub fn start<N>(reconciler: Reconciler, notifier: N) -> Self
    where
        N: Notifier + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(consume(rx, reconciler, notifier, cancel.clone()));

        info!("Rename queue started");
        Self {
            handle: QueueHandle { tx },
            cancel,
            task,
        }
    }

    /// Get a handle for producers
    pub fn handle(&self) -> QueueHandle {
        self.handle.clone()
    }

    /// Append an event
    pub fn enqueue(&self, event: RenameEvent) {
        self.handle.enqueue(event);
    }

    /// Token that stops the consumer when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop accepting events and wait until everything queued has run
    ///
    /// Waits for every outstanding [`QueueHandle`] to be dropped as well.
    pub async fn close(self) -> QueueStats {
        drop(self.handle);
        join(self.task).await
    }

    /// Stop now; the in-flight event finishes, queued events are dropped
    pub async fn shutdown(self) -> QueueStats {
        self.cancel.cancel();
        drop(self.handle);
        join(self.task).await
    }
}

impl RenameSink for RenameQueue {
    fn on_rename(&self, event: RenameEvent) {
        self.enqueue(event);
    }
}

async fn join(task: JoinHandle<QueueStats>) -> QueueStats {
    match task.await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Rename queue task panicked");
            QueueStats::default()
        }
    }
}

async fn consume<N: Notifier>(
    mut rx: mpsc::UnboundedReceiver<RenameEvent>,
    reconciler: Reconciler,
    notifier: N,
    cancel: CancellationToken,
) -> QueueStats {
    let mut stats = QueueStats::default();

    loop {
        let event = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Rename queue shutting down (cancelled)");
                break;
            }

            event = rx.recv() => match event {
                Some(event) => event,
                None => {
                    info!("Rename queue shutting down (all producers gone)");
                    break;
                }
            },
        };

        match reconciler.reconcile_event(&event).await {
            Ok(ReconcileOutcome::Staged { .. }) => stats.staged += 1,
            Ok(ReconcileOutcome::Skipped(reason)) => {
                trace!(%event, ?reason, "Rename skipped");
                stats.skipped += 1;
            }
            Err(e) => {
                error!(%event, error = %e, "Failed to stage rename");
                notifier.rename_failed(&event, &e);
                stats.failed += 1;
            }
        }
    }

    let dropped = rx.len();
    if dropped > 0 {
        debug!(dropped, "Dropping queued renames on shutdown");
    }

    stats
}
