//! Single-consumer action dispatch queue.
//!
//! All persistence mutation and change-event emission happen on the one
//! task draining this queue, so the store needs no locking around local
//! state. Transport backends run concurrently, but their completions do not
//! mutate anything directly: each completion constructs a result action and
//! resubmits it through a [`DispatcherHandle`], serializing all effects.
//! The queue is FIFO; the loop never blocks on the network (transport calls
//! are spawned, not awaited) and survives any individual action's failure.

use crate::action::MediaAction;
use crate::store::MediaStore;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch queue is closed")]
    Closed,
}

/// Cloneable submission side of the dispatch queue.
///
/// Handed to application code for issuing requests and to transport
/// backends for resubmitting results.
#[derive(Clone)]
pub struct DispatcherHandle {
    tx: mpsc::UnboundedSender<MediaAction>,
}

impl DispatcherHandle {
    /// Enqueue an action for processing. Never blocks.
    pub fn dispatch(&self, action: MediaAction) -> Result<(), DispatchError> {
        self.tx.send(action).map_err(|_| DispatchError::Closed)
    }
}

/// Consumer side of the dispatch queue.
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<MediaAction>,
}

impl Dispatcher {
    /// Create a dispatch queue, returning the consumer and a submission
    /// handle.
    pub fn new() -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, DispatcherHandle { tx })
    }

    /// Drain the queue, routing each action through the store in arrival
    /// order. Returns when every `DispatcherHandle` has been dropped.
    pub async fn run(mut self, store: Arc<MediaStore>) {
        while let Some(action) = self.rx.recv().await {
            debug!(kind = ?action.kind(), "dispatching action");
            store.on_action(action).await;
        }
        debug!("dispatch queue closed, loop exiting");
    }

    /// Spawn the dispatch loop onto the runtime.
    pub fn spawn(self, store: Arc<MediaStore>) -> JoinHandle<()> {
        tokio::spawn(self.run(store))
    }
}
