//! Version-gated projection of store snapshots
//!
//! The store loop publishes every folded snapshot here. A snapshot is only
//! accepted if its version is strictly greater than the last accepted one;
//! accepted snapshots are then split into per-field channels that only
//! notify when their field actually changed.

use crate::state_machine::{ChatError, ConversationState, HistoryItem};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Live, read-only view of one projected value
#[derive(Debug, Clone)]
pub struct Selector<T> {
    rx: watch::Receiver<T>,
}

impl<T> Selector<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(rx: &watch::Receiver<T>) -> Self {
        let mut rx = rx.clone();
        rx.borrow_and_update();
        Self { rx }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next change and return the new value.
    ///
    /// Returns `None` once the store has shut down; `get` keeps returning
    /// the last value.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Stream of values: the current one, then every change
    #[allow(dead_code)] // API completeness
    pub fn into_stream(self) -> WatchStream<T> {
        WatchStream::new(self.rx)
    }
}

/// Publishing half, owned by the store loop
pub(super) struct Projector {
    state: watch::Sender<ConversationState>,
    history: watch::Sender<Arc<Vec<HistoryItem>>>,
    awaiting: watch::Sender<bool>,
    error: watch::Sender<Option<Arc<ChatError>>>,
}

/// Receiving half, held by store handles
#[derive(Clone)]
pub(super) struct Projection {
    state: watch::Receiver<ConversationState>,
    history: watch::Receiver<Arc<Vec<HistoryItem>>>,
    awaiting: watch::Receiver<bool>,
    error: watch::Receiver<Option<Arc<ChatError>>>,
}

impl Projector {
    pub fn new(initial: &ConversationState) -> (Self, Projection) {
        let (state, state_rx) = watch::channel(initial.clone());
        let (history, history_rx) = watch::channel(Arc::clone(&initial.history));
        let (awaiting, awaiting_rx) = watch::channel(initial.awaiting);
        let (error, error_rx) = watch::channel(initial.error.clone());

        (
            Self {
                state,
                history,
                awaiting,
                error,
            },
            Projection {
                state: state_rx,
                history: history_rx,
                awaiting: awaiting_rx,
                error: error_rx,
            },
        )
    }

    /// Publish `next` if it is newer than everything published so far.
    ///
    /// Returns whether the snapshot was accepted.
    pub fn publish(&self, next: &ConversationState) -> bool {
        let accepted = self.state.send_if_modified(|current| {
            if next.version > current.version {
                *current = next.clone();
                true
            } else {
                false
            }
        });
        if !accepted {
            tracing::debug!(version = next.version, "Dropped out-of-order snapshot");
            return false;
        }

        self.history.send_if_modified(|current| {
            if Arc::ptr_eq(current, &next.history) {
                false
            } else {
                *current = Arc::clone(&next.history);
                true
            }
        });
        self.awaiting.send_if_modified(|current| {
            if *current == next.awaiting {
                false
            } else {
                *current = next.awaiting;
                true
            }
        });
        self.error.send_if_modified(|current| {
            if same_error(current, &next.error) {
                false
            } else {
                current.clone_from(&next.error);
                true
            }
        });
        true
    }
}

impl Projection {
    pub fn state(&self) -> Selector<ConversationState> {
        Selector::new(&self.state)
    }

    pub fn history(&self) -> Selector<Arc<Vec<HistoryItem>>> {
        Selector::new(&self.history)
    }

    pub fn awaiting(&self) -> Selector<bool> {
        Selector::new(&self.awaiting)
    }

    pub fn error(&self) -> Selector<Option<Arc<ChatError>>> {
        Selector::new(&self.error)
    }
}

fn same_error(a: &Option<Arc<ChatError>>, b: &Option<Arc<ChatError>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
