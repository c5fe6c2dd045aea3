//! Runtime for a chat conversation
//!
//! [`ChatStore`] is the handle collaborators use: it enqueues actions for
//! the store loop and exposes live selectors over the projected state.

mod executor;
mod projector;
pub mod traits;


pub use projector::Selector;
pub use traits::*;

use crate::state_machine::{Action, ChatError, ConversationState, HistoryItem, SlotId};
use executor::{Command, StoreLoop};
use projector::{Projection, Projector};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Candidate replies requested per prompt unless configured otherwise
pub const DEFAULT_CANDIDATE_COUNT: u8 = 3;

/// Options for a new store
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Seeded as the first history slot, as a system message
    pub instructions: Option<String>,
    pub candidate_count: u8,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            instructions: None,
            candidate_count: DEFAULT_CANDIDATE_COUNT,
        }
    }
}

/// Handle to a running chat store
pub struct ChatStore {
    command_tx: mpsc::UnboundedSender<Command>,
    projection: Projection,
    task: Option<JoinHandle<()>>,
}

impl ChatStore {
    /// Start a store loop on the current tokio runtime
    pub fn spawn<C>(client: C, options: StoreOptions) -> Self
    where
        C: CompletionClient + 'static,
    {
        let state = ConversationState::initial(options.instructions.as_deref());
        let (projector, projection) = Projector::new(&state);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let store_loop = StoreLoop::new(
            state,
            client,
            options.candidate_count.max(1),
            projector,
            command_rx,
            command_tx.clone(),
        );
        let task = tokio::spawn(store_loop.run());

        Self {
            command_tx,
            projection,
            task: Some(task),
        }
    }

    /// Enqueue an action. Never blocks; actions sent after shutdown are dropped.
    pub fn dispatch(&self, action: Action) {
        if self.command_tx.send(Command::Dispatch(action)).is_err() {
            tracing::warn!("Chat store is closed, dropping action");
        }
    }

    /// Send a user prompt; blank input is ignored
    pub fn add_prompt(&self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        self.dispatch(Action::add_prompt(content));
    }

    /// Make choice `index` of the completion at `slot` canonical
    pub fn select_choice(&self, slot: SlotId, index: usize) {
        self.dispatch(Action::select_choice(slot, index));
    }

    pub fn history(&self) -> Selector<Arc<Vec<HistoryItem>>> {
        self.projection.history()
    }

    pub fn awaiting(&self) -> Selector<bool> {
        self.projection.awaiting()
    }

    pub fn error(&self) -> Selector<Option<Arc<ChatError>>> {
        self.projection.error()
    }

    /// Resolve once everything dispatched so far has settled and no
    /// completion request is outstanding. Also resolves if the store stops.
    pub async fn wait_idle(&self) {
        let (reply, idle) = oneshot::channel();
        if self.command_tx.send(Command::WhenIdle(reply)).is_err() {
            return;
        }
        let _ = idle.await;
    }

    /// Full snapshots, in strictly increasing version order
    pub fn state(&self) -> Selector<ConversationState> {
        self.projection.state()
    }

    /// Stop the store and wait for its loop to finish.
    ///
    /// Actions dispatched before this call are still folded. An in-flight
    /// completion request is cancelled.
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Chat store task failed");
            }
        }
    }
}

impl Drop for ChatStore {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.command_tx.send(Command::Shutdown);
        }
    }
}
