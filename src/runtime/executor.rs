//! Chat store loop
//!
//! Owns the conversation state. Every command is folded on this one task,
//! in arrival order; completion requests run on spawned tasks that post
//! their outcome back onto the same queue.

use super::projector::Projector;
use super::traits::CompletionClient;
use crate::state_machine::{effects_for, reduce, Action, ChatError, ConversationState, Effect};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Commands accepted by the store loop
#[derive(Debug)]
pub(super) enum Command {
    /// Action from a store handle
    Dispatch(Action),
    /// Outcome of the completion request issued for `generation`
    Completed { generation: u64, action: Action },
    /// Reply once no completion request is outstanding
    WhenIdle(oneshot::Sender<()>),
    /// Stop the loop after everything queued before it
    Shutdown,
}

pub(super) struct StoreLoop<C>
where
    C: CompletionClient + 'static,
{
    state: ConversationState,
    client: Arc<C>,
    candidate_count: u8,
    projector: Projector,
    command_rx: mpsc::UnboundedReceiver<Command>,
    /// Handed to request tasks so they can post their outcome
    command_tx: mpsc::UnboundedSender<Command>,
    /// Bumped whenever a new prompt supersedes the previous one
    generation: u64,
    /// Token to cancel the in-flight completion request
    request_cancel_token: Option<CancellationToken>,
    idle_waiters: Vec<oneshot::Sender<()>>,
}

impl<C> StoreLoop<C>
where
    C: CompletionClient + 'static,
{
    pub fn new(
        state: ConversationState,
        client: C,
        candidate_count: u8,
        projector: Projector,
        command_rx: mpsc::UnboundedReceiver<Command>,
        command_tx: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            state,
            client: Arc::new(client),
            candidate_count,
            projector,
            command_rx,
            command_tx,
            generation: 0,
            request_cancel_token: None,
            idle_waiters: Vec::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            model = %self.client.model_id(),
            version = self.state.version,
            history = self.state.history.len(),
            "Starting chat store"
        );

        while let Some(command) = self.command_rx.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }

        if let Some(token) = self.request_cancel_token.take() {
            token.cancel();
        }
        tracing::info!(version = self.state.version, "Chat store stopped");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Dispatch(action) => self.fold(action),
            Command::Completed { generation, action } => {
                if generation == self.generation {
                    self.fold(action);
                } else {
                    tracing::debug!(
                        generation,
                        current = self.generation,
                        action = action.kind(),
                        "Dropped stale completion result"
                    );
                }
            }
            Command::WhenIdle(reply) => {
                if self.state.awaiting {
                    self.idle_waiters.push(reply);
                } else {
                    let _ = reply.send(());
                }
            }
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn fold(&mut self, action: Action) {
        let kind = action.kind();
        let Some(next) = reduce(&self.state, action) else {
            tracing::debug!(action = kind, version = self.state.version, "Action changed nothing");
            return;
        };

        let effects = effects_for(&self.state, &next);
        self.state = next;
        self.projector.publish(&self.state);
        tracing::debug!(action = kind, version = self.state.version, "Folded action");

        if !self.state.awaiting {
            for reply in self.idle_waiters.drain(..) {
                let _ = reply.send(());
            }
        }

        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SupersedeRequest { prompt } => {
                self.generation += 1;
                if let Some(token) = self.request_cancel_token.take() {
                    token.cancel();
                    tracing::info!(
                        generation = self.generation,
                        slot = %prompt,
                        "Superseded in-flight completion request"
                    );
                }
            }

            Effect::RequestCompletion { prompt, messages } => {
                let cancel_token = CancellationToken::new();
                self.request_cancel_token = Some(cancel_token.clone());

                let client = Arc::clone(&self.client);
                let command_tx = self.command_tx.clone();
                let generation = self.generation;
                let candidate_count = self.candidate_count;

                tokio::spawn(async move {
                    tracing::info!(
                        generation,
                        slot = %prompt,
                        messages = messages.len(),
                        candidate_count,
                        "Requesting completion"
                    );

                    // Race the request against supersession
                    tokio::select! {
                        biased;

                        () = cancel_token.cancelled() => {
                            tracing::debug!(generation, "Completion request cancelled");
                        }

                        result = client.complete(&messages, candidate_count) => {
                            let action = match result {
                                Ok(completion) if completion.choices.is_empty() => {
                                    tracing::warn!(generation, "Completion returned no choices");
                                    Action::error(ChatError::NoChoices)
                                }
                                Ok(completion) => Action::add_completion(completion),
                                Err(e) => {
                                    tracing::warn!(generation, error = %e, kind = ?e.kind, "Completion request failed");
                                    Action::error(e)
                                }
                            };
                            if command_tx.send(Command::Completed { generation, action }).is_err() {
                                tracing::debug!(generation, "Store closed before completion arrived");
                            }
                        }
                    }
                });
            }
        }
    }
}
