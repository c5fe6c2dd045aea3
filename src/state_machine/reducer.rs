//! Pure reducer
//!
//! Folds one action into a conversation snapshot. No I/O, no clocks: the
//! same snapshot and action always produce the same result.

use super::state::{ChatError, CompletionItem, ConversationState, HistoryItem, SlotId};
use super::Action;
use crate::llm::Message;
use std::sync::Arc;

/// Fields an action changes. Unset fields keep their previous value.
#[derive(Debug, Default)]
struct Patch {
    history: Option<Arc<Vec<HistoryItem>>>,
    last_prompt: Option<SlotId>,
    awaiting: Option<bool>,
    error: Option<Option<Arc<ChatError>>>,
}

impl Patch {
    fn apply(self, state: &ConversationState) -> ConversationState {
        ConversationState {
            version: state.version + 1,
            history: self.history.unwrap_or_else(|| Arc::clone(&state.history)),
            last_prompt: self.last_prompt.or(state.last_prompt),
            awaiting: self.awaiting.unwrap_or(state.awaiting),
            error: self.error.unwrap_or_else(|| state.error.clone()),
        }
    }
}

/// Fold `action` into `state`.
///
/// Returns `None` when the action changes nothing; the caller keeps the
/// previous snapshot and its version.
pub fn reduce(state: &ConversationState, action: Action) -> Option<ConversationState> {
    patch_for(state, action).map(|patch| patch.apply(state))
}

fn patch_for(state: &ConversationState, action: Action) -> Option<Patch> {
    match action {
        Action::AddPrompt { content } => {
            let content = content.trim();
            if content.is_empty() {
                return None;
            }

            let slot = SlotId(state.history.len());
            Some(Patch {
                history: Some(appended(state, HistoryItem::Message(Message::user(content)))),
                last_prompt: Some(slot),
                awaiting: Some(true),
                error: Some(None),
            })
        }

        Action::AddCompletion { completion } if completion.choices.is_empty() => Some(Patch {
            awaiting: Some(false),
            error: Some(Some(Arc::new(ChatError::NoChoices))),
            ..Patch::default()
        }),

        Action::AddCompletion { completion } => {
            let item = CompletionItem::new(completion);
            Some(Patch {
                history: Some(appended(state, HistoryItem::Completion(item))),
                awaiting: Some(false),
                ..Patch::default()
            })
        }

        Action::Error { error } => Some(Patch {
            awaiting: Some(false),
            error: Some(Some(Arc::new(error))),
            ..Patch::default()
        }),

        Action::SelectChoice { slot, index } => {
            let item = state.slot(slot)?.as_completion()?;
            if item.selected_index == index {
                return None;
            }

            let mut history = state.history.as_ref().clone();
            history[slot.0] = HistoryItem::Completion(CompletionItem {
                completion: item.completion.clone(),
                selected_index: index,
            });
            Some(Patch {
                history: Some(Arc::new(history)),
                ..Patch::default()
            })
        }
    }
}

fn appended(state: &ConversationState, item: HistoryItem) -> Arc<Vec<HistoryItem>> {
    let mut history = Vec::with_capacity(state.history.len() + 1);
    history.extend(state.history.iter().cloned());
    history.push(item);
    Arc::new(history)
}
