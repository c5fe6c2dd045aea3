//! Effects derived from state changes

use super::state::{ConversationState, HistoryItem, SlotId};
use crate::llm::Message;

/// Effects to be executed after a state change
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// A new prompt owns the conversation; results of older requests must
    /// never be folded in
    SupersedeRequest { prompt: SlotId },

    /// Ask the completion API to answer `messages`
    RequestCompletion {
        prompt: SlotId,
        messages: Vec<Message>,
    },
}

/// Derive the effects of moving from `prev` to `next`.
///
/// Only a change of prompt identity triggers a request, so sending the
/// same text twice still produces two requests.
pub fn effects_for(prev: &ConversationState, next: &ConversationState) -> Vec<Effect> {
    let Some(prompt) = next.last_prompt else {
        return vec![];
    };
    if prev.last_prompt == Some(prompt) {
        return vec![];
    }

    let mut effects = vec![Effect::SupersedeRequest { prompt }];
    let messages = request_messages(&next.history);
    if !messages.is_empty() {
        effects.push(Effect::RequestCompletion { prompt, messages });
    }
    effects
}

/// Flatten history into the message list sent with a request.
///
/// Completions contribute their selected choice; a completion whose
/// selection no longer resolves is left out.
pub fn request_messages(history: &[HistoryItem]) -> Vec<Message> {
    history
        .iter()
        .filter_map(HistoryItem::resolved_message)
        .cloned()
        .collect()
}
