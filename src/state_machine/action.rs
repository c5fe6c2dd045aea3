//! Actions that can be dispatched to a conversation

use super::state::{ChatError, SlotId};
use crate::llm::Completion;

/// Actions folded by the reducer
#[derive(Debug, Clone)]
pub enum Action {
    /// User submitted a prompt
    AddPrompt { content: String },

    /// A completion arrived for the current prompt
    AddCompletion { completion: Completion },

    /// The completion request for the current prompt failed
    Error { error: ChatError },

    /// Make another choice of a completion canonical
    SelectChoice { slot: SlotId, index: usize },
}

impl Action {
    pub fn add_prompt(content: impl Into<String>) -> Self {
        Action::AddPrompt {
            content: content.into(),
        }
    }

    pub fn add_completion(completion: Completion) -> Self {
        Action::AddCompletion { completion }
    }

    /// Coerce any error cause into an `Error` action
    pub fn error(cause: impl Into<ChatError>) -> Self {
        Action::Error {
            error: cause.into(),
        }
    }

    pub fn select_choice(slot: SlotId, index: usize) -> Self {
        Action::SelectChoice { slot, index }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddPrompt { .. } => "add_prompt",
            Action::AddCompletion { .. } => "add_completion",
            Action::Error { .. } => "error",
            Action::SelectChoice { .. } => "select_choice",
        }
    }
}
