//! Conversation state types

use crate::llm::{Choice, Completion, LlmError, LlmErrorKind, Message};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// History
// ============================================================================

/// Stable id of a history slot.
///
/// History is append-only, so a slot's position never changes and doubles
/// as its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A completion in the history, plus which of its choices is canonical
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub completion: Completion,
    /// Matches a `Choice::index`; may point at no choice after an
    /// out-of-range selection
    pub selected_index: usize,
}

impl CompletionItem {
    pub fn new(completion: Completion) -> Self {
        Self {
            completion,
            selected_index: 0,
        }
    }

    /// The currently selected choice, if the selection resolves
    pub fn selected_choice(&self) -> Option<&Choice> {
        self.completion.choice(self.selected_index)
    }

    /// The message of the selected choice, if the selection resolves
    pub fn selected_message(&self) -> Option<&Message> {
        self.selected_choice().map(|choice| &choice.message)
    }
}

/// History entry
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryItem {
    Message(Message),
    Completion(CompletionItem),
}

impl HistoryItem {
    /// Resolve this entry to the message it contributes to a request.
    ///
    /// A completion whose selection no longer resolves contributes nothing.
    pub fn resolved_message(&self) -> Option<&Message> {
        match self {
            HistoryItem::Message(message) => Some(message),
            HistoryItem::Completion(item) => item.selected_message(),
        }
    }

    pub fn as_completion(&self) -> Option<&CompletionItem> {
        match self {
            HistoryItem::Completion(item) => Some(item),
            HistoryItem::Message(_) => None,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error value held in the conversation state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    #[error("{message}")]
    Completion { kind: LlmErrorKind, message: String },

    #[error("The completion API returned no choices")]
    NoChoices,

    #[error("{0}")]
    Other(String),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::Completion {
            kind: err.kind,
            message: err.message,
        }
    }
}

impl From<String> for ChatError {
    fn from(message: String) -> Self {
        ChatError::Other(message)
    }
}

impl From<&str> for ChatError {
    fn from(message: &str) -> Self {
        ChatError::Other(message.to_string())
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Immutable snapshot of a conversation
///
/// `history` and `error` are shared; a changed `Arc` pointer means the field
/// changed.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Bumped by exactly one on every transition that changes something
    pub version: u64,
    pub history: Arc<Vec<HistoryItem>>,
    /// Slot of the most recently appended user prompt
    pub last_prompt: Option<SlotId>,
    /// A completion request is outstanding for `last_prompt`
    pub awaiting: bool,
    pub error: Option<Arc<ChatError>>,
}

impl ConversationState {
    /// Initial state, optionally seeded with a system message
    pub fn initial(instructions: Option<&str>) -> Self {
        let history = instructions
            .map(|text| vec![HistoryItem::Message(Message::system(text))])
            .unwrap_or_default();

        Self {
            version: 0,
            history: Arc::new(history),
            last_prompt: None,
            awaiting: false,
            error: None,
        }
    }

    /// Look up a history slot
    pub fn slot(&self, slot: SlotId) -> Option<&HistoryItem> {
        self.history.get(slot.0)
    }

    /// The user message that started the current turn
    #[allow(dead_code)] // Useful for tests
    pub fn last_prompt_message(&self) -> Option<&Message> {
        match self.last_prompt.and_then(|slot| self.slot(slot)) {
            Some(HistoryItem::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// Slot of the most recent completion, if any
    pub fn latest_completion_slot(&self) -> Option<SlotId> {
        self.history
            .iter()
            .rposition(|item| matches!(item, HistoryItem::Completion(_)))
            .map(SlotId)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::initial(None)
    }
}
