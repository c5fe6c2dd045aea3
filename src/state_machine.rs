//! Core conversation state machine
//!
//! Actions are folded by a pure reducer into immutable snapshots; effects
//! are derived by comparing consecutive snapshots.

pub mod action;
mod effect;
mod reducer;
pub mod state;

#[cfg(test)]
mod proptests;

pub use action::Action;
pub use effect::{effects_for, request_messages, Effect};
pub use reducer::reduce;
pub use state::{ChatError, CompletionItem, ConversationState, HistoryItem, SlotId};
