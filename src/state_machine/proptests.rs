//! Property-based tests for the reducer
//!
//! These tests verify key invariants hold across arbitrary action sequences.

use super::state::*;
use super::*;
use crate::llm::{Choice, Completion, Message, Role};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_completion() -> impl Strategy<Value = Completion> {
    (0usize..4).prop_map(|n| Completion {
        choices: (0..n)
            .map(|index| Choice {
                index,
                message: Message::assistant(format!("reply {index}")),
            })
            .collect(),
        ..Completion::default()
    })
}

fn arb_prompt_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{1,30}",
        Just(String::new()),
        Just("   ".to_string()),
        Just(" padded ".to_string()),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        arb_prompt_text().prop_map(Action::add_prompt),
        arb_completion().prop_map(Action::add_completion),
        "[a-z ]{1,20}".prop_map(|message| Action::error(ChatError::Other(message))),
        (0usize..10, 0usize..5).prop_map(|(slot, index)| Action::select_choice(SlotId(slot), index)),
    ]
}

fn arb_actions() -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec(arb_action(), 0..30)
}

/// Same entry, ignoring which choice is selected
fn same_entry(a: &HistoryItem, b: &HistoryItem) -> bool {
    match (a, b) {
        (HistoryItem::Message(x), HistoryItem::Message(y)) => x == y,
        (HistoryItem::Completion(x), HistoryItem::Completion(y)) => x.completion == y.completion,
        _ => false,
    }
}

proptest! {
    // Invariant 1: version moves by exactly one per effective action
    #[test]
    fn prop_version_counts_effective_actions(actions in arb_actions()) {
        let mut state = ConversationState::initial(None);
        let mut effective = 0u64;

        for action in actions {
            let before = state.version;
            if let Some(next) = reduce(&state, action) {
                prop_assert_eq!(next.version, before + 1);
                effective += 1;
                state = next;
            }
        }

        prop_assert_eq!(state.version, effective);
    }

    // Invariant 2: history is append-only
    #[test]
    fn prop_history_append_only(actions in arb_actions()) {
        let mut state = ConversationState::initial(Some("sys"));

        for action in actions {
            let Some(next) = reduce(&state, action) else { continue };
            prop_assert!(next.history.len() >= state.history.len());
            prop_assert!(next.history.len() <= state.history.len() + 1);
            for (old, new) in state.history.iter().zip(next.history.iter()) {
                prop_assert!(same_entry(old, new), "slot rewritten: {:?} -> {:?}", old, new);
            }
            state = next;
        }
    }

    // Invariant 3: awaiting follows the last prompt/result
    #[test]
    fn prop_awaiting_tracks_outstanding_request(actions in arb_actions()) {
        let mut state = ConversationState::initial(None);

        for action in actions {
            let expected = match &action {
                Action::AddPrompt { content } if !content.trim().is_empty() => Some(true),
                Action::AddCompletion { .. } | Action::Error { .. } => Some(false),
                _ => None,
            };
            let before = state.awaiting;
            if let Some(next) = reduce(&state, action) {
                state = next;
            }
            prop_assert_eq!(state.awaiting, expected.unwrap_or(before));
        }
    }

    // Invariant 4: last_prompt is only ever replaced by a newer prompt
    #[test]
    fn prop_last_prompt_only_superseded(actions in arb_actions()) {
        let mut state = ConversationState::initial(None);

        for action in actions {
            let is_prompt = matches!(&action, Action::AddPrompt { .. });
            let Some(next) = reduce(&state, action) else { continue };

            if is_prompt {
                prop_assert!(next.last_prompt > state.last_prompt);
            } else {
                prop_assert_eq!(next.last_prompt, state.last_prompt);
            }
            if let Some(message) = next.last_prompt_message() {
                prop_assert_eq!(message.role, Role::User);
            } else {
                prop_assert!(next.last_prompt.is_none());
            }
            state = next;
        }
    }

    // Invariant 5: only a prompt clears the error
    #[test]
    fn prop_error_cleared_only_by_prompt(actions in arb_actions()) {
        let mut state = ConversationState::initial(None);

        for action in actions {
            let is_prompt = matches!(&action, Action::AddPrompt { .. });
            let Some(next) = reduce(&state, action) else { continue };

            if state.error.is_some() && next.error.is_none() {
                prop_assert!(is_prompt);
            }
            state = next;
        }
    }

    // Invariant 6: a new completion always starts at the preferred choice
    #[test]
    fn prop_new_completion_selects_preferred(actions in arb_actions(), completion in arb_completion()) {
        let mut state = ConversationState::initial(None);
        for action in actions {
            if let Some(next) = reduce(&state, action) {
                state = next;
            }
        }

        let had_choices = !completion.choices.is_empty();
        let next = reduce(&state, Action::add_completion(completion)).unwrap();
        if had_choices {
            let item = next.history.last().and_then(HistoryItem::as_completion).unwrap();
            prop_assert_eq!(item.selected_index, 0);
            prop_assert!(item.selected_choice().is_some());
        } else {
            prop_assert_eq!(next.history.len(), state.history.len());
            prop_assert!(next.error.is_some());
        }
    }

    // Invariant 7: request building never fails, whatever was selected
    #[test]
    fn prop_request_messages_total(actions in arb_actions()) {
        let mut state = ConversationState::initial(Some("sys"));
        for action in actions {
            if let Some(next) = reduce(&state, action) {
                state = next;
            }
        }

        let messages = request_messages(&state.history);
        let resolvable = state
            .history
            .iter()
            .filter(|item| item.resolved_message().is_some())
            .count();
        prop_assert_eq!(messages.len(), resolvable);
    }
}
