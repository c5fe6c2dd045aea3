//! Property-based tests for the `OpenAI` translation layer
//!
//! These tests verify that translating between our internal types and the
//! wire format preserves key invariants:
//! - Message count, roles and text content survive request translation
//! - The requested candidate count is always forwarded
//! - Normalized choices are ordered by index and none are lost
//! - Empty choice lists are rejected

use super::openai::{OpenAIChoice, OpenAIMessage, OpenAIResponse, OpenAIService};
use super::types::{CompletionRequest, Message, MessageContent, Role};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::System),
        Just(Role::User),
        Just(Role::Assistant),
        Just(Role::Function),
        Just(Role::Tool),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_role(), "[a-zA-Z0-9 _.!?,]{0,80}")
        .prop_map(|(role, text)| Message::new(role, MessageContent::Text(text)))
}

/// Choice indices 0..n in a shuffled order
fn arb_shuffled_indices() -> impl Strategy<Value = Vec<usize>> {
    (1usize..6).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

fn openai_choice(index: usize) -> OpenAIChoice {
    OpenAIChoice {
        index,
        message: OpenAIMessage {
            role: Role::Assistant,
            content: Some(serde_json::Value::String(format!("reply {index}"))),
        },
        finish_reason: Some("stop".to_string()),
    }
}

proptest! {
    #[test]
    fn prop_request_preserves_messages(
        messages in proptest::collection::vec(arb_message(), 0..10),
        candidate_count in 1u8..=3,
    ) {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: messages.clone(),
            candidate_count,
            max_tokens: None,
        };

        let translated = OpenAIService::translate_request(&request);
        prop_assert_eq!(translated.n, candidate_count);
        prop_assert_eq!(translated.messages.len(), messages.len());

        for (wire, original) in translated.messages.iter().zip(&messages) {
            prop_assert_eq!(wire.role, original.role);
            let text = original.content.as_text().map(|t| serde_json::Value::String(t.to_string()));
            prop_assert_eq!(&wire.content, &text);
        }
    }

    #[test]
    fn prop_normalize_orders_choices(indices in arb_shuffled_indices()) {
        let resp = OpenAIResponse {
            id: None,
            model: None,
            choices: indices.iter().copied().map(openai_choice).collect(),
            usage: None,
        };

        let completion = OpenAIService::normalize_response(resp).unwrap();
        prop_assert_eq!(completion.choices.len(), indices.len());
        for (position, choice) in completion.choices.iter().enumerate() {
            prop_assert_eq!(choice.index, position);
            let expected = format!("reply {position}");
            prop_assert_eq!(choice.message.content.as_text(), Some(expected.as_str()));
        }
    }

    #[test]
    fn prop_every_index_resolves(indices in arb_shuffled_indices()) {
        let resp = OpenAIResponse {
            id: None,
            model: None,
            choices: indices.iter().copied().map(openai_choice).collect(),
            usage: None,
        };

        let completion = OpenAIService::normalize_response(resp).unwrap();
        for index in &indices {
            prop_assert!(completion.choice(*index).is_some());
        }
        prop_assert!(completion.choice(indices.len()).is_none());
    }

    #[test]
    fn prop_structured_content_passes_through(value in "[a-z ]{0,20}") {
        let payload = serde_json::json!([{ "type": "text", "text": value }]);
        let msg = Message::new(Role::User, MessageContent::Structured(payload.clone()));
        let wire = OpenAIService::translate_message(&msg);
        prop_assert_eq!(wire.content, Some(payload));
    }
}

#[test]
fn test_empty_choices_is_error() {
    let resp = OpenAIResponse {
        id: None,
        model: None,
        choices: vec![],
        usage: None,
    };
    assert!(OpenAIService::normalize_response(resp).is_err());
}
