//! Supported chat models
//!
//! The CLI only offers models listed here.

/// Model definition with metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDef {
    /// Model id as sent to the provider (e.g., "gpt-3.5-turbo")
    pub id: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Context window size in tokens
    pub context_window: usize,
}

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4",
            description: "GPT-4 (most capable, slower)",
            context_window: 8_192,
        },
        ModelDef {
            id: "gpt-3.5-turbo",
            description: "GPT-3.5 Turbo (fast, default)",
            context_window: 4_096,
        },
        ModelDef {
            id: "gpt-3.5-turbo-16k",
            description: "GPT-3.5 Turbo with a 16k context window",
            context_window: 16_384,
        },
    ]
}

/// Look up a model by id
pub fn find_model(id: &str) -> Option<&'static ModelDef> {
    all_models().iter().find(|m| m.id == id)
}

/// Comma-separated list of model ids, for error messages and help text
pub fn model_ids() -> String {
    all_models()
        .iter()
        .map(|m| m.id)
        .collect::<Vec<_>>()
        .join(", ")
}
