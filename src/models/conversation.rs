//! Conversation candidate types produced by the generation stage.

use serde::{Deserialize, Serialize};

/// One turn of a generated conversation.
///
/// `role` is kept as a plain string here: candidates are unvalidated until
/// postprocessing, and a bad role must survive parsing so it can be
/// rejected and counted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A generated multi-turn conversation candidate.
///
/// Parsed straight from the generation service's response (extra response
/// fields are dropped); structural validity is checked in postprocessing,
/// not here. Serializes to exactly `{"messages": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<ChatTurn>,
}
