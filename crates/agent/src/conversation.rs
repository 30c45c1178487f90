//! Prior conversation turns passed into a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

/// One recorded message; never modified after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            result: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, result: Option<serde_json::Value>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            result,
            timestamp: Utc::now(),
        }
    }
}

/// Render the last `max_turns` turns as `Role: text` lines.
pub fn render_history(turns: &[ConversationTurn], max_turns: usize) -> String {
    let skip = turns.len().saturating_sub(max_turns);
    turns[skip..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
