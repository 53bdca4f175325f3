//! Conversation transcript model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a transcript turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Text written by the contact.
    User,
    /// Model reply as returned by the completion API.
    Assistant,
    /// Seeded prompt or stored model reply.
    System,
}

impl TurnRole {
    /// Stable string form for storage and completion requests.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            "system" => Ok(Self::System),
            _ => Err(value.to_string()),
        }
    }
}

/// A single `{role, content}` unit.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced the turn.
    pub role: TurnRole,
    /// Text payload.
    pub content: String,
}

impl Turn {
    /// Build a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Build a system turn. Model replies are stored with this role.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }
}

/// Ordered list of turns for one user identifier.
///
/// Serialized as the stored document `{"messages": [...]}`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Turns in conversation order.
    #[serde(default)]
    pub messages: Vec<Turn>,
}

impl Transcript {
    /// Empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Transcript holding only the seeded prompt.
    #[must_use]
    pub fn seeded(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Turn::system(prompt)],
        }
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.messages.push(turn);
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Borrow the turns in order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.messages
    }
}
