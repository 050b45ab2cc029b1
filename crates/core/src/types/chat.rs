//! Chat transcript types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a chat message.
///
/// Only user messages exist today; nothing generates replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
}

/// A message in a tab session's transcript.
///
/// Messages are append-only: once created they are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Position in the transcript, starting at 0.
    pub position: usize,
    pub role: Role,
    /// Trimmed, non-empty text.
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a user message from raw input.
    ///
    /// Returns `None` if the input is empty after trimming.
    #[must_use]
    pub fn user(position: usize, input: &str) -> Option<Self> {
        let content = input.trim();
        if content.is_empty() {
            return None;
        }

        Some(Self {
            position,
            role: Role::User,
            content: content.to_owned(),
            sent_at: Utc::now(),
        })
    }
}

/// Presentation mode of the chat view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The other theme.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}
