//! Conversation session types.
//!
//! A session is an append-only log of role-tagged turns, kept in memory for
//! the session's lifetime and discarded when it ends. The core only prepares
//! these turns for a downstream generator; it never calls one. One writer
//! per session — concurrent appends need external synchronization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions and retrieved context supplied to the generator.
    System,
    /// The student's input.
    User,
    /// A generated reply.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        };
        write!(formatter, "{name}")
    }
}

/// A single role-tagged turn in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Author of the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

impl ConversationTurn {
    /// Creates a new turn.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered, append-only turn history for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Turns in append order.
    turns: Vec<ConversationTurn>,
}

impl ConversationSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session seeded with a system turn.
    #[must_use]
    pub fn with_system(content: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.append(Role::System, content);
        session
    }

    /// Appends a turn to the session.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn::new(role, content));
    }

    /// Returns the turns in append order.
    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Returns the most recent turn, if any.
    #[must_use]
    pub fn last_turn(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Number of turns in the session.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the session has no turns yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
