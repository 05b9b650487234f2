//! Conversation Session
//!
//! Holds the ordered chat history for one visitor connection and relays each
//! new utterance to the remote conversational model.

use crate::chat::{ChatClient, ChatProviderError};
use std::fmt;
use std::sync::Arc;

/// The speaker of a single history turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Visitor,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Visitor => write!(f, "visitor"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One (role, text) entry in a session's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            role: Role::Visitor,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// The ordered chat history for one visitor connection.
///
/// Turns alternate visitor/assistant, oldest first, and are never reordered
/// or pruned. A failed exchange commits nothing: the visitor turn enters the
/// history only once the model has replied.
pub struct ConversationSession {
    client: Arc<dyn ChatClient>,
    system_instruction: Arc<String>,
    history: Vec<Turn>,
}

impl ConversationSession {
    /// Creates a session with an empty history.
    pub fn new(client: Arc<dyn ChatClient>, system_instruction: Arc<String>) -> Self {
        Self {
            client,
            system_instruction,
            history: Vec::new(),
        }
    }

    /// Relays one visitor utterance to the model and returns its reply.
    ///
    /// The utterance and the reply are appended to the history only after
    /// the remote call succeeds.
    pub async fn reply(&mut self, utterance: &str) -> Result<String, ChatProviderError> {
        let reply = self
            .client
            .complete(&self.system_instruction, &self.history, utterance)
            .await?;
        self.history.push(Turn::visitor(utterance));
        self.history.push(Turn::assistant(reply.clone()));
        Ok(reply)
    }

    /// The committed turns, oldest first.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }
}
