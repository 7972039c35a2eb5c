//! In-memory conversation history
//!
//! Owned by the session loop and lent to the mediator. Turns are only ever
//! appended; `clear` is the single way to drop them.

use crate::error::Result;
use crate::llm::{Message, Role};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.turns.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Message> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Count turns with the given role
    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|m| m.role == role).count()
    }

    /// Serialize as the ordered `[{role, content, [name]}]` list sent to the backend
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.turns)?)
    }

    pub fn from_wire(json: &str) -> Result<Self> {
        Ok(Self {
            turns: serde_json::from_str(json)?,
        })
    }
}
