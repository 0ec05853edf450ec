//! Conversation messages.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Counselor,
}

impl Role {
    /// Speaker label used when a message is rendered into a prompt.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Counselor => "Counselor",
        }
    }
}

/// A single immutable conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<Timestamp>,
}

impl Message {
    /// Creates a message without a timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates a counselor message.
    pub fn counselor(content: impl Into<String>) -> Self {
        Self::new(Role::Counselor, content)
    }

    /// Returns a copy stamped with the given time.
    pub fn at(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_set_role() {
        assert_eq!(Message::user("hi").role(), Role::User);
        assert_eq!(Message::counselor("hello").role(), Role::Counselor);
    }

    #[test]
    fn deserializes_caller_history() {
        let msg: Message = serde_json::from_value(json!({
            "role": "counselor",
            "content": "How are you feeling?",
            "timestamp": "2024-03-01T10:15:00Z"
        }))
        .unwrap();

        assert_eq!(msg.role(), Role::Counselor);
        assert_eq!(msg.content(), "How are you feeling?");
        assert!(msg.timestamp().is_some());
    }

    #[test]
    fn timestamp_is_optional() {
        let msg: Message = serde_json::from_value(json!({"role": "user", "content": "hey"})).unwrap();
        assert!(msg.timestamp().is_none());
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({"role": "user", "content": "hey"}));
    }

    #[test]
    fn labels_match_prompt_format() {
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Counselor.label(), "Counselor");
    }
}
