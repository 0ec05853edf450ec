//! Bounded conversation window.
//!
//! Keeps the most recent messages of one session in insertion order. The
//! window belongs to the calling session; nothing here is shared or locked.

use std::collections::VecDeque;

use super::message::Message;

/// Default number of messages embedded into a prompt.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationWindow {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl ConversationWindow {
    /// Creates an empty window. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a window holding the last `capacity` messages of `history`.
    pub fn from_history<'a, I>(history: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let mut window = Self::new(capacity);
        for message in history {
            window.push(message.clone());
        }
        window
    }

    /// Appends a message, evicting the oldest one when full.
    pub fn push(&mut self, message: Message) {
        if self.messages.len() == self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Messages oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}
