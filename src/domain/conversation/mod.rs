//! Conversation context: immutable messages and the bounded window of recent
//! history supplied to the prompt compiler.

mod message;
mod window;

pub use message::{Message, Role};
pub use window::{ConversationWindow, DEFAULT_WINDOW_SIZE};
