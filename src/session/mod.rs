//! Conversation state for one bound document.
//!
//! A `ConversationSession` owns the ordered message history and enforces
//! strict turn-taking against the query endpoint.

mod conversation;
mod types;

pub use conversation::ConversationSession;
pub use types::{Message, Role, SessionView};
