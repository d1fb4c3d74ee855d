//! Chat with an uploaded PDF.
//!
//! The document itself is understood by a remote service reached through
//! two operations, `upload` and `query`. This crate owns everything on the
//! client side of that boundary:
//! - binding an uploaded file to the server's document id and keeping that
//!   binding across restarts
//! - an ordered conversation that allows one question in flight at a time
//! - classified, recoverable errors for every failure path

pub mod api;
pub mod binding;
pub mod chat;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use api::{ApiConfig, DocumentBackend, HttpBackend, PdfFile};
pub use binding::{DocumentBinding, DocumentHandle};
pub use chat::DocumentChat;
pub use error::ChatError;
pub use session::{ConversationSession, Message, Role, SessionView};
pub use store::{MemoryStore, SessionStore, SqliteStore};
