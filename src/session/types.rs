//! Message types and the in-flight guard.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Point-in-time copy of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub history: Vec<Message>,
    pub pending: bool,
    pub last_error: Option<String>,
}

impl SessionView {
    /// History plus an empty model bubble while an answer is outstanding.
    pub fn display_messages(&self) -> Vec<Message> {
        let mut rows = self.history.clone();
        if self.pending {
            rows.push(Message::model(""));
        }
        rows
    }

    /// True when the last turn got no answer.
    pub fn has_unanswered_turn(&self) -> bool {
        !self.pending && matches!(self.history.last(), Some(m) if m.role == Role::User)
    }
}

/// Holds the session's `pending` flag; clears it on drop, including when the
/// owning future is cancelled.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, ChatError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ChatError::SessionBusy);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
