//! Thread model: a conversation assembled from email rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Email};

/// Identifier shared by all emails of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation ready for display
///
/// Threads are derived on every fetch and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailThread {
    pub thread_id: ThreadId,
    /// Anchor email the conversation starts from
    pub original_email: Email,
    /// Every other email of the thread, oldest first
    pub replies: Vec<Email>,
    pub category: Category,
    /// Some email of the thread is a draft waiting for validation
    pub has_unread_replies: bool,
}

impl EmailThread {
    /// Outgoing replies still waiting to be validated and sent
    pub fn draft_replies(&self) -> impl Iterator<Item = &Email> {
        self.replies
            .iter()
            .filter(|r| r.is_outgoing() && r.is_reply() && r.is_draft())
    }

    /// Outgoing replies that have been dispatched
    pub fn sent_replies(&self) -> impl Iterator<Item = &Email> {
        self.replies
            .iter()
            .filter(|r| r.is_outgoing() && r.is_reply() && r.is_sent())
    }

    pub fn message_count(&self) -> usize {
        self.replies.len() + 1
    }

    /// Most recent effective timestamp across the thread
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.replies
            .last()
            .map(Email::effective_timestamp)
            .unwrap_or_default()
            .max(self.original_email.effective_timestamp())
    }

    pub fn contains(&self, id: &super::EmailId) -> bool {
        self.original_email.id == *id || self.replies.iter().any(|r| r.id == *id)
    }

    pub fn find(&self, id: &super::EmailId) -> Option<&Email> {
        std::iter::once(&self.original_email)
            .chain(self.replies.iter())
            .find(|e| e.id == *id)
    }
}
