//! Email row model as stored in the `emails` table

use super::{Category, ThreadId, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an email row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(pub String);

impl EmailId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EmailId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EmailId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the email was received or written by us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
    #[serde(other)]
    Unknown,
}

/// Position of the email within its conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Original,
    Reply,
    #[serde(other)]
    Unknown,
}

/// Dispatch status of an outgoing email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Sent,
    #[serde(other)]
    Unknown,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Sent => "sent",
            DraftStatus::Unknown => "unknown",
        }
    }
}

/// A single row of the `emails` table
///
/// Every column is nullable in storage, so everything except the id is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    #[serde(default)]
    pub subject: Option<String>,
    /// Plain text or HTML
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub direction: Option<Direction>,
    #[serde(default, rename = "type")]
    pub role: Option<Role>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub status: Option<DraftStatus>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub validated_at: Option<DateTime<Utc>>,
    /// Upstream mailbox message id, when the row was imported from a mailbox
    #[serde(default)]
    pub email_id: Option<String>,
}

impl Email {
    /// Create a new email builder
    pub fn builder(id: EmailId) -> EmailBuilder {
        EmailBuilder::new(id)
    }

    /// Timestamp used for ordering: received, then created, then the epoch
    pub fn effective_timestamp(&self) -> DateTime<Utc> {
        self.received_at
            .or(self.created_at)
            // Default for DateTime<Utc> is the Unix epoch
            .unwrap_or_default()
    }

    /// Thread id, ignoring blank values
    pub fn thread(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref().filter(|t| !t.as_str().trim().is_empty())
    }

    pub fn is_incoming(&self) -> bool {
        self.direction == Some(Direction::Incoming)
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == Some(Direction::Outgoing)
    }

    pub fn is_original(&self) -> bool {
        self.role == Some(Role::Original)
    }

    pub fn is_reply(&self) -> bool {
        self.role == Some(Role::Reply)
    }

    pub fn is_draft(&self) -> bool {
        self.status == Some(DraftStatus::Draft)
    }

    pub fn is_sent(&self) -> bool {
        self.status == Some(DraftStatus::Sent)
    }

    pub fn category(&self) -> Category {
        Category::from_label(self.category.as_deref())
    }

    pub fn body_text(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }

    /// Sender name for display, falling back to the address
    pub fn sender_display(&self) -> &str {
        self.sender_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.sender_email.as_deref())
            .unwrap_or("unknown sender")
    }
}

/// Builder for creating Email instances
pub struct EmailBuilder {
    email: Email,
}

impl EmailBuilder {
    fn new(id: EmailId) -> Self {
        Self {
            email: Email {
                id,
                subject: None,
                body: None,
                sender_name: None,
                sender_email: None,
                thread_id: None,
                received_at: None,
                created_at: None,
                direction: None,
                role: None,
                category: None,
                subcategory: None,
                status: None,
                sent_at: None,
                validated_at: None,
                email_id: None,
            },
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.email.subject = Some(subject.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.email.body = Some(body.into());
        self
    }

    pub fn sender(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.email.sender_name = Some(name.into());
        self.email.sender_email = Some(email.into());
        self
    }

    pub fn thread(mut self, thread_id: impl Into<ThreadId>) -> Self {
        self.email.thread_id = Some(thread_id.into());
        self
    }

    pub fn received_at(mut self, received_at: DateTime<Utc>) -> Self {
        self.email.received_at = Some(received_at);
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.email.created_at = Some(created_at);
        self
    }

    pub fn incoming(mut self) -> Self {
        self.email.direction = Some(Direction::Incoming);
        self
    }

    pub fn outgoing(mut self) -> Self {
        self.email.direction = Some(Direction::Outgoing);
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.email.role = Some(role);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.email.category = Some(category.into());
        self
    }

    pub fn subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.email.subcategory = Some(subcategory.into());
        self
    }

    pub fn status(mut self, status: DraftStatus) -> Self {
        self.email.status = Some(status);
        self
    }

    pub fn build(self) -> Email {
        self.email
    }
}
