//! Triage crate - Business logic for the email triage desk
//!
//! This crate provides platform-independent triage functionality including:
//! - Domain models (Email, EmailThread, Category, Lead)
//! - Thread assembly from flat email rows
//! - Storage trait abstractions and the hosted row-storage REST client
//! - Draft reply actions (edit, validate, send) and the send-workflow webhook
//! - Inbox refresh feed and query API for the front end
//!
//! This crate has zero UI dependencies; front ends drive it through
//! [`InboxFeed`], [`ActionHandler`] and the query functions.

pub mod actions;
pub mod config;
pub mod models;
pub mod notify;
pub mod query;
pub mod storage;
pub mod sync;
pub mod workflow;

pub use actions::{ActionError, ActionHandler, DraftEditor, Review, SendReceipt};
pub use config::{ServiceConfig, StorageCredentials};
pub use models::{
    Category, Direction, DraftStatus, Email, EmailBuilder, EmailId, EmailThread, Lead, LeadId,
    LeadPatch, NewLead, Role, ThreadId,
};
pub use notify::{LogNotifier, Notice, NoticeBoard, NoticeLevel, Notifier};
pub use query::{
    KANBAN_COLUMNS, KanbanColumn, MailboxCounts, MailboxView, assemble_threads, kanban,
    lead_threads, mailbox_counts, visible_leads,
};
pub use storage::{EmailPatch, Filter, InMemoryStore, RestStore, StorageError, TriageStore};
pub use sync::{InboxFeed, RefreshStats, ThreadListener, refresh_due};
pub use workflow::{DispatchError, SendRequest, SendWorkflow, WebhookClient};
