//! Storage trait definitions

use anyhow::Result;

use super::{EmailPatch, Filter};
use crate::models::{Email, EmailId, Lead, LeadId, LeadPatch, NewLead};

/// Table holding email rows
pub const EMAILS_TABLE: &str = "emails";
/// Table holding CRM leads
pub const LEADS_TABLE: &str = "crm_leads";

/// Failures reported by a storage backend
///
/// Backends wrap these in `anyhow::Error`; callers that need to tell a failed
/// query from a failed write can downcast.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("query on {table} failed: {reason}")]
    Query { table: &'static str, reason: String },
    #[error("write to {table} row {id} failed: {reason}")]
    Write {
        table: &'static str,
        id: String,
        reason: String,
    },
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },
    #[error("unexpected response from storage: {0}")]
    InvalidResponse(String),
}

/// Trait for the row storage service
///
/// Covers the two tables the desk works with. Implementations must be
/// shareable across threads; the desk hands one handle to every component
/// that needs it instead of reaching for a global client.
pub trait TriageStore: Send + Sync {
    /// Fetch all emails whose category is one of `categories`,
    /// ordered by received_at ascending
    fn list_emails_by_categories(&self, categories: &[String]) -> Result<Vec<Email>>;

    /// Fetch emails matching every filter
    fn find_emails(&self, filters: &[Filter]) -> Result<Vec<Email>>;

    /// Count emails matching every filter
    fn count_emails(&self, filters: &[Filter]) -> Result<usize>;

    /// Update an email by id, returning the stored row
    fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email>;

    /// Fetch every lead
    fn list_leads(&self) -> Result<Vec<Lead>>;

    /// Insert a lead, returning the stored row
    fn insert_lead(&self, lead: &NewLead) -> Result<Lead>;

    /// Update a lead by id, returning the stored row
    fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead>;

    /// Get a single email by id
    fn get_email(&self, id: &EmailId) -> Result<Option<Email>> {
        let mut rows = self.find_emails(&[Filter::eq("id", id.as_str())])?;
        Ok(rows.pop())
    }

    /// Every email of a thread, in storage order
    fn list_thread_emails(&self, thread_id: &crate::models::ThreadId) -> Result<Vec<Email>> {
        self.find_emails(&[Filter::eq("thread_id", thread_id.as_str())])
    }

    /// Get a single lead by id
    fn get_lead(&self, id: &LeadId) -> Result<Option<Lead>> {
        Ok(self.list_leads()?.into_iter().find(|l| l.id == *id))
    }
}
