//! In-memory storage implementation
//!
//! Used by tests and by the desk when no storage service is configured.
//! Failures can be switched on to exercise error paths.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::traits::{EMAILS_TABLE, LEADS_TABLE};
use super::{EmailPatch, Filter, StorageError, TriageStore};
use crate::models::{Email, EmailId, Lead, LeadId, LeadPatch, NewLead};

/// Prefix of lead ids generated by [`InMemoryStore::insert_lead`]
const GENERATED_LEAD_PREFIX: &str = "lead-";

/// Rows loaded from a seed file
#[derive(Debug, Default, Deserialize)]
struct SeedData {
    #[serde(default)]
    emails: Vec<Email>,
    #[serde(default)]
    leads: Vec<Lead>,
}

/// In-memory implementation of TriageStore
///
/// Rows are kept in insertion order behind RwLocks.
pub struct InMemoryStore {
    emails: RwLock<Vec<Email>>,
    leads: RwLock<Vec<Lead>>,
    next_lead_id: AtomicU64,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
    /// Number of writes that reached the store (successful or not)
    write_attempts: AtomicU64,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            emails: RwLock::new(Vec::new()),
            leads: RwLock::new(Vec::new()),
            next_lead_id: AtomicU64::new(1),
            fail_queries: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            write_attempts: AtomicU64::new(0),
        }
    }

    /// Create a store pre-filled with rows
    ///
    /// Generated lead ids continue after the highest existing `lead-N` id.
    pub fn with_rows(emails: Vec<Email>, leads: Vec<Lead>) -> Self {
        let store = Self::new();
        let highest = leads
            .iter()
            .filter_map(|l| l.id.as_str().strip_prefix(GENERATED_LEAD_PREFIX))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        store.next_lead_id.store(highest + 1, Ordering::SeqCst);
        if let Ok(mut e) = store.emails.write() {
            *e = emails;
        }
        if let Ok(mut l) = store.leads.write() {
            *l = leads;
        }
        store
    }

    /// Load rows from a JSON seed file of the form `{"emails": [...], "leads": [...]}`
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let seed: SeedData = config::load_json_file(path)
            .with_context(|| format!("Failed to load seed data from {}", path.display()))?;
        Ok(Self::with_rows(seed.emails, seed.leads))
    }

    /// Insert or replace an email row
    pub fn upsert_email(&self, email: Email) -> Result<()> {
        let mut emails = self.emails_mut()?;
        match emails.iter_mut().find(|e| e.id == email.id) {
            Some(existing) => *existing = email,
            None => emails.push(email),
        }
        Ok(())
    }

    /// Make every subsequent query fail
    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_attempts(&self) -> u64 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn check_query(&self, table: &'static str) -> Result<()> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StorageError::Query {
                table,
                reason: "simulated failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn check_write(&self, table: &'static str, id: &str) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                table,
                id: id.to_string(),
                reason: "simulated failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn emails(&self) -> Result<RwLockReadGuard<'_, Vec<Email>>> {
        self.emails.read().map_err(|_| anyhow!("email table lock poisoned"))
    }

    fn emails_mut(&self) -> Result<RwLockWriteGuard<'_, Vec<Email>>> {
        self.emails.write().map_err(|_| anyhow!("email table lock poisoned"))
    }

    fn leads(&self) -> Result<RwLockReadGuard<'_, Vec<Lead>>> {
        self.leads.read().map_err(|_| anyhow!("lead table lock poisoned"))
    }

    fn leads_mut(&self) -> Result<RwLockWriteGuard<'_, Vec<Lead>>> {
        self.leads.write().map_err(|_| anyhow!("lead table lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TriageStore for InMemoryStore {
    fn list_emails_by_categories(&self, categories: &[String]) -> Result<Vec<Email>> {
        self.check_query(EMAILS_TABLE)?;
        let mut rows: Vec<Email> = self
            .emails()?
            .iter()
            .filter(|e| {
                e.category
                    .as_ref()
                    .is_some_and(|c| categories.iter().any(|wanted| wanted == c))
            })
            .cloned()
            .collect();

        // Stable, so rows without timestamps keep insertion order
        rows.sort_by_key(|e| e.received_at);
        Ok(rows)
    }

    fn find_emails(&self, filters: &[Filter]) -> Result<Vec<Email>> {
        self.check_query(EMAILS_TABLE)?;
        let rows = self
            .emails()?
            .iter()
            .filter(|e| filters.iter().all(|f| f.matches(e)))
            .cloned()
            .collect();
        Ok(rows)
    }

    fn count_emails(&self, filters: &[Filter]) -> Result<usize> {
        Ok(self.find_emails(filters)?.len())
    }

    fn update_email(&self, id: &EmailId, patch: &EmailPatch) -> Result<Email> {
        self.check_write(EMAILS_TABLE, id.as_str())?;
        let mut emails = self.emails_mut()?;
        let email = emails
            .iter_mut()
            .find(|e| e.id == *id)
            .ok_or_else(|| StorageError::NotFound {
                table: EMAILS_TABLE,
                id: id.to_string(),
            })?;
        patch.apply(email);
        Ok(email.clone())
    }

    fn list_leads(&self) -> Result<Vec<Lead>> {
        self.check_query(LEADS_TABLE)?;
        Ok(self.leads()?.clone())
    }

    fn insert_lead(&self, lead: &NewLead) -> Result<Lead> {
        let id = self.next_lead_id.fetch_add(1, Ordering::SeqCst);
        let id = LeadId::new(format!("{}{}", GENERATED_LEAD_PREFIX, id));
        self.check_write(LEADS_TABLE, id.as_str())?;

        let stored = Lead {
            id,
            name: lead.name.clone(),
            email: lead.email.clone(),
            industry: lead.industry.clone(),
            notes: lead.notes.clone(),
            lead_type: lead.lead_type.clone(),
            created_at: Some(chrono::Utc::now()),
        };
        self.leads_mut()?.push(stored.clone());
        Ok(stored)
    }

    fn update_lead(&self, id: &LeadId, patch: &LeadPatch) -> Result<Lead> {
        self.check_write(LEADS_TABLE, id.as_str())?;
        let mut leads = self.leads_mut()?;
        let lead = leads
            .iter_mut()
            .find(|l| l.id == *id)
            .ok_or_else(|| StorageError::NotFound {
                table: LEADS_TABLE,
                id: id.as_str().to_string(),
            })?;
        patch.apply(lead);
        Ok(lead.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DraftStatus, Role};
    use chrono::{Duration, Utc};

    fn email(id: &str, category: &str, age_mins: i64) -> Email {
        Email::builder(EmailId::new(id))
            .thread("t1")
            .incoming()
            .role(Role::Original)
            .category(category)
            .received_at(Utc::now() - Duration::minutes(age_mins))
            .build()
    }

    #[test]
    fn test_list_by_categories_is_ordered_ascending() {
        let store = InMemoryStore::with_rows(
            vec![
                email("new", "lead", 1),
                email("skip", "newsletter", 5),
                email("old", "high-priority", 10),
            ],
            Vec::new(),
        );

        let rows = store
            .list_emails_by_categories(&["lead".to_string(), "high-priority".to_string()])
            .unwrap();
        let ids: Vec<&str> = rows.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "new"]);
    }

    #[test]
    fn test_count_with_filters() {
        let store = InMemoryStore::new();
        store.upsert_email(email("a", "lead", 1)).unwrap();
        store.upsert_email(email("b", "lead", 2)).unwrap();
        store.upsert_email(email("c", "general", 3)).unwrap();

        assert_eq!(store.count_emails(&[Filter::eq("category", "lead")]).unwrap(), 2);
        assert_eq!(store.count_emails(&[]).unwrap(), 3);
    }

    #[test]
    fn test_update_missing_email() {
        let store = InMemoryStore::new();
        let err = store
            .update_email(&EmailId::new("nope"), &EmailPatch::body("x"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_simulated_failures() {
        let store = InMemoryStore::new();
        let mut draft = email("d", "lead", 1);
        draft.status = Some(DraftStatus::Draft);
        store.upsert_email(draft).unwrap();

        store.set_fail_writes(true);
        assert!(store.update_email(&EmailId::new("d"), &EmailPatch::body("x")).is_err());
        assert_eq!(store.write_attempts(), 1);

        store.set_fail_queries(true);
        assert!(store.list_emails_by_categories(&["lead".to_string()]).is_err());
        assert!(store.list_leads().is_err());
    }

    #[test]
    fn test_insert_and_update_lead() {
        let store = InMemoryStore::new();
        let lead = store
            .insert_lead(&NewLead {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            })
            .unwrap();

        let updated = store
            .update_lead(
                &lead.id,
                &LeadPatch {
                    industry: Some("Fintech".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.industry.as_deref(), Some("Fintech"));
        assert_eq!(store.get_lead(&lead.id).unwrap(), Some(updated));
    }

    #[test]
    fn test_generated_lead_ids_skip_seeded_ones() {
        let seeded = |id: &str| Lead {
            id: LeadId::new(id),
            name: Some(id.to_string()),
            email: None,
            industry: None,
            notes: None,
            lead_type: None,
            created_at: None,
        };
        let store = InMemoryStore::with_rows(
            Vec::new(),
            vec![seeded("lead-1"), seeded("lead-5"), seeded("imported-9")],
        );

        let lead = store.insert_lead(&NewLead::default()).unwrap();
        assert_eq!(lead.id.as_str(), "lead-6");

        let ids: Vec<String> = store
            .list_leads()
            .unwrap()
            .iter()
            .map(|l| l.id.as_str().to_string())
            .collect();
        assert_eq!(ids.iter().filter(|id| *id == "lead-6").count(), 1);
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_seed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(
            &path,
            r#"{"emails": [{"id": "e1", "thread_id": "t1", "category": "lead"}],
                "leads": [{"id": "l1", "name": "Ada", "type": "Contacted"}]}"#,
        )
        .unwrap();

        let store = InMemoryStore::from_seed_file(&path).unwrap();
        assert_eq!(store.get_email(&EmailId::new("e1")).unwrap().unwrap().id.as_str(), "e1");
        assert_eq!(store.list_leads().unwrap()[0].status(), "Contacted");
    }
}
