//! Mailbox counts for the navigation sidebar

use anyhow::Result;
use serde::Serialize;

use crate::models::{Category, DraftStatus};
use crate::storage::{Filter, TriageStore};

/// Per-mailbox email counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailboxCounts {
    /// Every stored email
    pub inbox: usize,
    pub leads: usize,
    pub high_priority: usize,
    pub customer_support: usize,
    pub general: usize,
    pub marketing: usize,
    /// Matched on subcategory, not category
    pub partnership: usize,
    pub drafts: usize,
    pub sent: usize,
}

/// Count emails per mailbox with the storage service's count query
///
/// Each category is counted under its canonical label and every matching
/// spelling in `labels` (for example both `high priority` and `high-priority`).
pub fn mailbox_counts(store: &dyn TriageStore, labels: &[String]) -> Result<MailboxCounts> {
    let count_category = |category: Category| -> Result<usize> {
        let mut spellings: Vec<&str> = vec![category.key()];
        for label in labels.iter().filter(|l| category.matches_label(l)) {
            if !spellings.contains(&label.as_str()) {
                spellings.push(label);
            }
        }

        let mut total = 0;
        for spelling in spellings {
            total += store.count_emails(&[Filter::eq("category", spelling)])?;
        }
        Ok(total)
    };

    let outgoing_with_status = |status: DraftStatus| {
        store.count_emails(&[
            Filter::eq("direction", "outgoing"),
            Filter::eq("status", status.as_str()),
        ])
    };

    Ok(MailboxCounts {
        inbox: store.count_emails(&[])?,
        leads: count_category(Category::Lead)?,
        high_priority: count_category(Category::HighPriority)?,
        customer_support: count_category(Category::CustomerSupport)?,
        general: count_category(Category::General)?,
        marketing: count_category(Category::Marketing)?,
        partnership: store.count_emails(&[Filter::eq(
            "subcategory",
            Category::Partnership.key(),
        )])?,
        drafts: outgoing_with_status(DraftStatus::Draft)?,
        sent: outgoing_with_status(DraftStatus::Sent)?,
    })
}
