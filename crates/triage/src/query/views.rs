//! Mailbox views: which threads a route shows

use crate::models::{Category, EmailThread};

/// A filtered view over the assembled thread list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxView {
    Inbox,
    Leads,
    HighPriority,
    CustomerSupport,
    Sent,
    Category {
        category: String,
        subcategory: String,
    },
}

impl MailboxView {
    /// Parse a route path such as `/leads` or `/category/lead/partnership`
    ///
    /// Unknown paths fall back to the inbox.
    pub fn from_path(path: &str) -> Self {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        match parts.as_slice() {
            ["leads"] => MailboxView::Leads,
            ["high-priority"] => MailboxView::HighPriority,
            ["customer-support"] => MailboxView::CustomerSupport,
            ["sent"] => MailboxView::Sent,
            ["category", category, subcategory, ..] => MailboxView::Category {
                category: decode(category),
                subcategory: decode(subcategory),
            },
            _ => MailboxView::Inbox,
        }
    }

    /// Route path of the view
    pub fn path(&self) -> String {
        match self {
            MailboxView::Inbox => "/".to_string(),
            MailboxView::Leads => "/leads".to_string(),
            MailboxView::HighPriority => "/high-priority".to_string(),
            MailboxView::CustomerSupport => "/customer-support".to_string(),
            MailboxView::Sent => "/sent".to_string(),
            MailboxView::Category {
                category,
                subcategory,
            } => format!(
                "/category/{}/{}",
                urlencoding::encode(category),
                urlencoding::encode(subcategory)
            ),
        }
    }

    pub fn title(&self) -> String {
        match self {
            MailboxView::Inbox => "All Emails".to_string(),
            MailboxView::Leads => "Leads".to_string(),
            MailboxView::HighPriority => "High Priority".to_string(),
            MailboxView::CustomerSupport => "Customer Support".to_string(),
            MailboxView::Sent => "Sent Emails".to_string(),
            MailboxView::Category {
                category,
                subcategory,
            } => format!("{} - {}", category, subcategory),
        }
    }

    /// Whether a thread belongs in this view
    pub fn includes(&self, thread: &EmailThread) -> bool {
        match self {
            MailboxView::Inbox => true,
            MailboxView::Leads => thread.category == Category::Lead,
            MailboxView::HighPriority => thread.category == Category::HighPriority,
            MailboxView::CustomerSupport => thread.category == Category::CustomerSupport,
            MailboxView::Sent => thread
                .replies
                .iter()
                .any(|r| r.is_outgoing() && r.is_sent()),
            MailboxView::Category {
                category,
                subcategory,
            } => {
                thread.category.matches_label(category)
                    && thread
                        .original_email
                        .subcategory
                        .as_deref()
                        .is_some_and(|s| s.eq_ignore_ascii_case(subcategory))
            }
        }
    }

    /// Threads of this view, keeping the input order
    pub fn select<'a>(&self, threads: &'a [EmailThread]) -> Vec<&'a EmailThread> {
        threads.iter().filter(|t| self.includes(t)).collect()
    }
}

fn decode(part: &str) -> String {
    urlencoding::decode(part)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| part.to_string())
}
