//! Row filters and partial updates understood by every backend

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{DraftStatus, Email};

/// Equality filter on a column, e.g. `category = lead`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Evaluate the filter against a serialized row
    ///
    /// Null columns never match, like SQL equality.
    pub fn matches_row(&self, row: &serde_json::Value) -> bool {
        match row.get(&self.column) {
            Some(serde_json::Value::String(s)) => *s == self.value,
            Some(serde_json::Value::Null) | None => false,
            Some(other) => other.to_string() == self.value,
        }
    }

    /// Evaluate the filter against an email
    pub fn matches(&self, email: &Email) -> bool {
        serde_json::to_value(email).is_ok_and(|row| self.matches_row(&row))
    }
}

/// Partial update of an email row; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DraftStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_at: Option<DateTime<Utc>>,
}

impl EmailPatch {
    /// Rewrite a draft's body
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Mark an email as sent at `at`
    pub fn sent(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(DraftStatus::Sent),
            sent_at: Some(at),
            validated_at: Some(at),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to an in-memory row
    pub fn apply(&self, email: &mut Email) {
        if let Some(body) = &self.body {
            email.body = Some(body.clone());
        }
        if let Some(status) = self.status {
            email.status = Some(status);
        }
        if let Some(sent_at) = self.sent_at {
            email.sent_at = Some(sent_at);
        }
        if let Some(validated_at) = self.validated_at {
            email.validated_at = Some(validated_at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailId;

    #[test]
    fn test_filter_matches_columns() {
        let email = Email::builder(EmailId::new("e1"))
            .thread("t1")
            .category("lead")
            .status(DraftStatus::Draft)
            .outgoing()
            .build();

        assert!(Filter::eq("thread_id", "t1").matches(&email));
        assert!(Filter::eq("category", "lead").matches(&email));
        assert!(Filter::eq("status", "draft").matches(&email));
        assert!(Filter::eq("direction", "outgoing").matches(&email));
        assert!(!Filter::eq("category", "Lead").matches(&email));
        assert!(!Filter::eq("subcategory", "lead").matches(&email));
    }

    #[test]
    fn test_sent_patch() {
        let now = Utc::now();
        let mut email = Email::builder(EmailId::new("e1"))
            .body("hi")
            .status(DraftStatus::Draft)
            .build();

        EmailPatch::sent(now).apply(&mut email);
        assert!(email.is_sent());
        assert_eq!(email.sent_at, Some(now));
        assert_eq!(email.validated_at, Some(now));
        assert_eq!(email.body.as_deref(), Some("hi"));
    }

    #[test]
    fn test_patch_serialization_skips_unset() {
        let json = serde_json::to_value(EmailPatch::body("new")).unwrap();
        assert_eq!(json, serde_json::json!({ "body": "new" }));
        assert!(EmailPatch::default().is_empty());
    }
}
