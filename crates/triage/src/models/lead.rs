//! CRM lead model as stored in the `crm_leads` table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a lead
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A CRM lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Pipeline status label; `system` marks internal rows
    #[serde(default, rename = "type")]
    pub lead_type: Option<String>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_opt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Status shown in the CRM views, defaulting to `New`
    pub fn status(&self) -> &str {
        self.lead_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or("New")
    }

    /// Internal rows that never show up in the CRM
    pub fn is_system(&self) -> bool {
        self.lead_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("system"))
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// Fields accepted when creating a lead
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewLead {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<String>,
}

/// Partial update for a lead; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub lead_type: Option<String>,
}

impl LeadPatch {
    pub fn is_empty(&self) -> bool {
        self.industry.is_none() && self.notes.is_none() && self.lead_type.is_none()
    }

    /// Apply the patch to an in-memory lead
    pub fn apply(&self, lead: &mut Lead) {
        if let Some(industry) = &self.industry {
            lead.industry = Some(industry.clone());
        }
        if let Some(notes) = &self.notes {
            lead.notes = Some(notes.clone());
        }
        if let Some(lead_type) = &self.lead_type {
            lead.lead_type = Some(lead_type.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(lead_type: Option<&str>) -> Lead {
        Lead {
            id: LeadId::new("l1"),
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            industry: None,
            notes: None,
            lead_type: lead_type.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn test_status_defaults_to_new() {
        assert_eq!(lead(None).status(), "New");
        assert_eq!(lead(Some("")).status(), "New");
        assert_eq!(lead(Some("Meeting")).status(), "Meeting");
    }

    #[test]
    fn test_system_leads() {
        assert!(lead(Some("System")).is_system());
        assert!(!lead(Some("Contacted")).is_system());
        assert!(!lead(None).is_system());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = LeadPatch {
            notes: Some("call back".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "notes": "call back" }));

        let mut l = lead(None);
        patch.apply(&mut l);
        assert_eq!(l.notes.as_deref(), Some("call back"));
        assert!(l.industry.is_none());
    }
}
