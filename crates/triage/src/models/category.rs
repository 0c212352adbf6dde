//! Email category labels and their priority ranking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category assigned to an email by the upstream classifier
///
/// Labels arrive as free-form text (`high-priority`, `High Priority`, ...), so
/// parsing folds case and treats `-`/`_` as spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Lead,
    HighPriority,
    CustomerSupport,
    Marketing,
    Partnership,
    General,
    /// Any other label, normalized
    Other(String),
}

impl Category {
    /// Sentinel used when an email carries no category
    pub const UNCATEGORIZED: &'static str = "other";

    /// Parse a stored label; `None` or blank maps to the `other` sentinel
    pub fn from_label(label: Option<&str>) -> Self {
        let normalized = label.map(normalize).unwrap_or_default();
        match normalized.as_str() {
            "lead" => Category::Lead,
            "high priority" => Category::HighPriority,
            "customer support" => Category::CustomerSupport,
            "marketing" => Category::Marketing,
            "partnership" => Category::Partnership,
            "general" => Category::General,
            "" => Category::Other(Self::UNCATEGORIZED.to_string()),
            _ => Category::Other(normalized),
        }
    }

    /// Sort rank: leads first, then high priority, then everything else
    pub fn rank(&self) -> u8 {
        match self {
            Category::Lead => 0,
            Category::HighPriority => 1,
            _ => 2,
        }
    }

    /// Canonical lowercase key, as used for filtering
    pub fn key(&self) -> &str {
        match self {
            Category::Lead => "lead",
            Category::HighPriority => "high priority",
            Category::CustomerSupport => "customer support",
            Category::Marketing => "marketing",
            Category::Partnership => "partnership",
            Category::General => "general",
            Category::Other(label) => label,
        }
    }

    /// Short badge label shown next to an email
    pub fn display_label(&self) -> &'static str {
        match self {
            Category::Lead => "Lead",
            Category::HighPriority => "High Priority",
            Category::CustomerSupport => "Support",
            Category::Marketing => "Marketing",
            Category::Partnership => "Partnership",
            Category::General | Category::Other(_) => "General",
        }
    }

    /// Whether a free-form label names this category
    pub fn matches_label(&self, label: &str) -> bool {
        *self == Category::from_label(Some(label))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn normalize(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
