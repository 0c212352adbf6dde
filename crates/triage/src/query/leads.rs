//! CRM queries: lead lists, kanban board, per-lead email history

use crate::models::{EmailThread, Lead};

/// Pipeline columns of the kanban board, in display order
pub const KANBAN_COLUMNS: [&str; 5] = ["New", "Contacted", "Meeting", "Proposal", "Closed"];

/// One column of the kanban board
#[derive(Debug, Clone)]
pub struct KanbanColumn<'a> {
    pub title: &'static str,
    pub leads: Vec<&'a Lead>,
}

/// Leads shown in the CRM: everything except internal `system` rows
pub fn visible_leads(leads: Vec<Lead>) -> Vec<Lead> {
    leads.into_iter().filter(|l| !l.is_system()).collect()
}

/// Group leads into kanban columns by status
///
/// A status that matches no column lands in `New`.
pub fn kanban(leads: &[Lead]) -> Vec<KanbanColumn<'_>> {
    let mut columns: Vec<KanbanColumn<'_>> = KANBAN_COLUMNS
        .iter()
        .map(|&title| KanbanColumn {
            title,
            leads: Vec::new(),
        })
        .collect();

    for lead in leads {
        let idx = KANBAN_COLUMNS
            .iter()
            .position(|c| c.eq_ignore_ascii_case(lead.status().trim()))
            .unwrap_or(0);
        columns[idx].leads.push(lead);
    }

    columns
}

/// Threads started by the lead, matched on sender address
pub fn lead_threads<'a>(lead: &Lead, threads: &'a [EmailThread]) -> Vec<&'a EmailThread> {
    let Some(email) = lead.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
        return Vec::new();
    };

    threads
        .iter()
        .filter(|t| {
            t.original_email
                .sender_email
                .as_deref()
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(email))
        })
        .collect()
}
