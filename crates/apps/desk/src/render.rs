//! Plain-text rendering of threads, counts and leads

use chrono::{DateTime, Local, Utc};
use std::fmt::Write;
use triage::{EmailThread, KanbanColumn, Lead, MailboxCounts, Notice, NoticeLevel};

/// Maximum characters of a body shown in list rows
const PREVIEW_CHARS: usize = 80;

/// Format a timestamp relative to now in local time
pub fn format_date(ts: DateTime<Utc>) -> String {
    format_date_at(ts.with_timezone(&Local), Local::now())
}

fn format_date_at(local: DateTime<Local>, now: DateTime<Local>) -> String {
    let day = local.date_naive();
    let today = now.date_naive();

    if day == today {
        // Today: show time
        local.format("%-I:%M %p").to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

/// First line of `text`, cut to `max` characters
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() <= max {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// One row of a thread list
pub fn thread_line(thread: &EmailThread) -> String {
    let original = &thread.original_email;
    let marker = if thread.has_unread_replies { "*" } else { " " };
    format!(
        "{} {:<14} {:<24} {:<40} {:>9}  ({})",
        marker,
        format!("[{}]", thread.category.display_label()),
        preview(original.sender_display(), 24),
        preview(original.subject.as_deref().unwrap_or("(no subject)"), 40),
        format_date(thread.last_activity_at()),
        thread.thread_id
    )
}

/// Full thread with every reply
pub fn thread_detail(thread: &EmailThread) -> String {
    let mut out = String::new();
    let original = &thread.original_email;
    let _ = writeln!(
        out,
        "{} [{}]  {} messages, {} sent, {} drafts",
        original.subject.as_deref().unwrap_or("(no subject)"),
        thread.category.display_label(),
        thread.message_count(),
        thread.sent_replies().count(),
        thread.draft_replies().count()
    );
    for email in std::iter::once(original).chain(thread.replies.iter()) {
        let state = if email.is_draft() {
            " (draft)"
        } else if email.is_sent() {
            " (sent)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "\n--- {} {} <{}>{}  {}",
            email.id,
            email.sender_display(),
            email.sender_email.as_deref().unwrap_or(""),
            state,
            format_date(email.effective_timestamp())
        );
        let _ = writeln!(out, "{}", email.body_text());
    }
    out
}

pub fn counts_table(counts: &MailboxCounts) -> String {
    [
        ("Inbox", counts.inbox),
        ("Leads", counts.leads),
        ("High Priority", counts.high_priority),
        ("Customer Support", counts.customer_support),
        ("General", counts.general),
        ("Marketing", counts.marketing),
        ("Partnership", counts.partnership),
        ("Drafts", counts.drafts),
        ("Sent", counts.sent),
    ]
    .iter()
    .map(|(label, n)| format!("{:<18}{:>6}", label, n))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn lead_line(lead: &Lead) -> String {
    format!(
        "{:<10} {:<24} {:<30} {:<12} {}",
        lead.id.as_str(),
        preview(lead.display_name(), 24),
        lead.email.as_deref().unwrap_or(""),
        lead.status(),
        lead.industry.as_deref().unwrap_or("")
    )
}

pub fn kanban_board(columns: &[KanbanColumn<'_>]) -> String {
    let mut out = String::new();
    for column in columns {
        let _ = writeln!(out, "{} ({})", column.title, column.leads.len());
        for lead in &column.leads {
            let _ = writeln!(out, "  - {} {}", lead.id.as_str(), lead.display_name());
        }
    }
    out
}

pub fn lead_detail(lead: &Lead, threads: &[&EmailThread]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} <{}>", lead.display_name(), lead.email.as_deref().unwrap_or(""));
    let _ = writeln!(out, "Status:   {}", lead.status());
    let _ = writeln!(out, "Industry: {}", lead.industry.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Notes:    {}", lead.notes.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "\nEmails ({})", threads.len());
    for thread in threads {
        let _ = writeln!(
            out,
            "  {}  {}  {}",
            format_date(thread.original_email.effective_timestamp()),
            thread.original_email.subject.as_deref().unwrap_or("(no subject)"),
            preview(thread.original_email.body_text(), PREVIEW_CHARS)
        );
    }
    out
}

pub fn notice_line(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!("{}: {}", tag, notice.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_format_date_today_shows_time() {
        let now = at(2024, 3, 5, 16, 0);
        assert_eq!(format_date_at(at(2024, 3, 5, 9, 7), now), "9:07 AM");
    }

    #[test]
    fn test_format_date_yesterday() {
        let now = at(2024, 3, 5, 16, 0);
        assert_eq!(format_date_at(now - Duration::days(1), now), "Yesterday");
    }

    #[test]
    fn test_format_date_older() {
        let now = at(2024, 3, 5, 16, 0);
        assert_eq!(format_date_at(at(2024, 2, 28, 12, 0), now), "Feb 28");
        assert_eq!(format_date_at(at(2024, 3, 1, 12, 0), now), "Mar 1");
    }

    #[test]
    fn test_preview_truncates_on_chars() {
        assert_eq!(preview("\n  Hello there\nsecond line", 80), "Hello there");
        assert_eq!(preview("ééééééééé", 6), "ééé...");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_counts_table_lists_every_mailbox() {
        let table = counts_table(&MailboxCounts {
            inbox: 12,
            partnership: 3,
            ..Default::default()
        });
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], format!("{:<18}{:>6}", "Inbox", 12));
        assert!(lines.contains(&format!("{:<18}{:>6}", "Partnership", 3).as_str()));
        assert!(lines.iter().any(|l| l.starts_with("Marketing")));
    }

    #[test]
    fn test_notice_line() {
        assert_eq!(notice_line(&Notice::error("Failed to save draft")), "error: Failed to save draft");
    }
}
