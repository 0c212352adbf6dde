//! Thread assembly: turns flat email rows into ordered conversations

use std::cmp::Reverse;
use std::collections::BTreeMap;

use log::debug;

use crate::models::{Email, EmailThread, ThreadId};

/// Group email rows into threads, ordered for display
///
/// Rows without a thread id are skipped. Within a thread the anchor is the
/// incoming original email, or the earliest row when there is none, so no
/// group is ever dropped. Threads are ordered by category rank (leads, then
/// high priority, then the rest) and then by anchor time, newest first.
///
/// This is a pure function of its input: assembling the same rows twice
/// yields the same threads in the same order.
pub fn assemble_threads(rows: impl IntoIterator<Item = Email>) -> Vec<EmailThread> {
    let mut groups: BTreeMap<ThreadId, Vec<Email>> = BTreeMap::new();
    let mut skipped = 0usize;

    for email in rows {
        match email.thread().cloned() {
            Some(thread_id) => groups.entry(thread_id).or_default().push(email),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} emails without a thread id", skipped);
    }

    let mut threads: Vec<EmailThread> = groups
        .into_iter()
        .map(|(thread_id, emails)| build_thread(thread_id, emails))
        .collect();

    threads.sort_by_key(|t| {
        (
            t.category.rank(),
            Reverse(t.original_email.effective_timestamp()),
        )
    });

    threads
}

/// Build one thread from a non-empty group of emails
fn build_thread(thread_id: ThreadId, mut emails: Vec<Email>) -> EmailThread {
    let anchor_idx = anchor_index(&emails);
    let original_email = emails.remove(anchor_idx);

    let mut replies = emails;
    replies.sort_by_key(Email::effective_timestamp);

    let has_unread_replies = original_email.is_draft() || replies.iter().any(Email::is_draft);
    let category = original_email.category();

    EmailThread {
        thread_id,
        original_email,
        replies,
        category,
        has_unread_replies,
    }
}

/// Index of the anchor email within a group
fn anchor_index(emails: &[Email]) -> usize {
    let originals = emails
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_incoming() && e.is_original());

    // min_by_key keeps the first of equal elements, so ties follow input order
    originals
        .min_by_key(|(_, e)| e.effective_timestamp())
        .or_else(|| {
            emails
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.effective_timestamp())
        })
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, DraftStatus, EmailId, Role};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    fn original(id: &str, thread: &str, category: &str, received: DateTime<Utc>) -> Email {
        Email::builder(EmailId::new(id))
            .thread(thread)
            .incoming()
            .role(Role::Original)
            .category(category)
            .received_at(received)
            .build()
    }

    fn reply(id: &str, thread: &str, status: DraftStatus, received: DateTime<Utc>) -> Email {
        Email::builder(EmailId::new(id))
            .thread(thread)
            .outgoing()
            .role(Role::Reply)
            .status(status)
            .received_at(received)
            .build()
    }

    fn ids(emails: &[Email]) -> Vec<&str> {
        emails.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_original_with_draft_reply() {
        let rows = vec![
            original("a", "T1", "lead", at(10, 0)),
            reply("b", "T1", DraftStatus::Draft, at(10, 5)),
        ];

        let threads = assemble_threads(rows);
        assert_eq!(threads.len(), 1);

        let thread = &threads[0];
        assert_eq!(thread.thread_id.as_str(), "T1");
        assert_eq!(thread.original_email.id.as_str(), "a");
        assert_eq!(ids(&thread.replies), vec!["b"]);
        assert!(thread.has_unread_replies);
        assert_eq!(thread.category, Category::Lead);
    }

    #[test]
    fn test_anchor_falls_back_to_earliest() {
        let rows = vec![
            reply("late", "T2", DraftStatus::Sent, at(12, 0)),
            reply("early", "T2", DraftStatus::Sent, at(9, 0)),
            reply("mid", "T2", DraftStatus::Sent, at(10, 0)),
        ];

        let threads = assemble_threads(rows);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].original_email.id.as_str(), "early");
        assert_eq!(ids(&threads[0].replies), vec!["mid", "late"]);
        assert!(!threads[0].has_unread_replies);
    }

    #[test]
    fn test_anchor_prefers_incoming_original_over_earlier_rows() {
        let rows = vec![
            reply("r0", "T1", DraftStatus::Sent, at(8, 0)),
            original("o", "T1", "lead", at(9, 0)),
        ];

        let threads = assemble_threads(rows);
        assert_eq!(threads[0].original_email.id.as_str(), "o");
        assert_eq!(ids(&threads[0].replies), vec!["r0"]);
    }

    #[test]
    fn test_outgoing_original_is_not_preferred() {
        let mut outgoing_original = reply("out", "T1", DraftStatus::Sent, at(11, 0));
        outgoing_original.role = Some(Role::Original);
        let rows = vec![outgoing_original, reply("r", "T1", DraftStatus::Sent, at(10, 0))];

        let threads = assemble_threads(rows);
        assert_eq!(threads[0].original_email.id.as_str(), "r");
    }

    #[test]
    fn test_rows_without_thread_are_excluded() {
        let mut orphan = original("orphan", "x", "lead", at(10, 0));
        orphan.thread_id = None;
        let blank = original("blank", "", "lead", at(10, 0));
        let rows = vec![orphan, blank, original("a", "T1", "lead", at(9, 0))];

        let threads = assemble_threads(rows);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].original_email.id.as_str(), "a");
    }

    #[test]
    fn test_replies_use_timestamp_fallback() {
        let created_only = Email::builder(EmailId::new("created"))
            .thread("T1")
            .outgoing()
            .role(Role::Reply)
            .created_at(at(9, 30))
            .build();
        let untimed = Email::builder(EmailId::new("untimed"))
            .thread("T1")
            .outgoing()
            .role(Role::Reply)
            .build();
        let rows = vec![
            original("a", "T1", "lead", at(9, 0)),
            reply("r", "T1", DraftStatus::Sent, at(10, 0)),
            created_only,
            untimed,
        ];

        let threads = assemble_threads(rows);
        assert_eq!(ids(&threads[0].replies), vec!["untimed", "created", "r"]);
    }

    #[test]
    fn test_lead_precedes_high_priority_regardless_of_time() {
        let rows = vec![
            original("hp", "T1", "high priority", at(9, 0)),
            original("ld", "T2", "lead", at(8, 0)),
        ];

        let threads = assemble_threads(rows);
        let order: Vec<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(order, vec!["T2", "T1"]);
    }

    #[test]
    fn test_same_category_sorted_newest_first() {
        let rows = vec![
            original("old", "T1", "customer support", at(8, 0)),
            original("new", "T2", "customer-support", at(11, 0)),
            original("other", "T3", "marketing", at(10, 0)),
            original("hp", "T4", "high-priority", at(7, 0)),
        ];

        let threads = assemble_threads(rows);
        let order: Vec<&str> = threads.iter().map(|t| t.thread_id.as_str()).collect();
        assert_eq!(order, vec!["T4", "T2", "T3", "T1"]);
    }

    #[test]
    fn test_missing_category_uses_sentinel() {
        let mut email = original("a", "T1", "lead", at(9, 0));
        email.category = None;

        let threads = assemble_threads(vec![email]);
        assert_eq!(threads[0].category.key(), "other");
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn test_draft_anchor_flags_thread() {
        let rows = vec![reply("d", "T1", DraftStatus::Draft, at(9, 0))];
        let threads = assemble_threads(rows);
        assert!(threads[0].has_unread_replies);
    }

    #[test]
    fn test_partition_property() {
        let rows = vec![
            original("a", "T1", "lead", at(9, 0)),
            reply("b", "T1", DraftStatus::Sent, at(9, 10)),
            reply("c", "T1", DraftStatus::Draft, at(9, 5)),
            original("d", "T2", "general", at(8, 0)),
            reply("e", "T2", DraftStatus::Sent, at(8, 30)),
        ];

        let threads = assemble_threads(rows.clone());
        assert_eq!(threads.len(), 2);

        let mut seen: Vec<&str> = threads
            .iter()
            .flat_map(|t| std::iter::once(&t.original_email).chain(t.replies.iter()))
            .map(|e| e.id.as_str())
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);

        for thread in &threads {
            assert!(!thread.replies.iter().any(|r| r.id == thread.original_email.id));
            assert!(thread
                .replies
                .windows(2)
                .all(|w| w[0].effective_timestamp() <= w[1].effective_timestamp()));
        }
    }

    #[test]
    fn test_idempotent() {
        let rows = vec![
            original("a", "T1", "marketing", at(9, 0)),
            original("b", "T2", "marketing", at(9, 0)),
            reply("c", "T2", DraftStatus::Draft, at(9, 0)),
            reply("d", "T2", DraftStatus::Sent, at(9, 0)),
        ];

        assert_eq!(assemble_threads(rows.clone()), assemble_threads(rows));
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_threads(Vec::new()).is_empty());
    }
}
