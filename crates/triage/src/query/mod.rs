//! Query API for the front end
//!
//! Turns stored rows into the shapes the desk displays: assembled threads,
//! mailbox views, counts and CRM boards.

mod counts;
mod leads;
mod threads;
mod views;

pub use counts::{MailboxCounts, mailbox_counts};
pub use leads::{KANBAN_COLUMNS, KanbanColumn, kanban, lead_threads, visible_leads};
pub use threads::assemble_threads;
pub use views::MailboxView;
