//! Draft reply actions
//!
//! Provides the handler that edits, validates and sends AI-drafted replies,
//! plus the local editing session the front end drives.

mod editor;
mod handler;

pub use editor::{DraftEditor, Review};
pub use handler::{ActionError, ActionHandler, SendReceipt};
