//! Refresh of the thread list
//!
//! Threads are rebuilt from scratch on every fetch. The caller owns the
//! refresh cadence and subscribes to results through [`ThreadListener`].

mod feed;
mod timing;

pub use feed::{InboxFeed, RefreshStats, ThreadListener};
pub use timing::refresh_due;
